use std::{error::Error, net::SocketAddr, sync::Arc};

use rust_pass_service::{
    adapters::{database::memory::MemoryDatabase, email::console::ConsoleEmail},
    app_config::Config,
    commands::DomainLogic,
    http::{app, AppState},
    ports::{database::DatabasePort, email::EmailPort},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_pass_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let benefits = config.benefit_rules()?;
    tracing::info!(?benefits, "loaded benefit rules");

    let database: Arc<dyn DatabasePort> = Arc::new(MemoryDatabase::default());
    let email: Arc<dyn EmailPort> = Arc::new(ConsoleEmail::new(&config.notifications.from_address));
    let state = AppState {
        logic: DomainLogic::new(database, email, Arc::new(benefits), config.settings()),
        default_duration_days: config.passes.default_duration_days,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
