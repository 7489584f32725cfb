//! JSON over HTTP surface of the pass service

use std::{any::Any, future::Future, pin::Pin};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    commands::{send_notification::SendNotificationRequest, DomainLogic},
    domain::notification::NotificationRequest,
    ports::{database::DatabasePort, email::EmailPort},
};

pub mod bookings;
pub mod error;
pub mod notifications;
pub mod passes;

pub use error::ApiError;

pub type PassService = DomainLogic<dyn DatabasePort, dyn EmailPort>;

#[derive(Clone)]
pub struct AppState {
    pub logic: PassService,
    /// Used when a purchase or renewal does not say how long it lasts
    pub default_duration_days: u32,
}

/// Body shared by every endpoint that only reports an outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .merge(notifications::routes())
        .merge(passes::routes())
        .merge(bookings::routes());

    with_middleware(routes).with_state(state)
}

/// Request tracing, and a JSON 500 for handlers that panic
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

async fn health() -> Json<ApiResponse> {
    Json(ApiResponse::success("ok"))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!("handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::failure("Internal server error")),
    )
        .into_response()
}

/// Erase a command future to a boxed `Send` future
///
/// Works around rustc failing to prove `Send` for `oneshot` futures on
/// `DomainLogic<dyn DatabasePort, dyn EmailPort>` when they are held inside an async fn.
fn send_boxed<F>(future: F) -> Pin<Box<dyn Future<Output = F::Output> + Send>>
where
    F: Future + Send + 'static,
{
    Box::pin(future)
}

/// Hand a notification to the dispatcher, reporting whether the transport accepted it
async fn dispatch(logic: PassService, notification: NotificationRequest) -> Result<bool, ApiError> {
    let sent = send_boxed(logic.oneshot(SendNotificationRequest::from(notification))).await?;
    Ok(sent)
}
