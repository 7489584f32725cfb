//! Keeps the current pass in sync with the signed-in identity
//!
//! The session collaborator publishes identity changes (sign in, sign out, profile edits) on a
//! [`watch`] channel. The watcher re-runs the resolver for every change and publishes the result,
//! so UI gating and pricing read the latest [`PassLookup`] without subscribing to anything
//! themselves.

use tokio::{sync::watch, task::JoinHandle};
use tower::{Service, ServiceExt};
use tracing::{debug, warn};

use crate::{
    commands::{resolve_pass::ResolvePassRequest, Error},
    domain::PassLookup,
};

/// Spawn the watcher task
///
/// `identities` carries `None` while nobody is signed in. The task ends once the identity sender
/// or every lookup receiver is dropped.
pub fn watch_identity<S>(
    resolver: S,
    mut identities: watch::Receiver<Option<ResolvePassRequest>>,
) -> (watch::Receiver<PassLookup>, JoinHandle<()>)
where
    S: Service<ResolvePassRequest, Response = PassLookup, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    let (tx, rx) = watch::channel(PassLookup::NotFound);

    let handle = tokio::spawn(async move {
        loop {
            let identity = identities.borrow_and_update().clone();
            let lookup = match identity {
                Some(req) => match resolver.clone().oneshot(req).await {
                    Ok(lookup) => lookup,
                    Err(err) => {
                        // Without an answer, grant nothing
                        warn!("failed to resolve pass after identity change: {err}");
                        PassLookup::NotFound
                    }
                },
                None => PassLookup::NotFound,
            };
            debug!(status = ?lookup.status(), "pass lookup refreshed");

            if tx.send(lookup).is_err() || identities.changed().await.is_err() {
                break;
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::{DomainLogic, Settings},
        domain::{benefit::BenefitRules, Identity, Pass, PassStatus},
        ports::{database::DatabasePort, email::MockEmailPort},
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use speculoos::prelude::*;
    use std::sync::Arc;

    async fn next_status(rx: &mut watch::Receiver<PassLookup>) -> PassStatus {
        rx.changed().await.unwrap();
        rx.borrow_and_update().status()
    }

    #[tokio::test]
    async fn test_follows_identity() {
        // GIVEN a stored active pass
        let database = MemoryDatabase::default();
        let owner = Identity::new(Some("jane@example.com"), None).unwrap();
        let pass = Pass::purchase(&owner, Decimal::new(499, 0), Utc::now(), 30).unwrap();
        database.save(pass).await.unwrap();
        let domain = DomainLogic::new(
            Arc::new(database),
            Arc::new(MockEmailPort::new()),
            Arc::new(BenefitRules::empty()),
            Settings::default(),
        );

        // WHEN nobody is signed in, then the owner signs in, then signs out
        let (identity_tx, identity_rx) = watch::channel(None);
        let (mut rx, handle) = watch_identity(domain, identity_rx);

        // THEN the lookup follows along
        assert_that!(next_status(&mut rx).await).is_equal_to(PassStatus::NotFound);

        identity_tx
            .send(Some(ResolvePassRequest {
                email: Some("jane@example.com".to_string()),
                phone: None,
            }))
            .unwrap();
        assert_that!(next_status(&mut rx).await).is_equal_to(PassStatus::Active);

        identity_tx.send(None).unwrap();
        assert_that!(next_status(&mut rx).await).is_equal_to(PassStatus::NotFound);

        // Dropping the sender stops the task
        drop(identity_tx);
        handle.await.unwrap();
    }
}
