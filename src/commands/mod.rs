use std::{borrow::Cow, future::Future, sync::Arc, time::Duration};

use crate::domain::{benefit::BenefitRules, PassError, PassId};

pub mod purchase_pass;
pub mod quote_booking;
pub mod renew_pass;
pub mod resolve_pass;
pub mod send_notification;

pub struct DomainLogic<D: ?Sized, E: ?Sized> {
    database: Arc<D>,
    email: Arc<E>,
    benefits: Arc<BenefitRules>,
    settings: Settings,
}

impl<D: ?Sized, E: ?Sized> DomainLogic<D, E> {
    pub fn new(
        database: Arc<D>,
        email: Arc<E>,
        benefits: Arc<BenefitRules>,
        settings: Settings,
    ) -> Self {
        Self {
            database,
            email,
            benefits,
            settings,
        }
    }
}

// Manual impl: the ports themselves don't need to be `Clone`
impl<D: ?Sized, E: ?Sized> Clone for DomainLogic<D, E> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            email: self.email.clone(),
            benefits: self.benefits.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// Tunables for the domain commands
#[derive(Clone, Debug)]
pub struct Settings {
    /// Upper bound for a single call to a port
    pub port_timeout: Duration,
    /// Whether an owner may buy a pass while already holding an active one
    pub allow_overlapping_passes: bool,
    /// Read-extend-write attempts for a renewal before giving up
    pub max_renew_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port_timeout: Duration::from_secs(5),
            allow_overlapping_passes: true,
            max_renew_attempts: 3,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),

    #[error("pass {0} does not exist")]
    NotFound(PassId),
    #[error("owner already holds active pass {0}")]
    DuplicateOwner(PassId),
    #[error("pass {pass_id} kept changing, gave up after {attempts} attempt(s)")]
    ConcurrencyConflict { pass_id: PassId, attempts: u32 },
    #[error("port call timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid pass: {0}")]
    InvalidPass(#[from] PassError),
    #[error("invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),
}

/// Await a database call, treating an elapsed `limit` as a failure
async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, crate::ports::database::Error>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::Timeout(limit))?
        .map_err(Error::from)
}
