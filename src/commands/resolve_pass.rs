use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use crate::{
    domain::{select_current, Identity, PassLookup},
    ports::{database::DatabasePort, email::EmailPort},
};
use chrono::Utc;
use tower::Service;

use super::{with_timeout, DomainLogic, Error};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvePassRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl<D, E> Service<ResolvePassRequest> for DomainLogic<D, E>
where
    D: DatabasePort + ?Sized + 'static,
    E: EmailPort + ?Sized + 'static,
{
    type Response = PassLookup;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ResolvePassRequest) -> Self::Future {
        let database = self.database.clone();
        let limit = self.settings.port_timeout;
        Box::pin(async move {
            // No identity at all is "no pass", not an error
            let Some(identity) = Identity::new(req.email.as_deref(), req.phone.as_deref()) else {
                return Ok(PassLookup::NotFound);
            };

            lookup(database.as_ref(), &identity, limit).await
        })
    }
}

/// Current pass for an identity, with its status as of now
///
/// Status is computed on every call and never stored.
pub(super) async fn lookup<D>(
    database: &D,
    identity: &Identity,
    limit: Duration,
) -> Result<PassLookup, Error>
where
    D: DatabasePort + ?Sized,
{
    let passes = with_timeout(limit, database.find_by_identity(identity)).await?;

    let lookup = match select_current(passes) {
        Some(pass) => {
            let status = pass.status_at(Utc::now());
            PassLookup::Found { pass, status }
        }
        None => PassLookup::NotFound,
    };

    Ok(lookup)
}
