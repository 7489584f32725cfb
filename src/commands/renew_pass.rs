use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{Pass, PassId},
    ports::{
        database::{DatabasePort, Error as DatabaseError},
        email::EmailPort,
    },
};
use chrono::Utc;
use tower::Service;
use tracing::{info, warn};

use super::{with_timeout, DomainLogic, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenewPassRequest {
    pub pass_id: PassId,
    pub duration_days: u32,
}

impl<D, E> Service<RenewPassRequest> for DomainLogic<D, E>
where
    D: DatabasePort + ?Sized + 'static,
    E: EmailPort + ?Sized + 'static,
{
    type Response = Pass;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RenewPassRequest) -> Self::Future {
        let database = self.database.clone();
        let limit = self.settings.port_timeout;
        let max_attempts = self.settings.max_renew_attempts.max(1);
        Box::pin(async move {
            // Read-extend-write, starting over from a fresh read whenever another writer got
            // there first
            for attempt in 1..=max_attempts {
                let mut pass = with_timeout(limit, database.find_by_id(req.pass_id))
                    .await?
                    .ok_or(Error::NotFound(req.pass_id))?;
                pass.renew(Utc::now(), req.duration_days)?;

                match with_timeout(limit, database.save(pass)).await {
                    Ok(pass) => {
                        info!(pass_id = %pass.id, expiry_date = %pass.expiry_date, attempt, "pass renewed");
                        return Ok(pass);
                    }
                    Err(Error::Database(DatabaseError::VersionConflict { .. })) => {
                        warn!(pass_id = %req.pass_id, attempt, "concurrent renewal, retrying");
                    }
                    Err(err) => return Err(err),
                }
            }

            Err(Error::ConcurrencyConflict {
                pass_id: req.pass_id,
                attempts: max_attempts,
            })
        })
    }
}
