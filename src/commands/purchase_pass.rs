use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{Identity, Pass, PassLookup, PassStatus},
    ports::{database::DatabasePort, email::EmailPort},
};
use chrono::Utc;
use rust_decimal::Decimal;
use tower::Service;
use tracing::info;

use super::{resolve_pass::lookup, with_timeout, DomainLogic, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchasePassRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub amount: Decimal,
    pub duration_days: u32,
}

impl<D, E> Service<PurchasePassRequest> for DomainLogic<D, E>
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

    fn call(&mut self, req: PurchasePassRequest) -> Self::Future {
        let database = self.database.clone();
        let limit = self.settings.port_timeout;
        let allow_overlapping = self.settings.allow_overlapping_passes;
        Box::pin(async move {
            let owner = Identity::new(req.email.as_deref(), req.phone.as_deref()).ok_or(
                Error::InvalidRequest("an email or phone number is required".into()),
            )?;

            if !allow_overlapping {
                if let PassLookup::Found {
                    pass,
                    status: PassStatus::Active,
                } = lookup(database.as_ref(), &owner, limit).await?
                {
                    return Err(Error::DuplicateOwner(pass.id));
                }
            }

            // One new record per purchase, the resolver picks the current one
            let pass = Pass::purchase(&owner, req.amount, Utc::now(), req.duration_days)?;
            let pass = with_timeout(limit, database.save(pass)).await?;
            info!(pass_id = %pass.id, expiry_date = %pass.expiry_date, "pass purchased");

            Ok(pass)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::{resolve_pass::ResolvePassRequest, Settings},
        domain::{benefit::BenefitRules, PassError},
        ports::email::MockEmailPort,
    };
    use chrono::Duration;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    fn logic(allow_overlapping_passes: bool) -> DomainLogic<MemoryDatabase, MockEmailPort> {
        DomainLogic::new(
            Arc::new(MemoryDatabase::default()),
            Arc::new(MockEmailPort::new()),
            Arc::new(BenefitRules::empty()),
            Settings {
                allow_overlapping_passes,
                ..Settings::default()
            },
        )
    }

    #[fixture]
    fn request() -> PurchasePassRequest {
        PurchasePassRequest {
            email: Some("jane@example.com".to_string()),
            phone: None,
            amount: Decimal::new(499, 0),
            duration_days: 30,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_purchase(request: PurchasePassRequest) -> Result<(), BoxError> {
        let domain = logic(true);
        let before = Utc::now();

        let pass = domain.clone().oneshot(request).await?;

        // THEN the pass is stored and active for 30 days
        assert_that!(pass.expiry_date - pass.purchase_date).is_equal_to(Duration::days(30));
        assert_that!(pass.purchase_date >= before).is_true();
        assert_that!(domain.database.find_by_id(pass.id).await?).is_some();
        let lookup = domain
            .clone()
            .oneshot(ResolvePassRequest {
                email: Some("jane@example.com".to_string()),
                phone: None,
            })
            .await?;
        assert_that!(lookup.status()).is_equal_to(PassStatus::Active);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_overlapping_allowed(request: PurchasePassRequest) -> Result<(), BoxError> {
        let domain = logic(true);

        let first = domain.clone().oneshot(request.clone()).await?;
        let second = domain.clone().oneshot(request).await?;

        assert_that!(second.id).is_not_equal_to(first.id);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_overlapping_rejected(request: PurchasePassRequest) -> Result<(), BoxError> {
        let domain = logic(false);
        let first = domain.clone().oneshot(request.clone()).await?;

        let res = domain.clone().oneshot(request).await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::DuplicateOwner(id) if *id == first.id));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_identity_required(request: PurchasePassRequest) -> Result<(), BoxError> {
        let res = logic(true)
            .oneshot(PurchasePassRequest {
                email: None,
                phone: Some("  ".to_string()),
                ..request
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidRequest(_)));

        Ok(())
    }

    #[rstest]
    #[case(0, PassError::InvalidDuration(0))]
    #[case(u32::MAX, PassError::DurationTooLong(u32::MAX))]
    #[tokio::test]
    async fn test_invalid_duration(
        request: PurchasePassRequest,
        #[case] duration_days: u32,
        #[case] expected: PassError,
    ) -> Result<(), BoxError> {
        let domain = logic(true);

        let res = domain
            .clone()
            .oneshot(PurchasePassRequest {
                duration_days,
                ..request
            })
            .await;

        // Nothing is stored for a rejected purchase
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidPass(found) if *found == expected));
        let stored = domain
            .database
            .find_by_identity(&Identity::new(Some("jane@example.com"), None).unwrap())
            .await?;
        assert_that!(stored).is_empty();

        Ok(())
    }
}
