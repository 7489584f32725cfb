use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{
        booking::{Booking, BookingCandidate},
        Identity, PassLookup, PassStatus,
    },
    ports::{database::DatabasePort, email::EmailPort},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tower::Service;
use tracing::debug;

use super::{resolve_pass::lookup, DomainLogic, Error};

/// Price a booking at checkout for whoever is making it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteBookingRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub venue_name: String,
    pub booking_date: String,
    pub booking_type: Option<String>,
    pub original_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBookingResponse {
    pub pass_status: PassStatus,
    pub booking: Booking,
}

impl<D, E> Service<QuoteBookingRequest> for DomainLogic<D, E>
where
    D: DatabasePort + ?Sized + 'static,
    E: EmailPort + ?Sized + 'static,
{
    type Response = QuoteBookingResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: QuoteBookingRequest) -> Self::Future {
        let database = self.database.clone();
        let benefits = self.benefits.clone();
        let limit = self.settings.port_timeout;
        Box::pin(async move {
            let candidate = BookingCandidate::new(req.booking_type.as_deref(), req.original_amount)
                .ok_or(Error::InvalidRequest("originalAmount cannot be negative".into()))?;

            // Anonymous checkouts simply get no benefit
            let pass_status = match Identity::new(req.email.as_deref(), req.phone.as_deref()) {
                Some(identity) => lookup(database.as_ref(), &identity, limit).await?.status(),
                None => PassLookup::NotFound.status(),
            };

            let outcome = benefits.apply(pass_status, &candidate);
            debug!(
                ?pass_status,
                booking_type = candidate.booking_type(),
                original_amount = %candidate.original_amount(),
                total_amount = %outcome.total_amount,
                "booking quoted"
            );

            Ok(QuoteBookingResponse {
                pass_status,
                booking: Booking::new(req.venue_name, req.booking_date, candidate, outcome),
            })
        })
    }
}
