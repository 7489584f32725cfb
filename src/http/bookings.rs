use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower::ServiceExt;

use crate::commands::quote_booking::{QuoteBookingRequest, QuoteBookingResponse};

use super::{send_boxed, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings/quote", post(quote_booking))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBookingBody {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub venue_name: String,
    #[serde(default)]
    pub booking_date: String,
    pub booking_type: Option<String>,
    pub original_amount: Decimal,
}

impl From<QuoteBookingBody> for QuoteBookingRequest {
    fn from(body: QuoteBookingBody) -> Self {
        Self {
            email: body.email,
            phone: body.phone,
            venue_name: body.venue_name,
            booking_date: body.booking_date,
            booking_type: body.booking_type,
            original_amount: body.original_amount,
        }
    }
}

async fn quote_booking(
    State(state): State<AppState>,
    body: Result<Json<QuoteBookingBody>, JsonRejection>,
) -> Result<Json<QuoteBookingResponse>, ApiError> {
    let Json(body) = body?;
    let quote = send_boxed(state.logic.clone().oneshot(QuoteBookingRequest::from(body))).await?;
    Ok(Json(quote))
}
