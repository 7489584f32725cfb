use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};

use crate::domain::notification::{
    BookingConfirmationPayload, NotificationRequest, PassPurchasePayload, PassRenewalPayload,
};

use super::{dispatch, ApiError, ApiResponse, AppState, PassService};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications/booking-confirmation",
            post(booking_confirmation),
        )
        .route("/api/notifications/pass-purchase", post(pass_purchase))
        .route("/api/notifications/pass-renewal", post(pass_renewal))
}

async fn booking_confirmation(
    State(state): State<AppState>,
    payload: Result<Json<BookingConfirmationPayload>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(payload) = payload?;
    send(state.logic, payload.validate()?, "Confirmation email sent").await
}

async fn pass_purchase(
    State(state): State<AppState>,
    payload: Result<Json<PassPurchasePayload>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(payload) = payload?;
    send(state.logic, payload.validate()?, "Email sent successfully").await
}

async fn pass_renewal(
    State(state): State<AppState>,
    payload: Result<Json<PassRenewalPayload>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(payload) = payload?;
    send(
        state.logic,
        payload.validate()?,
        "Renewal email sent successfully",
    )
    .await
}

async fn send(
    logic: PassService,
    notification: NotificationRequest,
    success_message: &'static str,
) -> Result<Json<ApiResponse>, ApiError> {
    if dispatch(logic, notification).await? {
        Ok(Json(ApiResponse::success(success_message)))
    } else {
        Err(ApiError::DeliveryFailed)
    }
}
