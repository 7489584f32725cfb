use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::debug;

use crate::{
    commands::{
        purchase_pass::PurchasePassRequest, renew_pass::RenewPassRequest,
        resolve_pass::ResolvePassRequest,
    },
    domain::{notification::NotificationRequest, Pass, PassId, PassLookup, PassStatus},
};

use super::{dispatch, send_boxed, ApiError, AppState, PassService};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/passes/current", get(current_pass))
        .route("/api/passes", post(purchase_pass))
        .route("/api/passes/{id}/renew", post(renew_pass))
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentPassQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A pass together with its status at the time of the request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassView {
    #[serde(flatten)]
    pub pass: Pass,
    pub status: PassStatus,
}

impl From<Pass> for PassView {
    fn from(pass: Pass) -> Self {
        let status = pass.status();
        Self { pass, status }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPassResponse {
    pub status: PassStatus,
    pub pass: Option<Pass>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePassBody {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Greeting used in the purchase email
    pub name: Option<String>,
    pub amount: Decimal,
    pub duration_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewPassBody {
    pub duration_days: Option<u32>,
    pub name: Option<String>,
    /// Overrides the email stored on the pass
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassLifecycleResponse {
    pub success: bool,
    pub message: String,
    pub pass: PassView,
    pub email_sent: bool,
}

async fn current_pass(
    State(state): State<AppState>,
    query: Result<Query<CurrentPassQuery>, QueryRejection>,
) -> Result<Json<CurrentPassResponse>, ApiError> {
    let Query(query) = query?;
    let lookup = send_boxed(state.logic.clone().oneshot(ResolvePassRequest {
        email: query.email,
        phone: query.phone,
    }))
    .await?;

    let status = lookup.status();
    let pass = match lookup {
        PassLookup::Found { pass, .. } => Some(pass),
        PassLookup::NotFound => None,
    };
    Ok(Json(CurrentPassResponse { status, pass }))
}

async fn purchase_pass(
    State(state): State<AppState>,
    body: Result<Json<PurchasePassBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PassLifecycleResponse>), ApiError> {
    let Json(body) = body?;
    let pass = send_boxed(state.logic.clone().oneshot(PurchasePassRequest {
        email: body.email,
        phone: body.phone,
        amount: body.amount,
        duration_days: body.duration_days.unwrap_or(state.default_duration_days),
    }))
    .await?;

    let notification = lifecycle_email(
        &pass,
        None,
        body.name.as_deref(),
        NotificationRequest::pass_purchase,
    );
    let email_sent = notify(state.logic, notification).await?;

    Ok((
        StatusCode::CREATED,
        Json(PassLifecycleResponse {
            success: true,
            message: "Pass purchased".to_string(),
            pass: pass.into(),
            email_sent,
        }),
    ))
}

async fn renew_pass(
    State(state): State<AppState>,
    id: Result<Path<PassId>, PathRejection>,
    body: Result<Json<RenewPassBody>, JsonRejection>,
) -> Result<Json<PassLifecycleResponse>, ApiError> {
    // An id that cannot be parsed cannot name a stored pass either
    let Path(pass_id) = id.map_err(|_| ApiError::NotFound("Pass not found".to_string()))?;
    let Json(body) = body?;

    let pass = send_boxed(state.logic.clone().oneshot(RenewPassRequest {
        pass_id,
        duration_days: body.duration_days.unwrap_or(state.default_duration_days),
    }))
    .await?;

    let notification = lifecycle_email(
        &pass,
        body.email.as_deref(),
        body.name.as_deref(),
        NotificationRequest::pass_renewal,
    );
    let email_sent = notify(state.logic, notification).await?;

    Ok(Json(PassLifecycleResponse {
        success: true,
        message: "Pass renewed".to_string(),
        pass: pass.into(),
        email_sent,
    }))
}

/// Lifecycle email for `pass`, if there is an address and a name to use
fn lifecycle_email(
    pass: &Pass,
    email: Option<&str>,
    name: Option<&str>,
    build: fn(&Pass, &str, &str) -> NotificationRequest,
) -> Option<NotificationRequest> {
    let email = email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .or(pass.owner_email.as_deref());
    let name = name.map(str::trim).filter(|name| !name.is_empty());

    match (email, name) {
        (Some(email), Some(name)) => Some(build(pass, email, name)),
        _ => {
            debug!(pass_id = %pass.id, "no recipient for lifecycle email, skipping");
            None
        }
    }
}

async fn notify(
    logic: PassService,
    notification: Option<NotificationRequest>,
) -> Result<bool, ApiError> {
    match notification {
        Some(notification) => dispatch(logic, notification).await,
        None => Ok(false),
    }
}
