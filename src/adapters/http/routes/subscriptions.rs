use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    adapters::http::{app_state::AppState, middleware::current_user},
    app_error::AppResult,
    infra::webhook_signature::SIGNATURE_HEADER,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/initialize", post(initialize))
        .route("/verify", get(verify))
        .route("/status", get(status))
        .route("/cancel", delete(cancel))
}

#[derive(Serialize)]
struct AckResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
struct VerifyQuery {
    #[serde(default)]
    reference: String,
}

/// POST /api/subscriptions/webhook
///
/// The body is taken as raw bytes: the signature covers exactly what was
/// sent, so it must be checked before any JSON parsing.
#[instrument(skip_all)]
async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let outcome = app_state
        .subscription_use_cases
        .handle_webhook(&body, signature)
        .await?;

    tracing::debug!(?outcome, "Webhook acknowledged");
    Ok(Json(AckResponse { status: "success" }))
}

/// POST /api/subscriptions/initialize
async fn initialize(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &jar, &app_state)?;

    let session = app_state
        .subscription_use_cases
        .initialize_payment(user.user_id, &user.email)
        .await?;

    Ok(Json(session))
}

/// GET /api/subscriptions/verify?reference=
async fn verify(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<VerifyQuery>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &jar, &app_state)?;

    let result = app_state
        .subscription_use_cases
        .verify_payment(user.user_id, &query.reference)
        .await?;

    Ok(Json(result))
}

/// GET /api/subscriptions/status
async fn status(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &jar, &app_state)?;
    let view = app_state.subscription_use_cases.status(user.user_id).await?;
    Ok(Json(view))
}

/// DELETE /api/subscriptions/cancel
async fn cancel(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &jar, &app_state)?;
    app_state.subscription_use_cases.cancel(user.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Subscription cancelled successfully",
    }))
}
