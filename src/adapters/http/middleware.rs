use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Identity of the caller, as asserted by a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolves the caller from `Authorization: Bearer` first, then the
/// `access_token` cookie.
pub fn current_user(
    headers: &HeaderMap,
    jar: &CookieJar,
    app_state: &AppState,
) -> AppResult<AuthUser> {
    let token = bearer_token(headers)
        .or_else(|| jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = jwt::verify(&token, &app_state.config.jwt_secret)?;
    Ok(AuthUser {
        user_id: claims.user_id()?,
        email: claims.email,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Access gate for paid features: 401 without identity, 403 when the caller's
/// subscription is not active. The resolved `AuthUser` is passed on as a
/// request extension.
pub async fn require_active_subscription(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = current_user(request.headers(), &jar, &app_state)?;

    if !app_state
        .subscription_use_cases
        .is_subscription_active(user.user_id)
        .await?
    {
        tracing::debug!(user_id = %user.user_id, "Blocked request without active subscription");
        return Err(AppError::SubscriptionRequired);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
