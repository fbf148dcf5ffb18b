pub mod subscriptions;

use axum::{Router, middleware};

use crate::adapters::http::{app_state::AppState, middleware::require_active_subscription};

pub fn router() -> Router<AppState> {
    Router::new().nest("/subscriptions", subscriptions::router())
}

/// Wraps paid-feature routes so they only run for callers with an active
/// subscription.
pub fn gated(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        app_state,
        require_active_subscription,
    ))
}
