use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::use_cases::subscription::SubscriptionUseCases;

/// Once a day; the first tick fires immediately at startup.
const SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Demotes subscriptions whose end date has passed. A failed pass is logged
/// and retried on the next tick.
pub async fn run_expiry_sweep_loop(subscription_use_cases: Arc<SubscriptionUseCases>) {
    let mut ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Subscription expiry sweeper started (every {}h)",
        SWEEP_INTERVAL_SECS / 3600
    );

    loop {
        ticker.tick().await;

        if let Err(e) = subscription_use_cases.expire_lapsed_subscriptions().await {
            error!(error = ?e, "Subscription expiry sweep failed");
        }
    }
}
