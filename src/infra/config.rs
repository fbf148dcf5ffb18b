use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::use_cases::subscription::BillingSettings;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Optional at boot; processor calls fail with a configuration error until set.
    pub paystack_secret_key: Option<SecretString>,
    /// Not used server-side; exposed so deployments can hand it to clients.
    pub paystack_public_key: Option<String>,
    pub paystack_plan_code: Option<String>,
    /// Defaults to the secret key, which is what Paystack signs webhooks with.
    pub paystack_webhook_secret: Option<SecretString>,
    pub paystack_base_url: Url,
    pub subscription_amount_kobo: i64,
    /// See `BillingSettings::cancel_fail_open`.
    pub cancel_fail_open: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3001"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3000".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");

        let paystack_secret_key = optional_env("PAYSTACK_SECRET_KEY");
        let paystack_public_key = optional_env("PAYSTACK_PUBLIC_KEY");
        let paystack_plan_code = optional_env("PAYSTACK_SUBSCRIPTION_PLAN_CODE");
        let paystack_webhook_secret =
            optional_env("PAYSTACK_WEBHOOK_SECRET").or_else(|| paystack_secret_key.clone());
        let paystack_base_url: Url = get_env_default(
            "PAYSTACK_BASE_URL",
            "https://api.paystack.co".parse().unwrap(),
        );
        let subscription_amount_kobo: i64 = get_env_default("SUBSCRIPTION_AMOUNT_KOBO", 500_000);
        let cancel_fail_open: bool = get_env_default("CANCEL_FAIL_OPEN", false);

        if paystack_secret_key.is_none() {
            tracing::warn!("PAYSTACK_SECRET_KEY is not set; payment operations will fail");
        }

        Self {
            jwt_secret,
            cors_origin,
            bind_addr,
            database_url,
            paystack_secret_key: paystack_secret_key.map(|s| SecretString::new(s.into())),
            paystack_public_key,
            paystack_plan_code,
            paystack_webhook_secret: paystack_webhook_secret.map(|s| SecretString::new(s.into())),
            paystack_base_url,
            subscription_amount_kobo,
            cancel_fail_open,
        }
    }

    pub fn billing_settings(&self) -> BillingSettings {
        BillingSettings {
            plan_code: self.paystack_plan_code.clone(),
            amount_minor: self.subscription_amount_kobo,
            webhook_secret: self.paystack_webhook_secret.clone(),
            cancel_fail_open: self.cancel_fail_open,
        }
    }
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
