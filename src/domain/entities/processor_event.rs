//! Paystack webhook payloads and their mapping onto the internal event taxonomy.
//!
//! Every wire field is optional. A field carrying the wrong JSON type is read
//! as absent rather than failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use uuid::Uuid;

pub const CHARGE_SUCCESS: &str = "charge.success";
pub const SUBSCRIPTION_CREATE: &str = "subscription.create";
pub const SUBSCRIPTION_DISABLE: &str = "subscription.disable";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

// ============================================================================
// Wire Types
// ============================================================================

/// The `{event, data}` envelope Paystack posts to the webhook endpoint.
#[derive(Debug, Deserialize)]
pub struct PaystackWebhook {
    pub event: String,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<PaystackEventData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaystackEventData {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<WireMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub customer: Option<WireCustomer>,
    #[serde(default, deserialize_with = "lenient")]
    pub authorization: Option<WireAuthorization>,
    #[serde(default, deserialize_with = "lenient")]
    pub subscription_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub next_payment_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireMetadata {
    #[serde(rename = "userId", default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireCustomer {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<WireId>,
    #[serde(default, deserialize_with = "lenient")]
    pub customer_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireAuthorization {
    #[serde(default, deserialize_with = "lenient")]
    pub authorization_code: Option<String>,
}

/// Paystack sends numeric customer ids; older payloads and tests use strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{}", n),
            WireId::Text(s) => write!(f, "{}", s),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl PaystackEventData {
    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata
            .as_ref()
            .and_then(|m| non_empty(m.user_id.as_deref()))
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn customer_code(&self) -> Option<String> {
        self.customer
            .as_ref()
            .and_then(|c| non_empty(c.customer_code.as_deref()))
            .map(str::to_owned)
    }

    /// Prefers the customer code so that later lookups keyed by customer code
    /// (subscription.create, invoice.payment_failed) can correlate.
    pub fn customer_id(&self) -> Option<String> {
        self.customer_code().or_else(|| {
            self.customer
                .as_ref()
                .and_then(|c| c.id.as_ref())
                .map(|id| id.to_string())
                .filter(|s| !s.trim().is_empty())
        })
    }

    pub fn authorization_code(&self) -> Option<String> {
        self.authorization
            .as_ref()
            .and_then(|a| non_empty(a.authorization_code.as_deref()))
            .map(str::to_owned)
    }

    pub fn subscription_code(&self) -> Option<String> {
        non_empty(self.subscription_code.as_deref()).map(str::to_owned)
    }

    pub fn next_payment_date(&self) -> Option<DateTime<Utc>> {
        non_empty(self.next_payment_date.as_deref())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Normalized Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    ChargeSucceeded {
        user_id: Option<Uuid>,
        customer_id: Option<String>,
        authorization_code: Option<String>,
    },
    SubscriptionCreated {
        customer_code: String,
        next_payment_date: Option<DateTime<Utc>>,
        authorization_code: Option<String>,
        subscription_code: Option<String>,
    },
    SubscriptionDisabled {
        subscription_code: String,
    },
    PaymentFailed {
        customer_code: String,
    },
}

impl NormalizedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedEvent::ChargeSucceeded { .. } => CHARGE_SUCCESS,
            NormalizedEvent::SubscriptionCreated { .. } => SUBSCRIPTION_CREATE,
            NormalizedEvent::SubscriptionDisabled { .. } => SUBSCRIPTION_DISABLE,
            NormalizedEvent::PaymentFailed { .. } => INVOICE_PAYMENT_FAILED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Event(NormalizedEvent),
    /// Known event type, but the payload lacks the field needed to find a record.
    Unattributable {
        event_type: String,
        reason: &'static str,
    },
    Unhandled {
        event_type: String,
    },
}

pub fn normalize(event_type: &str, data: Option<&PaystackEventData>) -> Normalized {
    let empty = PaystackEventData::default();
    let data = data.unwrap_or(&empty);

    let unattributable = |reason| Normalized::Unattributable {
        event_type: event_type.to_string(),
        reason,
    };

    match event_type {
        CHARGE_SUCCESS => Normalized::Event(NormalizedEvent::ChargeSucceeded {
            user_id: data.user_id(),
            customer_id: data.customer_id(),
            authorization_code: data.authorization_code(),
        }),
        SUBSCRIPTION_CREATE => match data.customer_code() {
            Some(customer_code) => Normalized::Event(NormalizedEvent::SubscriptionCreated {
                customer_code,
                next_payment_date: data.next_payment_date(),
                authorization_code: data.authorization_code(),
                subscription_code: data.subscription_code(),
            }),
            None => unattributable("missing customer code"),
        },
        SUBSCRIPTION_DISABLE => match data.subscription_code() {
            Some(subscription_code) => {
                Normalized::Event(NormalizedEvent::SubscriptionDisabled { subscription_code })
            }
            None => unattributable("missing subscription code"),
        },
        INVOICE_PAYMENT_FAILED => match data.customer_code() {
            Some(customer_code) => {
                Normalized::Event(NormalizedEvent::PaymentFailed { customer_code })
            }
            None => unattributable("missing customer code"),
        },
        _ => Normalized::Unhandled {
            event_type: event_type.to_string(),
        },
    }
}
