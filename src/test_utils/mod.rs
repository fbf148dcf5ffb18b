//! Test utilities shared by unit and HTTP-level tests.
//!
//! This module provides:
//! - Test data factories for creating valid subscription fixtures
//! - An in-memory `SubscriptionRepo` and a scriptable `PaymentProcessor`
//! - `TestAppStateBuilder` for driving routes through axum-test

mod app_state_builder;
mod factories;
mod subscription_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use subscription_mocks::*;
