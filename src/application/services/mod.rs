//! Application services

pub mod store;

pub use store::{EditOutcome, ExpressionStore, SubscriptionId};
