//! Application layer: the expression tree store and its collaborators
//!
//! This layer orchestrates domain edits, id generation and change notification.

pub mod command;
pub mod error;
pub mod ids;
pub mod services;

pub use command::EditCommand;
pub use error::{ApplicationError, ApplicationResult};
pub use ids::{IdGenerator, IdStrategy, SequentialIds, UuidIds};
pub use services::{EditOutcome, ExpressionStore, SubscriptionId};
