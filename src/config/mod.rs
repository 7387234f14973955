//! Configuration management for the upvote bot
//!
//! - **parameter**: registry of recognized keys
//! - **store**: default layer + durable override layer
//! - **format**: user tokens → candidate value → stored value
//! - **validator**: per-parameter rules, including the post age window order

pub mod format;
pub mod parameter;
pub mod store;
pub mod validator;

// Re-export commonly used types
pub use format::{post_format, pre_format, CandidateValue};
pub use parameter::Parameter;
pub use store::ConfigStore;
pub use validator::validate;
