//! # ReadKnows Common Library
//!
//! Shared code for the ReadKnows import tooling:
//! - Error type
//! - TOML configuration loading and value resolution
//! - Event types (RkEvent enum) and the EventBus
//! - Client-side pagination of list views

pub mod config;
pub mod error;
pub mod events;
pub mod pagination;

pub use error::{Error, Result};
