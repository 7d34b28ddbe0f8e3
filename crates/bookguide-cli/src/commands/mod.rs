//! Command handlers, one module per command group

use std::sync::Arc;

use bookguide_core::KeyValueStorage;

pub mod catalog;
pub mod config;
pub mod library;
pub mod review;
pub mod session;
pub mod shelf;
pub mod status;

/// Storage backend shared by every store in one invocation
pub type Backend = Arc<dyn KeyValueStorage>;
