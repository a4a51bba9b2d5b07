//! aii-core: Core types and traits for appinsight-investigator
//!
//! This crate provides the foundational types and traits used throughout
//! the App Insights investigator CLI tool.

pub mod chat;
pub mod error;
pub mod intent;
pub mod message;
pub mod query;
pub mod settings;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chat::{ChatBackend, CompletionRequest};
pub use error::Error;
pub use intent::{FencedQueryDetector, QueryIntentDetector};
pub use message::{Message, Role};
pub use query::{Column, QueryResult, Table, TelemetryClient};
pub use settings::{Settings, SettingsStore};

pub type Result<T> = std::result::Result<T, Error>;
