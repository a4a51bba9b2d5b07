//! aii-telemetry: Application Insights query client, canned KQL templates,
//! and result formatting.

mod client;
pub mod format;
pub mod queries;

pub use client::AppInsightsClient;
pub use format::{format_compact, format_verbose, row_count};
pub use queries::{recent_events_query, session_events_query};
