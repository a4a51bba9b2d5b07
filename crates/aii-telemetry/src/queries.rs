//! Canned KQL templates.
//!
//! These are string templates only. Session ids and time ranges are spliced
//! in verbatim; input is trusted operator input and is not sanitized against
//! query-language injection.

pub const DEFAULT_SESSION_RANGE: &str = "7d";
pub const DEFAULT_RECENT_RANGE: &str = "1d";
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// All events for one session within the time window, ascending by time.
pub fn session_events_query(session_id: &str, time_range: &str) -> String {
    format!(
        "customEvents\n\
         | where timestamp > ago({time_range})\n\
         | where session_Id == \"{session_id}\"\n\
         | project timestamp, name, session_Id, customDimensions, customMeasurements\n\
         | order by timestamp asc"
    )
}

/// Most recent events within the time window, newest first, truncated.
pub fn recent_events_query(limit: usize, time_range: &str) -> String {
    format!(
        "customEvents\n\
         | where timestamp > ago({time_range})\n\
         | project timestamp, name, session_Id, customDimensions\n\
         | order by timestamp desc\n\
         | take {limit}"
    )
}
