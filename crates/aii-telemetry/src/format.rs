//! Textual renderings of query results.
//!
//! The verbose form is for the operator's terminal; the compact form is a
//! single JSON document, dense enough to re-inject as model context while
//! staying parseable.

use aii_core::QueryResult;

/// Row count of the first table, 0 when the result has no tables.
pub fn row_count(result: &QueryResult) -> usize {
    result.row_count()
}

/// One pretty-printed record per row, separated by rule lines and prefixed
/// with the row count.
pub fn format_verbose(result: &QueryResult) -> String {
    if result.first_table().is_none() {
        return "No results found.".to_string();
    }

    let records = result.records();
    if records.is_empty() {
        return "Query returned no rows.".to_string();
    }

    let mut output = format!("Found {} row(s)\n", records.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for record in &records {
        let rendered = serde_json::to_string_pretty(record)
            .unwrap_or_else(|_| "<unrenderable record>".to_string());
        output.push_str(&rendered);
        output.push('\n');
        output.push_str(&"─".repeat(40));
        output.push('\n');
    }

    output
}

/// The full record sequence as one pretty-printed JSON array.
pub fn format_compact(result: &QueryResult) -> String {
    if result.first_table().is_none() {
        return "No results found.".to_string();
    }

    let records = result.records();
    if records.is_empty() {
        return "Query returned no rows.".to_string();
    }

    serde_json::to_string_pretty(&records).unwrap_or_else(|_| "<unrenderable result>".to_string())
}
