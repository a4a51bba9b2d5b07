//! Tabular telemetry results as returned by the Application Insights
//! query API, plus the client trait the agent orchestrates against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Response body of the `/query` endpoint: zero or more tables, each with
/// positionally aligned columns and rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
        }
    }
}

impl QueryResult {
    pub fn first_table(&self) -> Option<&Table> {
        self.tables.first()
    }

    /// Number of rows in the first table, 0 when there are no tables.
    pub fn row_count(&self) -> usize {
        self.first_table().map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Reconstruct the record view: each row zipped with the column names,
    /// in row order. Cells beyond the column count are dropped; short rows
    /// simply produce short records.
    pub fn records(&self) -> Vec<serde_json::Map<String, Value>> {
        let Some(table) = self.first_table() else {
            return Vec::new();
        };
        table
            .rows
            .iter()
            .map(|row| {
                table
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|(col, cell)| (col.name.clone(), cell.clone()))
                    .collect()
            })
            .collect()
    }
}

/// Executes an opaque query string against a telemetry backend.
///
/// The query language is not parsed or validated here; the backend is
/// trusted to interpret it.
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    async fn run_query(&self, query: &str) -> Result<QueryResult, Error>;
}
