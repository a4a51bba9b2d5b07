//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::chat::{ChatBackend, CompletionRequest};
use crate::error::Error;
use crate::query::{Column, QueryResult, Table, TelemetryClient};

/// A mock chat backend that returns pre-configured replies.
pub struct MockChatBackend {
    responses: Mutex<Vec<Result<String, Error>>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply to be returned by the next complete() call.
    /// Replies are returned in FIFO order (first queued = first returned).
    pub fn queue_reply(&self, content: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(0, Ok(content.to_string()));
    }

    /// Queue an error for the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error> {
        self.captured_requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop() {
            Some(response) => response,
            None => Err(Error::EmptyResponse),
        }
    }
}

/// A mock telemetry client that returns pre-configured query results.
pub struct MockTelemetry {
    results: Mutex<Vec<Result<QueryResult, Error>>>,
    /// Captured query strings (for assertion).
    pub captured_queries: Mutex<Vec<String>>,
}

impl MockTelemetry {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            captured_queries: Mutex::new(Vec::new()),
        }
    }

    /// Queue a result for the next run_query() call (FIFO).
    pub fn queue_result(&self, result: QueryResult) {
        self.results.lock().unwrap().insert(0, Ok(result));
    }

    /// Queue an error for the next run_query() call.
    pub fn queue_error(&self, error: Error) {
        self.results.lock().unwrap().insert(0, Err(error));
    }

    pub fn query_count(&self) -> usize {
        self.captured_queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<String> {
        self.captured_queries.lock().unwrap().last().cloned()
    }
}

impl Default for MockTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryClient for MockTelemetry {
    async fn run_query(&self, query: &str) -> Result<QueryResult, Error> {
        self.captured_queries.lock().unwrap().push(query.to_string());
        match self.results.lock().unwrap().pop() {
            Some(result) => result,
            None => Err(Error::query(500, "No mock result queued")),
        }
    }
}

/// Build a result with `rows` custom-event rows, for tests.
pub fn events_result(rows: usize) -> QueryResult {
    QueryResult {
        tables: vec![Table {
            columns: vec![Column::new("timestamp"), Column::new("name")],
            rows: (0..rows)
                .map(|i| {
                    vec![
                        serde_json::json!(format!("2024-01-01T00:00:{:02}Z", i)),
                        serde_json::json!(format!("Event{}", i)),
                    ]
                })
                .collect(),
        }],
    }
}
