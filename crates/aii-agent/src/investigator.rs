//! The investigator agent: drives the query-augmented conversation loop.
//!
//! One active session at a time. Loading a session injects its telemetry
//! into the chat as context; every model reply is scanned for an embedded
//! query, which is executed and fed back into the same conversation before
//! a follow-up reply is requested.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use aii_core::{
    ChatBackend, Error, FencedQueryDetector, Message, QueryIntentDetector, TelemetryClient,
};
use aii_llm::ChatSession;
use aii_telemetry::{format_compact, queries, row_count, session_events_query};

use crate::prompt::{load_system_prompt, PROMPT_FILE};

/// Outcome of a successful session load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLoad {
    pub event_count: usize,
}

/// Outcome of a direct (non-conversational) query.
#[derive(Debug, Clone)]
pub struct CustomQuery {
    pub data: String,
    pub row_count: usize,
}

pub struct InvestigatorAgent {
    session: ChatSession,
    chat_backend: Arc<dyn ChatBackend>,
    telemetry: Arc<dyn TelemetryClient>,
    detector: Box<dyn QueryIntentDetector>,
    prompt_path: PathBuf,
    current_session_id: Option<String>,
    event_count: usize,
}

impl InvestigatorAgent {
    pub fn new(chat_backend: Arc<dyn ChatBackend>, telemetry: Arc<dyn TelemetryClient>) -> Self {
        let prompt_path = PathBuf::from(PROMPT_FILE);
        let session = ChatSession::new(chat_backend.clone(), load_system_prompt(&prompt_path));
        Self {
            session,
            chat_backend,
            telemetry,
            detector: Box::new(FencedQueryDetector),
            prompt_path,
            current_session_id: None,
            event_count: 0,
        }
    }

    /// Load the system prompt from a specific file instead of
    /// `Investigator.md` in the working directory.
    pub fn with_prompt_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_path = path.into();
        self.session = ChatSession::new(
            self.chat_backend.clone(),
            load_system_prompt(&self.prompt_path),
        );
        self
    }

    /// Substitute the query-intent detection strategy.
    pub fn with_detector(mut self, detector: Box<dyn QueryIntentDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn history(&self) -> &[Message] {
        self.session.history()
    }

    /// Load a session's telemetry into the conversation as context.
    ///
    /// Session id and event count are committed only on success; a failed
    /// load leaves the agent state untouched.
    pub async fn set_session(&mut self, session_id: &str) -> Result<SessionLoad, Error> {
        let query = session_events_query(session_id, queries::DEFAULT_SESSION_RANGE);
        let result = self.telemetry.run_query(&query).await?;

        let data = format_compact(&result);
        let event_count = row_count(&result);

        self.session.add_context(format!(
            "Session ID: {}\nSession Data ({} events):\n{}",
            session_id, event_count, data
        ));

        self.current_session_id = Some(session_id.to_string());
        self.event_count = event_count;
        info!(%session_id, event_count, "session loaded");

        Ok(SessionLoad { event_count })
    }

    /// Start an investigation of a user complaint against the loaded
    /// session. Without a loaded session this returns guidance text rather
    /// than an error.
    pub async fn investigate(&mut self, complaint: &str) -> Result<String, Error> {
        if self.current_session_id.is_none() {
            return Ok(
                "No session loaded. Use \"session <id>\" to load a session first.".to_string(),
            );
        }

        let prompt = format!(
            "User complaint: \"{complaint}\"\n\
             \n\
             Based on the session data provided, investigate this issue. Analyze the events, \
             look for errors, timing issues, or anything that might explain the user's complaint.\n\
             \n\
             If you need to run additional queries, provide the KQL query in a code block and \
             I will execute it for you."
        );

        let response = self.session.send(prompt).await?;
        self.process_response(response).await
    }

    /// Free-form conversational turn.
    pub async fn chat(&mut self, message: &str) -> Result<String, Error> {
        let response = self.session.send(message).await?;
        self.process_response(response).await
    }

    /// Scan a model reply for an embedded query. On a match, execute it,
    /// inject the result as context, and request one follow-up analysis;
    /// the follow-up is strictly ordered after the query completes. A
    /// failed query becomes an inline note on the original reply.
    async fn process_response(&mut self, response: String) -> Result<String, Error> {
        let Some(query) = self.detector.detect(&response) else {
            return Ok(response);
        };

        info!("model requested query execution");
        match self.telemetry.run_query(&query).await {
            Ok(result) => {
                let data = format_compact(&result);
                let rows = row_count(&result);
                self.session
                    .add_context(format!("Query result ({} rows):\n{}", rows, data));

                let follow_up = self
                    .session
                    .send("Here are the query results. Please analyze them and continue the investigation.")
                    .await?;

                let rule = "─".repeat(60);
                Ok(format!(
                    "{response}\n\n{rule}\n[Query Results: {rows} row(s)]\n{rule}\n\n{follow_up}"
                ))
            }
            Err(e) => Ok(format!("{response}\n\n[Query execution failed: {e}]")),
        }
    }

    /// Execute an operator-supplied query outside the conversation, but
    /// inject its result as context so the model can reference it.
    pub async fn run_custom_query(&mut self, query: &str) -> Result<CustomQuery, Error> {
        let result = self.telemetry.run_query(query).await?;
        let data = format_compact(&result);
        let rows = row_count(&result);

        self.session
            .add_context(format!("Custom query result ({} rows):\n{}", rows, data));

        Ok(CustomQuery {
            data,
            row_count: rows,
        })
    }

    /// Discard the conversation and loaded session; the system prompt is
    /// reloaded from disk so edits to the prompt file take effect.
    pub fn clear_context(&mut self) {
        self.session = ChatSession::new(
            self.chat_backend.clone(),
            load_system_prompt(&self.prompt_path),
        );
        self.current_session_id = None;
        self.event_count = 0;
    }
}
