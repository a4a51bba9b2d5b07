//! Conversation state for one chat session.
//!
//! The session owns the ordered message log exclusively. The first message
//! is always the system prompt; the log is append-only except for
//! `clear_history` and `update_system_prompt`.

use std::sync::Arc;

use aii_core::{ChatBackend, CompletionRequest, Error, Message, Role};

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    messages: Vec<Message>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        let messages = vec![Message::system(system_prompt.clone())];
        Self {
            backend,
            system_prompt,
            messages,
        }
    }

    /// One conversational turn: append the user message, send the entire
    /// accumulated log to the backend, append and return the reply.
    pub async fn send(&mut self, user_message: impl Into<String>) -> Result<String, Error> {
        self.messages.push(Message::user(user_message));

        let response = self
            .backend
            .complete(CompletionRequest::new(self.messages.clone()))
            .await?;

        self.messages.push(Message::assistant(response.clone()));
        Ok(response)
    }

    /// Inject backend data as a synthetic user message so the model attends
    /// to it on the next send.
    pub fn add_context(&mut self, context: impl AsRef<str>) {
        self.messages
            .push(Message::user(format!("[Context]: {}", context.as_ref())));
    }

    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Reset the log to just the system message.
    pub fn clear_history(&mut self) {
        self.messages = vec![Message::system(self.system_prompt.clone())];
    }

    /// Replace the system message content in place, leaving the rest of the
    /// history untouched.
    pub fn update_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
        if let Some(first) = self.messages.first_mut() {
            if first.role == Role::System {
                first.content = self.system_prompt.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aii_core::testing::MockChatBackend;

    fn session_with(backend: Arc<MockChatBackend>) -> ChatSession {
        ChatSession::new(backend, "You are a test assistant.")
    }

    #[tokio::test]
    async fn test_send_appends_exactly_two() {
        let backend = Arc::new(MockChatBackend::new());
        backend.queue_reply("Hi there");
        let mut session = session_with(backend.clone());

        let before = session.history().len();
        let reply = session.send("Hello").await.unwrap();

        assert_eq!(reply, "Hi there");
        assert_eq!(session.history().len(), before + 2);
        assert_eq!(session.history()[0].role, Role::System);
        assert_eq!(session.history()[before].role, Role::User);
        assert_eq!(session.history()[before + 1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_send_transmits_full_history() {
        let backend = Arc::new(MockChatBackend::new());
        backend.queue_reply("first");
        backend.queue_reply("second");
        let mut session = session_with(backend.clone());

        session.send("one").await.unwrap();
        session.send("two").await.unwrap();

        // The second request carries system + turn one + the new user message.
        let last = backend.last_request().unwrap();
        assert_eq!(last.messages.len(), 4);
        assert_eq!(last.messages[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let backend = Arc::new(MockChatBackend::new());
        backend.queue_error(Error::llm(500, "boom"));
        let mut session = session_with(backend);

        assert!(session.send("Hello").await.is_err());
        // The user message was appended before the call failed.
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_add_context_marker() {
        let mut session = session_with(Arc::new(MockChatBackend::new()));
        session.add_context("3 events");

        let last = session.history().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "[Context]: 3 events");
    }

    #[tokio::test]
    async fn test_clear_history() {
        let backend = Arc::new(MockChatBackend::new());
        backend.queue_reply("ok");
        let mut session = session_with(backend);
        session.send("Hello").await.unwrap();
        session.add_context("data");

        session.clear_history();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_update_system_prompt_preserves_history() {
        let backend = Arc::new(MockChatBackend::new());
        backend.queue_reply("ok");
        let mut session = session_with(backend);
        session.send("Hello").await.unwrap();

        session.update_system_prompt("New prompt");
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[0].content, "New prompt");

        // A later clear seeds from the updated prompt.
        session.clear_history();
        assert_eq!(session.history()[0].content, "New prompt");
    }
}
