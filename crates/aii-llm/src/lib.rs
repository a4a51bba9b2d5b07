//! aii-llm: OpenAI-compatible chat transport and conversation session state.

mod openai;
mod session;

pub use openai::OpenAiBackend;
pub use session::ChatSession;
