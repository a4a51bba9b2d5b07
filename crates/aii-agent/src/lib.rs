//! aii-agent: investigation orchestration over one telemetry session.

mod investigator;
mod prompt;

pub use investigator::{CustomQuery, InvestigatorAgent, SessionLoad};
pub use prompt::{load_system_prompt, PROMPT_FILE};
