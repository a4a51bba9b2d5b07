//! System prompt loading for the investigator agent.
//!
//! An externally editable `Investigator.md` in the working directory wins;
//! a built-in prompt is the fallback. Never a hard failure.

use std::path::Path;

use tracing::warn;

pub const PROMPT_FILE: &str = "Investigator.md";

const DEFAULT_PROMPT: &str = "\
You are an App Insights investigator agent. You analyze Azure Application Insights telemetry data to help diagnose issues.

When given session data and a user complaint, analyze the events to identify:
1. The sequence of operations
2. Any errors or failures
3. Performance issues (slow operations)
4. Missing or unexpected events

Provide clear, actionable insights based on the telemetry data.";

pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if path.exists() {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            DEFAULT_PROMPT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = load_system_prompt(&dir.path().join(PROMPT_FILE));
        assert!(prompt.contains("App Insights investigator agent"));
    }

    #[test]
    fn test_file_contents_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROMPT_FILE);
        std::fs::write(&path, "Custom investigator instructions.").unwrap();
        assert_eq!(load_system_prompt(&path), "Custom investigator instructions.");
    }
}
