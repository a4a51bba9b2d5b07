//! Query-intent detection over model replies.
//!
//! A reply may embed a KQL query the model wants executed. Detection is a
//! deliberately conservative two-stage gate: the prose must contain an
//! intent phrase, and the fenced block must look like a query. Fenced text
//! that appears for illustration only does not pass both gates.

use regex::Regex;
use std::sync::OnceLock;

/// Phrases in the reply prose that signal the model wants a query run.
const TRIGGER_PHRASES: &[&str] = &["execute", "run", "let me query"];

/// Tokens a fenced block must contain to be treated as an executable query.
const QUERY_TOKENS: &[&str] = &["customevents", "where", "project"];

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:kql|kusto)?\s*(.*?)```").unwrap())
}

/// Strategy for extracting an executable query from a model reply.
///
/// Isolated behind a trait so a structured function-calling strategy could
/// be substituted without touching the agent's orchestration.
pub trait QueryIntentDetector: Send + Sync {
    /// Returns the query text if the reply asks for one to be executed.
    fn detect(&self, reply: &str) -> Option<String>;
}

/// Default detector: fenced code block (optionally tagged `kql`/`kusto`)
/// plus substring heuristics on the surrounding prose and block content.
#[derive(Debug, Default, Clone, Copy)]
pub struct FencedQueryDetector;

impl QueryIntentDetector for FencedQueryDetector {
    fn detect(&self, reply: &str) -> Option<String> {
        let captures = fence_regex().captures(reply)?;
        let block = captures.get(1)?.as_str().trim();

        let prose = reply.to_lowercase();
        if !TRIGGER_PHRASES.iter().any(|p| prose.contains(p)) {
            return None;
        }

        let body = block.to_lowercase();
        if !QUERY_TOKENS.iter().any(|t| body.contains(t)) {
            return None;
        }

        Some(block.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(reply: &str) -> Option<String> {
        FencedQueryDetector.detect(reply)
    }

    #[test]
    fn test_trigger_phrase_and_query_shape() {
        let reply = "Let me query for errors:\n```kql\ncustomEvents | where x == 1\n```";
        assert_eq!(detect(reply), Some("customEvents | where x == 1".to_string()));
    }

    #[test]
    fn test_untagged_fence_detected() {
        let reply = "I'll run this:\n```\ncustomEvents | project name\n```";
        assert_eq!(detect(reply), Some("customEvents | project name".to_string()));
    }

    #[test]
    fn test_no_trigger_phrase_ignored() {
        // Same query, but the prose never asks for execution.
        let reply = "Here is an example:\n```kql\ncustomEvents | where x == 1\n```";
        assert_eq!(detect(reply), None);
    }

    #[test]
    fn test_non_query_block_ignored() {
        let reply = "Let me run through the steps:\n```\njust some prose in a fence\n```";
        assert_eq!(detect(reply), None);
    }

    #[test]
    fn test_no_fence_ignored() {
        assert_eq!(detect("Please run customEvents | where x == 1"), None);
    }

    #[test]
    fn test_case_insensitive_tokens() {
        let reply = "Execute this:\n```kusto\nCustomEvents | WHERE success == false\n```";
        assert!(detect(reply).is_some());
    }
}
