use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query failed ({status}): {body}")]
    Query { status: u16, body: String },

    #[error("LLM request failed ({status}): {body}")]
    Llm { status: u16, body: String },

    #[error("No response from LLM")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn query(status: u16, body: impl Into<String>) -> Self {
        Self::Query {
            status,
            body: body.into(),
        }
    }

    pub fn llm(status: u16, body: impl Into<String>) -> Self {
        Self::Llm {
            status,
            body: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    /// Whether this failure happened before any request left the process.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = Error::query(401, "unauthorized");
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = Error::llm(429, "rate limited");
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::config("missing key").is_config_error());
        assert!(!Error::network("timeout").is_config_error());
    }
}
