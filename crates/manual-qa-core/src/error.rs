//! Failure taxonomy of the answer pipeline.
//!
//! Every variant has a user-facing rendering via
//! [`AnswerError::user_message`]; none of them is fatal to the process.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnswerError {
    /// The question was empty or whitespace only.
    #[error("empty query")]
    EmptyQuery,

    /// The vector store was unreachable or the query failed.
    #[error("retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Retrieval succeeded but nothing relevant was found.
    #[error("no relevant context")]
    NoRelevantContext,

    /// The generation endpoint did not answer within the timeout.
    #[error("generation timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    /// The generation endpoint could not be reached.
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),

    /// The generation endpoint answered with a non-success status.
    #[error("generation failed with status {status}")]
    GenerationError { status: u16 },

    /// The generation endpoint answered 200 with an unusable body.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

impl AnswerError {
    /// The string shown to the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            AnswerError::EmptyQuery => {
                "Please provide a question about the documentation.".to_string()
            }
            AnswerError::RetrievalFailed(_) | AnswerError::NoRelevantContext => {
                "No relevant information found in the documentation for this question. \
                 Try rephrasing it or using different keywords."
                    .to_string()
            }
            AnswerError::GenerationTimeout { secs } => format!(
                "Error: The request to the local LLM timed out after {} seconds. \
                 Try a shorter question or try again later.",
                secs
            ),
            AnswerError::GenerationUnavailable(detail) => format!(
                "Error: Unable to connect to the local LLM service (service unavailable). \
                 Make sure Ollama is installed and running. Details: {}",
                detail
            ),
            AnswerError::GenerationError { status } => format!(
                "Error: Unable to get response from local LLM (Status code: {})",
                status
            ),
            AnswerError::InvalidResponse(detail) => format!(
                "Error: Unable to get response from local LLM (invalid response: {})",
                detail
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_in_message() {
        let msg = AnswerError::GenerationError { status: 500 }.user_message();
        assert!(msg.contains("Unable to get response"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_timeout_message() {
        let msg = AnswerError::GenerationTimeout { secs: 180 }.user_message();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("180"));
    }

    #[test]
    fn test_unavailable_message() {
        let msg = AnswerError::GenerationUnavailable("connection refused".into()).user_message();
        assert!(msg.contains("service unavailable"));
    }

    #[test]
    fn test_empty_query_message() {
        assert!(AnswerError::EmptyQuery.user_message().contains("provide a question"));
    }
}
