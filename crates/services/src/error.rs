//! Shared error types for the services crate.

use thiserror::Error;

use proctor_core::ConfigError;
use proctor_core::model::QuestionError;

/// Transport-level failures talking to the assessment API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// The question source could not produce a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("could not generate questions: {0}")]
    Api(#[from] ApiError),
    #[error("question source did not answer within {secs}s")]
    Timeout { secs: u64 },
    #[error("question source rejected the request: {0}")]
    Rejected(String),
    #[error("question source returned a malformed question: {0}")]
    InvalidQuestion(#[from] QuestionError),
    #[error("question request was aborted: {0}")]
    Aborted(String),
}

/// The grading service could not grade a submission.
///
/// Never surfaced to users: the controller turns it into a degraded result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradingError {
    #[error("could not grade answers: {0}")]
    Api(#[from] ApiError),
    #[error("grading service did not answer within {secs}s")]
    Timeout { secs: u64 },
    #[error("grading service rejected the submission: {0}")]
    Rejected(String),
    #[error("grading request was aborted: {0}")]
    Aborted(String),
}

/// Errors listing past assessments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("assessment {0} was not found")]
    NotFound(u64),
    #[error("assessment history is unavailable: {0}")]
    Unavailable(String),
}

/// Invalid environment configuration for the API client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiConfigError {
    #[error("API base URL is empty")]
    EmptyBaseUrl,
    #[error("invalid request timeout: {raw}")]
    InvalidTimeout { raw: String },
}

/// Errors from the session controller itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session driver has stopped")]
    Stopped,
}
