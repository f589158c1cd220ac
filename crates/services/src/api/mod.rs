//! Collaborators of the session controller and their implementations.

pub mod config;
mod http;
mod in_memory;
mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proctor_core::model::{GradeReport, Question, SessionId, SkillLevel, SubmissionPayload};

use crate::error::{GenerationError, GradingError, HistoryError};

pub use config::ApiConfig;
pub use http::HttpAssessmentApi;
pub use in_memory::{BankQuestion, InMemoryAssessmentApi};

/// A freshly generated session: its id and ordered questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSession {
    pub session_id: SessionId,
    pub questions: Vec<Question>,
}

/// Hands out questions for a `(skill, level)` pair.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` when no session can be produced.
    async fn start_session(
        &self,
        skill: &str,
        level: SkillLevel,
    ) -> Result<LoadedSession, GenerationError>;
}

/// Grades one submission.
#[async_trait]
pub trait GradingService: Send + Sync {
    /// # Errors
    ///
    /// Returns `GradingError` when the submission cannot be graded.
    async fn submit_session(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<GradeReport, GradingError>;
}

/// Lifecycle status the API keeps for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AssessmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Completed => "completed",
            AssessmentStatus::Abandoned => "abandoned",
        }
    }
}

/// A past assessment as stored server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRecord {
    pub id: SessionId,
    pub skill: String,
    pub level: SkillLevel,
    pub score: Option<f64>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub tab_switches: u32,
    pub status: AssessmentStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read access to completed assessments.
#[async_trait]
pub trait AssessmentHistory: Send + Sync {
    /// Completed sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the listing cannot be fetched.
    async fn history(&self) -> Result<Vec<AssessmentRecord>, HistoryError>;

    /// # Errors
    ///
    /// Returns `HistoryError::NotFound` for an unknown id.
    async fn session_record(&self, id: SessionId) -> Result<AssessmentRecord, HistoryError>;
}

/// Supplies the bearer token for API calls. Injected, never read from
/// global state.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A token fixed at construction time.
#[derive(Clone, Debug, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
