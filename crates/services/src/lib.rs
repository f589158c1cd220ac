#![forbid(unsafe_code)]

pub mod api;
pub mod controller;
pub mod error;

pub use proctor_core::Clock;

pub use api::{
    ApiConfig, AssessmentHistory, AssessmentRecord, AssessmentStatus, BankQuestion,
    GradingService, HttpAssessmentApi, InMemoryAssessmentApi, LoadedSession, QuestionSource,
    StaticToken, TokenProvider,
};
pub use controller::{DEFAULT_REQUEST_TIMEOUT, ProctoredSessionController, SessionHandle};
pub use error::{
    ApiConfigError, ApiError, ControllerError, GenerationError, GradingError, HistoryError,
};
