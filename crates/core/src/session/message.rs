use crate::model::{GradeReport, Question, SessionId, SkillLevel, SubmissionPayload};

/// Everything that can happen to a session. Fed one at a time to
/// `SessionState::apply`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The question source answered.
    Loaded {
        session_id: SessionId,
        questions: Vec<Question>,
    },
    LoadFailed { reason: String },
    RetryRequested,
    /// One second elapsed.
    Tick,
    /// The viewport lost foreground visibility.
    FocusLost,
    SubmitRequested,
    SelectOption { option: usize },
    Navigate(Navigation),
    WarningDismissed,
    GradeSucceeded(GradeReport),
    GradeFailed { reason: String },
    /// The view owning the session went away.
    Disposed,
}

impl Message {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Loaded { .. } => "loaded",
            Message::LoadFailed { .. } => "load_failed",
            Message::RetryRequested => "retry_requested",
            Message::Tick => "tick",
            Message::FocusLost => "focus_lost",
            Message::SubmitRequested => "submit_requested",
            Message::SelectOption { .. } => "select_option",
            Message::Navigate(_) => "navigate",
            Message::WarningDismissed => "warning_dismissed",
            Message::GradeSucceeded(_) => "grade_succeeded",
            Message::GradeFailed { .. } => "grade_failed",
            Message::Disposed => "disposed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    Jump(usize),
}

/// Work the driver must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchQuestions { skill: String, level: SkillLevel },
    SubmitAnswers(SubmissionPayload),
}

/// Which condition ended the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimeExpired,
    StrikeLimit,
}

impl SubmitTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::TimeExpired => "time_expired",
            SubmitTrigger::StrikeLimit => "strike_limit",
        }
    }
}
