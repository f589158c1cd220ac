use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::message::{Effect, Message, Navigation, SubmitTrigger};
use crate::config::SessionConfig;
use crate::model::{
    AnswerSheet, GradeReport, Question, SessionId, SkillLevel, SubmissionPayload,
    SubmissionResult,
};
use crate::strikes::{StrikeMonitor, StrikeOutcome, WarningLevel};
use crate::time::Clock;
use crate::timer::{Countdown, TickOutcome};

/// Prompt a shell shows before letting the user leave an active session.
pub const EXIT_WARNING: &str =
    "Your assessment is in progress. Leaving will auto-submit your current answers.";

/// Failure text when the source returns an empty question list.
pub const NO_QUESTIONS: &str = "no questions were returned for this skill";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Active,
    Submitting,
    Result,
    Failed,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Active => "active",
            Phase::Submitting => "submitting",
            Phase::Result => "result",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a message was refused. Internal only: callers log these, users never
/// see them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Rejection {
    #[error("session has been disposed")]
    Disposed,

    #[error("session is {phase}, not active")]
    NotActive { phase: Phase },

    #[error("session is locked")]
    Locked,

    #[error("a submission is already in flight or completed")]
    AlreadySubmitted,

    #[error("option {option} is out of range ({available} available)")]
    OptionOutOfRange { option: usize, available: usize },

    #[error("question index {index} is out of range ({len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{message} is not expected while {phase}")]
    OutOfOrder { message: &'static str, phase: Phase },
}

/// One proctored question-answering session, from loading to result.
///
/// All mutation goes through `apply`, which is synchronous; a driver that
/// feeds messages one at a time gets the submission guard for free.
#[derive(Debug, Clone)]
pub struct SessionState {
    config: SessionConfig,
    skill: String,
    level: SkillLevel,
    clock: Clock,
    phase: Phase,
    session_id: Option<SessionId>,
    questions: Arc<[Question]>,
    current_index: usize,
    answers: AnswerSheet,
    countdown: Option<Countdown>,
    strikes: Option<StrikeMonitor>,
    locked: bool,
    submit_trigger: Option<SubmitTrigger>,
    result: Option<SubmissionResult>,
    failure: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    disposed: bool,
}

impl SessionState {
    /// Create a session in `Loading` along with the fetch it needs.
    #[must_use]
    pub fn begin(
        skill: impl Into<String>,
        level: SkillLevel,
        config: SessionConfig,
        clock: Clock,
    ) -> (Self, Effect) {
        let state = Self {
            config,
            skill: skill.into(),
            level,
            clock,
            phase: Phase::Loading,
            session_id: None,
            questions: Arc::from(Vec::new()),
            current_index: 0,
            answers: AnswerSheet::new(),
            countdown: config.time_budget_secs().map(Countdown::new),
            strikes: config.strike_limit().map(StrikeMonitor::new),
            locked: false,
            submit_trigger: None,
            result: None,
            failure: None,
            started_at: None,
            completed_at: None,
            disposed: false,
        };
        let fetch = state.fetch_effect();
        (state, fetch)
    }

    /// Apply one message.
    ///
    /// Background signals (`Tick`, `FocusLost`) outside the active phase are
    /// dropped with no effect rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `Rejection` when the message is not allowed in the current
    /// phase or carries an out-of-range index. State is unchanged then.
    pub fn apply(&mut self, message: Message) -> Result<Vec<Effect>, Rejection> {
        if self.disposed {
            return Err(Rejection::Disposed);
        }

        match message {
            Message::Loaded {
                session_id,
                questions,
            } => self.on_loaded(session_id, questions),
            Message::LoadFailed { reason } => self.on_load_failed(reason),
            Message::RetryRequested => self.on_retry(),
            Message::Tick => self.on_tick(),
            Message::FocusLost => self.on_focus_lost(),
            Message::SubmitRequested => self.on_submit_requested(),
            Message::SelectOption { option } => self.on_select(option),
            Message::Navigate(nav) => self.on_navigate(nav),
            Message::WarningDismissed => {
                if let Some(strikes) = self.strikes.as_mut() {
                    strikes.dismiss_warning();
                }
                Ok(Vec::new())
            }
            Message::GradeSucceeded(report) => self.on_graded(Some(report)),
            Message::GradeFailed { .. } => self.on_graded(None),
            Message::Disposed => {
                self.disposed = true;
                self.stop_listeners();
                Ok(Vec::new())
            }
        }
    }

    fn on_loaded(
        &mut self,
        session_id: SessionId,
        questions: Vec<Question>,
    ) -> Result<Vec<Effect>, Rejection> {
        self.expect_phase(Phase::Loading, "loaded")?;

        if questions.is_empty() {
            self.phase = Phase::Failed;
            self.failure = Some(NO_QUESTIONS.to_string());
            return Ok(Vec::new());
        }

        self.session_id = Some(session_id);
        self.questions = Arc::from(questions);
        self.current_index = 0;
        self.phase = Phase::Active;
        self.started_at = Some(self.clock.now());
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.start();
        }
        if let Some(strikes) = self.strikes.as_mut() {
            strikes.attach();
        }
        Ok(Vec::new())
    }

    fn on_load_failed(&mut self, reason: String) -> Result<Vec<Effect>, Rejection> {
        self.expect_phase(Phase::Loading, "load_failed")?;
        self.phase = Phase::Failed;
        self.failure = Some(reason);
        Ok(Vec::new())
    }

    fn on_retry(&mut self) -> Result<Vec<Effect>, Rejection> {
        self.expect_phase(Phase::Failed, "retry_requested")?;
        self.phase = Phase::Loading;
        self.failure = None;
        Ok(vec![self.fetch_effect()])
    }

    fn on_tick(&mut self) -> Result<Vec<Effect>, Rejection> {
        if self.phase != Phase::Active {
            return Ok(Vec::new());
        }
        let outcome = match self.countdown.as_mut() {
            Some(countdown) => countdown.tick(),
            None => TickOutcome::Idle,
        };
        match outcome {
            TickOutcome::Expired => self.begin_submission(SubmitTrigger::TimeExpired),
            TickOutcome::Idle | TickOutcome::Running { .. } => Ok(Vec::new()),
        }
    }

    fn on_focus_lost(&mut self) -> Result<Vec<Effect>, Rejection> {
        if self.phase != Phase::Active {
            return Ok(Vec::new());
        }
        let outcome = match self.strikes.as_mut() {
            Some(strikes) => strikes.record_focus_loss(),
            None => StrikeOutcome::Ignored,
        };
        match outcome {
            StrikeOutcome::LimitReached { .. } => {
                self.locked = true;
                self.begin_submission(SubmitTrigger::StrikeLimit)
            }
            StrikeOutcome::Ignored | StrikeOutcome::Warned { .. } => Ok(Vec::new()),
        }
    }

    fn on_submit_requested(&mut self) -> Result<Vec<Effect>, Rejection> {
        match self.phase {
            Phase::Submitting | Phase::Result => Err(Rejection::AlreadySubmitted),
            Phase::Active => self.begin_submission(SubmitTrigger::Manual),
            phase @ (Phase::Loading | Phase::Failed) => Err(Rejection::NotActive { phase }),
        }
    }

    fn on_select(&mut self, option: usize) -> Result<Vec<Effect>, Rejection> {
        if self.locked {
            return Err(Rejection::Locked);
        }
        self.ensure_active()?;

        let available = self
            .current_question()
            .map_or(0, Question::option_count);
        if option >= available {
            return Err(Rejection::OptionOutOfRange { option, available });
        }
        self.answers.record(self.current_index, option);
        Ok(Vec::new())
    }

    fn on_navigate(&mut self, nav: Navigation) -> Result<Vec<Effect>, Rejection> {
        self.ensure_active()?;
        let len = self.questions.len();
        self.current_index = match nav {
            Navigation::Next => (self.current_index + 1).min(len.saturating_sub(1)),
            Navigation::Previous => self.current_index.saturating_sub(1),
            Navigation::Jump(index) if index < len => index,
            Navigation::Jump(index) => return Err(Rejection::IndexOutOfRange { index, len }),
        };
        Ok(Vec::new())
    }

    fn on_graded(&mut self, report: Option<GradeReport>) -> Result<Vec<Effect>, Rejection> {
        let label = if report.is_some() {
            "grade_succeeded"
        } else {
            "grade_failed"
        };
        self.expect_phase(Phase::Submitting, label)?;

        let tab_switches = self.strike_count();
        let strike_limit = self.config.strike_limit();
        let result = match report {
            Some(report) => SubmissionResult::from_report(
                report,
                self.config.pass_threshold(),
                tab_switches,
                strike_limit,
            ),
            None => SubmissionResult::degraded(
                u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
                tab_switches,
                strike_limit,
            ),
        };
        self.result = Some(result);
        self.phase = Phase::Result;
        self.completed_at = Some(self.clock.now());
        Ok(Vec::new())
    }

    /// The single guarded entry into `Submitting`.
    fn begin_submission(&mut self, trigger: SubmitTrigger) -> Result<Vec<Effect>, Rejection> {
        if matches!(self.phase, Phase::Submitting | Phase::Result) {
            return Err(Rejection::AlreadySubmitted);
        }
        let payload = self.payload()?;
        self.phase = Phase::Submitting;
        self.submit_trigger = Some(trigger);
        self.stop_listeners();
        Ok(vec![Effect::SubmitAnswers(payload)])
    }

    fn payload(&self) -> Result<SubmissionPayload, Rejection> {
        let session_id = self.session_id.ok_or(Rejection::OutOfOrder {
            message: "submit",
            phase: self.phase,
        })?;
        Ok(SubmissionPayload {
            session_id,
            answers: self.answers.entries_for(&self.questions),
            tab_switches: self.strike_count(),
        })
    }

    fn stop_listeners(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.stop();
        }
        if let Some(strikes) = self.strikes.as_mut() {
            strikes.detach();
        }
    }

    fn fetch_effect(&self) -> Effect {
        Effect::FetchQuestions {
            skill: self.skill.clone(),
            level: self.level,
        }
    }

    fn ensure_active(&self) -> Result<(), Rejection> {
        match self.phase {
            Phase::Active => Ok(()),
            phase => Err(Rejection::NotActive { phase }),
        }
    }

    fn expect_phase(&self, expected: Phase, message: &'static str) -> Result<(), Rejection> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Rejection::OutOfOrder {
                message,
                phase: self.phase,
            })
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn skill(&self) -> &str {
        &self.skill
    }

    #[must_use]
    pub fn level(&self) -> SkillLevel {
        self.level
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    /// Seconds left, or `None` for an untimed session.
    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    #[must_use]
    pub fn is_time_urgent(&self) -> bool {
        self.countdown.as_ref().is_some_and(Countdown::is_urgent)
    }

    /// True while the driver should deliver ticks.
    #[must_use]
    pub fn countdown_running(&self) -> bool {
        self.phase == Phase::Active && self.countdown.as_ref().is_some_and(Countdown::is_running)
    }

    #[must_use]
    pub fn strike_count(&self) -> u32 {
        self.strikes.as_ref().map_or(0, StrikeMonitor::count)
    }

    #[must_use]
    pub fn strike_limit(&self) -> Option<u32> {
        self.config.strike_limit()
    }

    #[must_use]
    pub fn warning(&self) -> WarningLevel {
        self.strikes
            .as_ref()
            .map_or(WarningLevel::None, StrikeMonitor::warning)
    }

    /// True while focus losses are being counted.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.phase == Phase::Active && self.strikes.as_ref().is_some_and(StrikeMonitor::is_attached)
    }

    /// Set once the strike limit is hit; no further answer changes are taken.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn submit_trigger(&self) -> Option<SubmitTrigger> {
        self.submit_trigger
    }

    #[must_use]
    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// `Result` reached or the owner went away.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.disposed || self.phase == Phase::Result
    }

    /// Warning to confirm before leaving, present only while active.
    #[must_use]
    pub fn exit_warning(&self) -> Option<&'static str> {
        (self.phase == Phase::Active && !self.disposed).then_some(EXIT_WARNING)
    }
}
