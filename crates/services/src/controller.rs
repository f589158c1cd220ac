//! Async driver for a single proctored session.
//!
//! `ProctoredSessionController::start` spawns one task that owns the
//! `SessionState`. Commands from `SessionHandle`s, one-second ticks and the
//! completions of network calls all funnel into that task and are applied in
//! order, so the state machine never sees two messages at once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use proctor_core::model::{SessionId, SkillLevel};
use proctor_core::{Clock, Effect, Message, Navigation, Phase, SessionConfig, SessionState};
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{GradingService, QuestionSource};
use crate::error::{ControllerError, GenerationError, GradingError};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TICK: Duration = Duration::from_secs(1);

/// Starts sessions against a question source and a grader.
#[derive(Clone)]
pub struct ProctoredSessionController {
    questions: Arc<dyn QuestionSource>,
    grading: Arc<dyn GradingService>,
    config: SessionConfig,
    clock: Clock,
    request_timeout: Duration,
}

impl ProctoredSessionController {
    /// # Errors
    ///
    /// Returns `ControllerError::Config` if `config` does not validate.
    pub fn new(
        questions: Arc<dyn QuestionSource>,
        grading: Arc<dyn GradingService>,
        config: SessionConfig,
    ) -> Result<Self, ControllerError> {
        Ok(Self {
            questions,
            grading,
            config: config.validate()?,
            clock: Clock::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Longest a single question fetch or grading call may run.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Begin loading questions for `skill` and return a handle to the session.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(&self, skill: impl Into<String>, level: SkillLevel) -> SessionHandle {
        let skill = skill.into();
        info!(%skill, %level, proctored = self.config.is_proctored(), "starting assessment session");

        let (state, fetch) = SessionState::begin(skill, level, self.config, self.clock);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(state.clone());

        let driver = Driver {
            state,
            questions: Arc::clone(&self.questions),
            grading: Arc::clone(&self.grading),
            request_timeout: self.request_timeout,
            commands: commands_rx,
            events_tx,
            events: events_rx,
            snapshots: snapshots_tx,
            in_flight: Vec::new(),
        };
        tokio::spawn(driver.run(fetch));

        SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        }
    }
}

/// Cheap, cloneable access to a running session.
///
/// Commands are fire-and-forget: a command the session refuses is logged and
/// dropped. Dropping every handle disposes the session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<SessionState>,
}

impl SessionHandle {
    fn send(&self, message: Message) -> Result<(), ControllerError> {
        self.commands
            .send(message)
            .map_err(|_| ControllerError::Stopped)
    }

    /// Record `option` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn select(&self, option: usize) -> Result<(), ControllerError> {
        self.send(Message::SelectOption { option })
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn next(&self) -> Result<(), ControllerError> {
        self.send(Message::Navigate(Navigation::Next))
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn previous(&self) -> Result<(), ControllerError> {
        self.send(Message::Navigate(Navigation::Previous))
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn jump(&self, index: usize) -> Result<(), ControllerError> {
        self.send(Message::Navigate(Navigation::Jump(index)))
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn submit(&self) -> Result<(), ControllerError> {
        self.send(Message::SubmitRequested)
    }

    /// Report that the session lost foreground visibility.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn focus_lost(&self) -> Result<(), ControllerError> {
        self.send(Message::FocusLost)
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn dismiss_warning(&self) -> Result<(), ControllerError> {
        self.send(Message::WarningDismissed)
    }

    /// Reload questions after a failed load.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` once the session has been disposed.
    pub fn retry(&self) -> Result<(), ControllerError> {
        self.send(Message::RetryRequested)
    }

    /// Stop the session. A grading result that arrives later is discarded.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if it was already disposed.
    pub fn dispose(&self) -> Result<(), ControllerError> {
        self.send(Message::Disposed)
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }

    /// Wait until the session reaches `Result` or is disposed.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the driver ends first.
    pub async fn finished(&self) -> Result<SessionState, ControllerError> {
        self.wait_until(SessionState::is_finished).await
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the driver ends before `phase`
    /// is reached.
    pub async fn wait_for_phase(&self, phase: Phase) -> Result<SessionState, ControllerError> {
        self.wait_until(|state| state.phase() == phase).await
    }

    async fn wait_until(
        &self,
        mut predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, ControllerError> {
        let mut rx = self.snapshots.clone();
        let state = rx
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| ControllerError::Stopped)?;
        Ok(state.clone())
    }
}

/// Why a bounded collaborator call produced no value.
enum CallFailure {
    TimedOut,
    Aborted(String),
}

/// Run `call` on its own task under `limit`. A panic inside the call
/// surfaces as `Aborted` instead of tearing down the driver.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = T> + Send + 'static,
) -> Result<T, CallFailure>
where
    T: Send + 'static,
{
    let mut task = tokio::spawn(call);
    match time::timeout(limit, &mut task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join)) => Err(CallFailure::Aborted(join.to_string())),
        Err(_) => {
            task.abort();
            Err(CallFailure::TimedOut)
        }
    }
}

struct Driver {
    state: SessionState,
    questions: Arc<dyn QuestionSource>,
    grading: Arc<dyn GradingService>,
    request_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Message>,
    events_tx: mpsc::UnboundedSender<Message>,
    events: mpsc::UnboundedReceiver<Message>,
    snapshots: watch::Sender<SessionState>,
    in_flight: Vec<AbortHandle>,
}

impl Driver {
    async fn run(mut self, fetch: Effect) {
        self.perform(fetch);

        let mut ticker = time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticking = false;

        while !self.state.is_disposed() {
            let running = self.state.countdown_running();
            if running && !ticking {
                ticker.reset();
            }
            ticking = running;

            let message = tokio::select! {
                command = self.commands.recv() => command.unwrap_or(Message::Disposed),
                Some(event) = self.events.recv() => event,
                _ = ticker.tick(), if ticking => Message::Tick,
            };
            self.handle(message);
        }

        for task in self.in_flight.drain(..) {
            task.abort();
        }
        debug!(session_id = self.session_id(), "session driver stopped");
    }

    fn session_id(&self) -> Option<u64> {
        self.state.session_id().map(SessionId::value)
    }

    fn handle(&mut self, message: Message) {
        let kind = message.kind();
        let phase_before = self.state.phase();
        let strikes_before = self.state.strike_count();

        match self.state.apply(message) {
            Ok(effects) => {
                for effect in effects {
                    self.perform(effect);
                }
            }
            Err(rejection) => {
                debug!(session_id = self.session_id(), message = kind, %rejection, "message rejected");
            }
        }

        if self.state.strike_count() > strikes_before {
            warn!(
                session_id = self.session_id(),
                strikes = self.state.strike_count(),
                limit = self.state.strike_limit(),
                locked = self.state.is_locked(),
                "focus lost during assessment"
            );
        }
        if self.state.phase() != phase_before {
            self.log_transition(phase_before);
        }

        self.snapshots.send_replace(self.state.clone());
    }

    fn log_transition(&self, from: Phase) {
        let to = self.state.phase();
        info!(session_id = self.session_id(), %from, %to, "session phase changed");
        match to {
            Phase::Submitting => {
                let trigger = self.state.submit_trigger().map(|t| t.as_str());
                info!(
                    session_id = self.session_id(),
                    trigger,
                    answered = self.state.answers().answered_count(),
                    total = self.state.questions().len(),
                    "submitting answers"
                );
            }
            Phase::Result => {
                if let Some(result) = self.state.result() {
                    info!(
                        session_id = self.session_id(),
                        score = result.score(),
                        passed = result.passed(),
                        degraded = result.is_degraded(),
                        "assessment graded"
                    );
                }
            }
            Phase::Failed => {
                warn!(
                    session_id = self.session_id(),
                    reason = self.state.failure().unwrap_or_default(),
                    "could not load questions"
                );
            }
            Phase::Loading | Phase::Active => {}
        }
    }

    fn perform(&mut self, effect: Effect) {
        self.in_flight.retain(|task| !task.is_finished());
        let events = self.events_tx.clone();
        let limit = self.request_timeout;

        let task = match effect {
            Effect::FetchQuestions { skill, level } => {
                let source = Arc::clone(&self.questions);
                tokio::spawn(async move {
                    let outcome =
                        bounded(limit, async move { source.start_session(&skill, level).await })
                            .await;
                    let message = match flatten_generation(outcome, limit) {
                        Ok(loaded) => Message::Loaded {
                            session_id: loaded.session_id,
                            questions: loaded.questions,
                        },
                        Err(err) => {
                            warn!(error = %err, "question source failed");
                            Message::LoadFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    if events.send(message).is_err() {
                        debug!("session gone before questions arrived");
                    }
                })
            }
            Effect::SubmitAnswers(payload) => {
                let grading = Arc::clone(&self.grading);
                let session_id = payload.session_id.value();
                tokio::spawn(async move {
                    let outcome =
                        bounded(limit, async move { grading.submit_session(&payload).await })
                            .await;
                    let message = match flatten_grading(outcome, limit) {
                        Ok(report) => Message::GradeSucceeded(report),
                        Err(err) => {
                            warn!(session_id, error = %err, "grading failed, using a zero score");
                            Message::GradeFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    if events.send(message).is_err() {
                        debug!(session_id, "session disposed, discarding grading outcome");
                    }
                })
            }
        };
        self.in_flight.push(task.abort_handle());
    }
}

fn flatten_generation<T>(
    outcome: Result<Result<T, GenerationError>, CallFailure>,
    limit: Duration,
) -> Result<T, GenerationError> {
    match outcome {
        Ok(result) => result,
        Err(CallFailure::TimedOut) => Err(GenerationError::Timeout {
            secs: limit.as_secs(),
        }),
        Err(CallFailure::Aborted(reason)) => Err(GenerationError::Aborted(reason)),
    }
}

fn flatten_grading<T>(
    outcome: Result<Result<T, GradingError>, CallFailure>,
    limit: Duration,
) -> Result<T, GradingError> {
    match outcome {
        Ok(result) => result,
        Err(CallFailure::TimedOut) => Err(GradingError::Timeout {
            secs: limit.as_secs(),
        }),
        Err(CallFailure::Aborted(reason)) => Err(GradingError::Aborted(reason)),
    }
}
