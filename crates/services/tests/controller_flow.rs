use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proctor_core::model::{
    GradeReport, Question, QuestionId, Selection, SessionId, SkillLevel, SubmissionPayload,
};
use proctor_core::session::NO_QUESTIONS;
use proctor_core::time::fixed_clock;
use proctor_core::{Phase, SessionConfig, SubmitTrigger, WarningLevel};
use services::{
    GenerationError, GradingError, GradingService, InMemoryAssessmentApi, LoadedSession,
    ProctoredSessionController, QuestionSource,
};
use tokio::time::{self, Instant};

fn questions(count: u64) -> Vec<Question> {
    (1..=count)
        .map(|id| {
            Question::new(
                QuestionId::new(id),
                format!("Question {id}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                None,
            )
            .unwrap()
        })
        .collect()
}

/// Serves `count` questions; fails the first `failures` calls.
struct FixedSource {
    count: u64,
    failures: usize,
    calls: AtomicUsize,
}

impl FixedSource {
    fn new(count: u64) -> Self {
        Self {
            count,
            failures: 0,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_first(count: u64, failures: usize) -> Self {
        Self {
            failures,
            ..Self::new(count)
        }
    }
}

#[async_trait]
impl QuestionSource for FixedSource {
    async fn start_session(
        &self,
        _skill: &str,
        _level: SkillLevel,
    ) -> Result<LoadedSession, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(GenerationError::Rejected("generator offline".into()));
        }
        Ok(LoadedSession {
            session_id: SessionId::new(42),
            questions: questions(self.count),
        })
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Score(f64),
    Fail,
    Delay(Duration, f64),
    Hang,
}

/// Records every payload it is asked to grade.
#[derive(Clone)]
struct RecordingGrader {
    behavior: Behavior,
    payloads: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl RecordingGrader {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    fn only_payload(&self) -> SubmissionPayload {
        let payloads = self.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1, "expected exactly one submission");
        payloads[0].clone()
    }
}

fn report(score: f64, payload: &SubmissionPayload) -> GradeReport {
    GradeReport {
        score,
        correct_count: 0,
        total_count: u32::try_from(payload.answers.len()).unwrap(),
        tab_switches: None,
        level_awarded: None,
        details: Vec::new(),
    }
}

#[async_trait]
impl GradingService for RecordingGrader {
    async fn submit_session(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<GradeReport, GradingError> {
        self.payloads.lock().unwrap().push(payload.clone());
        match self.behavior {
            Behavior::Score(score) => Ok(report(score, payload)),
            Behavior::Fail => Err(GradingError::Rejected("grader down".into())),
            Behavior::Delay(delay, score) => {
                time::sleep(delay).await;
                Ok(report(score, payload))
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn controller(
    source: FixedSource,
    grader: &RecordingGrader,
    config: SessionConfig,
) -> ProctoredSessionController {
    ProctoredSessionController::new(Arc::new(source), Arc::new(grader.clone()), config)
        .unwrap()
        .with_clock(fixed_clock())
}

#[tokio::test(start_paused = true)]
async fn timer_expiry_submits_every_question() {
    let grader = RecordingGrader::new(Behavior::Score(72.5));
    let controller = controller(FixedSource::new(10), &grader, SessionConfig::node_assessment());
    let handle = controller.start("JavaScript", SkillLevel::Beginner);

    handle.wait_for_phase(Phase::Active).await.unwrap();
    for option in 0..9 {
        handle.select(option % 4).unwrap();
        handle.next().unwrap();
    }

    let done = handle.finished().await.unwrap();
    assert_eq!(done.phase(), Phase::Result);
    assert_eq!(done.submit_trigger(), Some(SubmitTrigger::TimeExpired));
    assert_eq!(done.time_remaining(), Some(0));

    let payload = grader.only_payload();
    assert_eq!(payload.answers.len(), 10);
    for (index, entry) in payload.answers.iter().take(9).enumerate() {
        assert_eq!(entry.selection, Selection::Chosen(index % 4));
    }
    assert_eq!(payload.answers[9].selection, Selection::NoAnswer);
    assert_eq!(payload.answers[9].selection.wire_value(), -1);

    let result = done.result().unwrap();
    assert!(result.passed());
    assert!(!result.is_degraded());
}

#[tokio::test(start_paused = true)]
async fn strike_limit_locks_and_submits() {
    let grader = RecordingGrader::new(Behavior::Score(80.0));
    let controller = controller(FixedSource::new(5), &grader, SessionConfig::node_assessment());
    let handle = controller.start("HTML", SkillLevel::Beginner);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    let mut updates = handle.subscribe();
    handle.focus_lost().unwrap();
    let warned = updates.wait_for(|s| s.strike_count() == 1).await.unwrap().clone();
    assert_eq!(warned.warning(), WarningLevel::First);

    handle.focus_lost().unwrap();
    let warned = updates.wait_for(|s| s.strike_count() == 2).await.unwrap().clone();
    assert_eq!(warned.warning(), WarningLevel::Final);
    assert_eq!(warned.phase(), Phase::Active);

    handle.focus_lost().unwrap();
    handle.select(1).unwrap();

    let done = handle.finished().await.unwrap();
    assert_eq!(done.submit_trigger(), Some(SubmitTrigger::StrikeLimit));
    assert!(done.is_locked());
    assert_eq!(done.strike_count(), 3);
    assert!(!done.answers().is_answered(0));

    let payload = grader.only_payload();
    assert_eq!(payload.tab_switches, 3);
    assert_eq!(payload.answers.len(), 5);
    assert!(done.result().unwrap().tab_violation());
}

#[tokio::test(start_paused = true)]
async fn grading_error_yields_zero_score() {
    let grader = RecordingGrader::new(Behavior::Fail);
    let controller = controller(FixedSource::new(4), &grader, SessionConfig::onboarding());
    let handle = controller.start("Python", SkillLevel::Intermediate);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    handle.select(0).unwrap();
    handle.submit().unwrap();

    let done = handle.finished().await.unwrap();
    let result = done.result().unwrap();
    assert!(result.is_degraded());
    assert!(result.score().abs() < f64::EPSILON);
    assert_eq!(result.correct_count(), 0);
    assert_eq!(result.total_count(), 4);
    assert!(!result.passed());
    assert_eq!(done.submit_trigger(), Some(SubmitTrigger::Manual));
}

#[tokio::test(start_paused = true)]
async fn repeated_submit_grades_once() {
    let grader = RecordingGrader::new(Behavior::Delay(Duration::from_secs(5), 90.0));
    let controller = controller(FixedSource::new(3), &grader, SessionConfig::node_assessment());
    let handle = controller.start("SQL", SkillLevel::Beginner);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    handle.submit().unwrap();
    handle.submit().unwrap();
    handle.focus_lost().unwrap();
    handle.wait_for_phase(Phase::Submitting).await.unwrap();
    handle.submit().unwrap();

    let done = handle.finished().await.unwrap();
    assert_eq!(grader.calls(), 1);
    assert_eq!(done.strike_count(), 0);
    assert!((done.result().unwrap().score() - 90.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn grading_timeout_takes_degraded_path() {
    let grader = RecordingGrader::new(Behavior::Hang);
    let controller = controller(FixedSource::new(2), &grader, SessionConfig::node_assessment())
        .with_request_timeout(Duration::from_secs(30));
    let handle = controller.start("Go", SkillLevel::Advanced);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    let submitted_at = Instant::now();
    handle.submit().unwrap();
    let done = handle.finished().await.unwrap();

    assert!(submitted_at.elapsed() >= Duration::from_secs(30));
    assert!(done.result().unwrap().is_degraded());
    assert_eq!(grader.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn countdown_freezes_while_grading() {
    let grader = RecordingGrader::new(Behavior::Delay(Duration::from_secs(20), 50.0));
    let controller = controller(FixedSource::new(2), &grader, SessionConfig::node_assessment());
    let handle = controller.start("CSS", SkillLevel::Beginner);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    time::sleep(Duration::from_millis(10_500)).await;
    let before = handle.snapshot().time_remaining().unwrap();
    assert_eq!(before, 890);

    handle.submit().unwrap();
    let done = handle.finished().await.unwrap();
    assert_eq!(done.time_remaining(), Some(before));
}

#[tokio::test(start_paused = true)]
async fn dispose_discards_late_grading() {
    let grader = RecordingGrader::new(Behavior::Delay(Duration::from_secs(10), 100.0));
    let controller = controller(FixedSource::new(3), &grader, SessionConfig::node_assessment());
    let handle = controller.start("Rust", SkillLevel::Beginner);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    handle.submit().unwrap();
    handle.wait_for_phase(Phase::Submitting).await.unwrap();
    handle.dispose().unwrap();

    let done = handle.finished().await.unwrap();
    assert!(done.is_disposed());
    assert!(done.result().is_none());

    time::sleep(Duration::from_secs(20)).await;
    assert!(handle.snapshot().result().is_none());
    assert!(handle.select(0).is_err());
}

#[tokio::test(start_paused = true)]
async fn load_failure_can_be_retried() {
    let grader = RecordingGrader::new(Behavior::Score(10.0));
    let controller = controller(
        FixedSource::failing_first(3, 1),
        &grader,
        SessionConfig::node_assessment(),
    );
    let handle = controller.start("Java", SkillLevel::Beginner);

    let failed = handle.wait_for_phase(Phase::Failed).await.unwrap();
    assert!(failed.failure().unwrap().contains("generator offline"));
    assert_eq!(failed.time_remaining(), Some(900));

    handle.retry().unwrap();
    let active = handle.wait_for_phase(Phase::Active).await.unwrap();
    assert_eq!(active.questions().len(), 3);
    assert!(active.failure().is_none());
}

#[tokio::test(start_paused = true)]
async fn empty_question_list_fails_the_load() {
    let grader = RecordingGrader::new(Behavior::Score(10.0));
    let controller = controller(FixedSource::new(0), &grader, SessionConfig::node_assessment());
    let handle = controller.start("Kotlin", SkillLevel::Beginner);

    let failed = handle.wait_for_phase(Phase::Failed).await.unwrap();
    assert_eq!(failed.failure(), Some(NO_QUESTIONS));
    assert!(!failed.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn unproctored_session_ignores_focus_and_time() {
    let grader = RecordingGrader::new(Behavior::Score(65.0));
    let controller = controller(FixedSource::new(2), &grader, SessionConfig::unproctored());
    let handle = controller.start("Docker", SkillLevel::Beginner);
    handle.wait_for_phase(Phase::Active).await.unwrap();

    handle.focus_lost().unwrap();
    time::sleep(Duration::from_secs(2_000)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase(), Phase::Active);
    assert_eq!(snapshot.strike_count(), 0);
    assert_eq!(snapshot.time_remaining(), None);

    handle.submit().unwrap();
    let done = handle.finished().await.unwrap();
    assert!(done.result().unwrap().passed());
}

#[tokio::test(start_paused = true)]
async fn same_answers_grade_the_same() {
    let api = InMemoryAssessmentApi::demo().with_clock(fixed_clock());
    let controller = ProctoredSessionController::new(
        Arc::new(api.clone()),
        Arc::new(api),
        SessionConfig::node_assessment(),
    )
    .unwrap();

    let mut scores = Vec::new();
    for _ in 0..2 {
        let handle = controller.start("html", SkillLevel::Beginner);
        handle.wait_for_phase(Phase::Active).await.unwrap();
        handle.select(2).unwrap();
        handle.next().unwrap();
        handle.select(0).unwrap();
        handle.submit().unwrap();
        let done = handle.finished().await.unwrap();
        scores.push(done.result().unwrap().score());
    }

    assert!((scores[0] - 50.0).abs() < f64::EPSILON);
    assert!((scores[0] - scores[1]).abs() < f64::EPSILON);
}
