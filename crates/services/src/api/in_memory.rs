use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proctor_core::Clock;
use proctor_core::model::{
    GradeReport, Question, QuestionFeedback, QuestionId, Selection, SessionId, SkillLevel,
    SubmissionPayload,
};

use super::{
    AssessmentHistory, AssessmentRecord, AssessmentStatus, GradingService, LoadedSession,
    QuestionSource,
};
use crate::error::{GenerationError, GradingError, HistoryError};

pub const DEFAULT_QUESTIONS_PER_SESSION: usize = 10;

/// A bank entry: the question as shown plus its answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankQuestion {
    pub skill: String,
    pub question: Question,
    pub correct_index: usize,
    pub explanation: Option<String>,
}

impl BankQuestion {
    fn correct_text(&self) -> String {
        self.question
            .option(self.correct_index)
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug)]
struct StoredSession {
    skill: String,
    level: SkillLevel,
    question_slots: Vec<usize>,
    started_at: DateTime<Utc>,
    graded: Option<GradedSession>,
}

#[derive(Debug)]
struct GradedSession {
    score: f64,
    correct: u32,
    tab_switches: u32,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    sessions: BTreeMap<u64, StoredSession>,
}

/// Question source and grader backed by a fixed question bank.
///
/// Deterministic: the same bank and answers always produce the same report.
#[derive(Clone, Debug)]
pub struct InMemoryAssessmentApi {
    bank: Arc<[BankQuestion]>,
    store: Arc<Mutex<Store>>,
    questions_per_session: usize,
    clock: Clock,
}

impl InMemoryAssessmentApi {
    #[must_use]
    pub fn new(bank: Vec<BankQuestion>) -> Self {
        Self {
            bank: bank.into(),
            store: Arc::new(Mutex::new(Store::default())),
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            clock: Clock::default(),
        }
    }

    /// A small built-in bank for offline runs.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo_bank())
    }

    #[must_use]
    pub fn with_questions_per_session(mut self, count: usize) -> Self {
        self.questions_per_session = count.max(1);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Bank positions for `skill`, or the whole bank when nothing matches.
    fn slots_for(&self, skill: &str) -> Vec<usize> {
        let matching: Vec<usize> = self
            .bank
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.skill.eq_ignore_ascii_case(skill))
            .map(|(slot, _)| slot)
            .collect();
        let slots = if matching.is_empty() {
            (0..self.bank.len()).collect()
        } else {
            matching
        };
        slots.into_iter().take(self.questions_per_session).collect()
    }

    fn grade(&self, slots: &[usize], payload: &SubmissionPayload) -> GradeReport {
        let mut details = Vec::with_capacity(slots.len());
        let mut correct = 0_u32;
        for &slot in slots {
            let entry = &self.bank[slot];
            let selection = payload
                .answers
                .iter()
                .find(|answer| answer.question_id == entry.question.id())
                .map_or(Selection::NoAnswer, |answer| answer.selection);
            let is_correct = selection == Selection::Chosen(entry.correct_index);
            if is_correct {
                correct += 1;
            }
            let your_answer = match selection {
                Selection::Chosen(index) => entry.question.option(index).map(str::to_string),
                Selection::NoAnswer => None,
            };
            details.push(QuestionFeedback {
                question_id: entry.question.id(),
                prompt: entry.question.prompt().to_string(),
                your_answer,
                correct_answer: entry.correct_text(),
                is_correct,
                explanation: entry.explanation.clone(),
            });
        }

        let total = u32::try_from(slots.len()).unwrap_or(u32::MAX);
        let score = if total == 0 {
            0.0
        } else {
            (f64::from(correct) / f64::from(total) * 1000.0).round() / 10.0
        };
        GradeReport {
            score,
            correct_count: correct,
            total_count: total,
            tab_switches: Some(payload.tab_switches),
            level_awarded: Some(SkillLevel::from_score(score)),
            details,
        }
    }
}

#[async_trait]
impl QuestionSource for InMemoryAssessmentApi {
    async fn start_session(
        &self,
        skill: &str,
        level: SkillLevel,
    ) -> Result<LoadedSession, GenerationError> {
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(GenerationError::Rejected("skill is required.".into()));
        }
        let slots = self.slots_for(skill);
        let questions = slots
            .iter()
            .map(|&slot| self.bank[slot].question.clone())
            .collect();

        let mut store = self
            .store
            .lock()
            .map_err(|e| GenerationError::Aborted(e.to_string()))?;
        store.next_id += 1;
        let id = store.next_id;
        store.sessions.insert(
            id,
            StoredSession {
                skill: skill.to_string(),
                level,
                question_slots: slots,
                started_at: self.clock.now(),
                graded: None,
            },
        );
        Ok(LoadedSession {
            session_id: SessionId::new(id),
            questions,
        })
    }
}

#[async_trait]
impl GradingService for InMemoryAssessmentApi {
    async fn submit_session(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<GradeReport, GradingError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| GradingError::Aborted(e.to_string()))?;
        let session = store
            .sessions
            .get_mut(&payload.session_id.value())
            .ok_or_else(|| GradingError::Rejected("Session not found.".into()))?;
        if session.graded.is_some() {
            return Err(GradingError::Rejected("Assessment already submitted.".into()));
        }

        let report = self.grade(&session.question_slots, payload);
        session.graded = Some(GradedSession {
            score: report.score,
            correct: report.correct_count,
            tab_switches: payload.tab_switches,
            completed_at: self.clock.now(),
        });
        Ok(report)
    }
}

fn to_record(id: u64, session: &StoredSession) -> AssessmentRecord {
    let total = u32::try_from(session.question_slots.len()).unwrap_or(u32::MAX);
    let (status, score, correct, tab_switches, completed_at) = match &session.graded {
        Some(graded) => (
            AssessmentStatus::Completed,
            Some(graded.score),
            graded.correct,
            graded.tab_switches,
            Some(graded.completed_at),
        ),
        None => (AssessmentStatus::InProgress, None, 0, 0, None),
    };
    AssessmentRecord {
        id: SessionId::new(id),
        skill: session.skill.clone(),
        level: session.level,
        score,
        total_questions: total,
        correct_answers: correct,
        tab_switches,
        status,
        started_at: session.started_at,
        completed_at,
    }
}

#[async_trait]
impl AssessmentHistory for InMemoryAssessmentApi {
    async fn history(&self) -> Result<Vec<AssessmentRecord>, HistoryError> {
        let store = self
            .store
            .lock()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        Ok(store
            .sessions
            .iter()
            .rev()
            .filter(|(_, session)| session.graded.is_some())
            .map(|(id, session)| to_record(*id, session))
            .collect())
    }

    async fn session_record(&self, id: SessionId) -> Result<AssessmentRecord, HistoryError> {
        let store = self
            .store
            .lock()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        store
            .sessions
            .get(&id.value())
            .map(|session| to_record(id.value(), session))
            .ok_or(HistoryError::NotFound(id.value()))
    }
}

fn demo_bank() -> Vec<BankQuestion> {
    let entries: [(&str, &str, &[&str], usize, Option<&str>); 3] = [
        (
            "html",
            "Which HTML element is used for the largest heading?",
            &["<head>", "<h6>", "<h1>", "<heading>"],
            2,
            None,
        ),
        (
            "html",
            "What is the correct HTML for creating a hyperlink?",
            &[
                "<a>http://google.com</a>",
                "<a href='http://google.com'>Google</a>",
                "<a name='http://google.com'>Google</a>",
                "<a>Google</a>",
            ],
            1,
            None,
        ),
        (
            "javascript",
            "Which keyword is used to declare a block-scoped variable that can be reassigned?",
            &["var", "const", "let", "static"],
            2,
            Some("'let' allows reassignment and is block-scoped."),
        ),
    ];

    entries
        .into_iter()
        .zip(1_u64..)
        .filter_map(|((skill, prompt, options, correct_index, explanation), id)| {
            let options = options.iter().map(|o| (*o).to_string()).collect();
            Question::new(QuestionId::new(id), prompt, options, None)
                .ok()
                .map(|question| BankQuestion {
                    skill: skill.to_string(),
                    question,
                    correct_index,
                    explanation: explanation.map(str::to_string),
                })
        })
        .collect()
}
