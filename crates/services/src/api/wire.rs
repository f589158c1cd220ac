//! JSON shapes of the assessment REST API.

use chrono::{DateTime, Utc};
use proctor_core::model::{
    GradeReport, Question, QuestionError, QuestionFeedback, QuestionId, SessionId, SkillLevel,
    SubmissionPayload,
};
use serde::{Deserialize, Serialize};

use super::{AssessmentRecord, AssessmentStatus, LoadedSession};

/// Text the API uses in `your_answer` for a skipped question.
const SKIPPED: &str = "Skipped";

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub skill: &'a str,
    pub level: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    session_id: SessionId,
    questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    id: QuestionId,
    question_text: String,
    #[serde(default)]
    code_snippet: Option<String>,
    options: Vec<String>,
}

impl GenerateResponse {
    pub(crate) fn into_loaded(self) -> Result<LoadedSession, QuestionError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| Question::new(q.id, q.question_text, q.options, q.code_snippet))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LoadedSession {
            session_id: self.session_id,
            questions,
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct SubmitRequest {
    session_id: SessionId,
    answers: Vec<AnswerDto>,
    tab_switches: u32,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct AnswerDto {
    question_id: QuestionId,
    selected_option: i64,
}

impl From<&SubmissionPayload> for SubmitRequest {
    fn from(payload: &SubmissionPayload) -> Self {
        Self {
            session_id: payload.session_id,
            answers: payload
                .answers
                .iter()
                .map(|entry| AnswerDto {
                    question_id: entry.question_id,
                    selected_option: entry.selection.wire_value(),
                })
                .collect(),
            tab_switches: payload.tab_switches,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    score: f64,
    #[serde(default)]
    correct: u32,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    tab_switches: Option<u32>,
    #[serde(default)]
    level_awarded: Option<String>,
    #[serde(default)]
    details: Vec<DetailDto>,
}

#[derive(Debug, Deserialize)]
struct DetailDto {
    question_id: QuestionId,
    question: String,
    #[serde(default)]
    your_answer: Option<String>,
    #[serde(default)]
    correct_answer: String,
    is_correct: bool,
    #[serde(default)]
    explanation: String,
}

impl SubmitResponse {
    /// The API reports `total = 0` in some versions; fall back to the number
    /// of answers that were sent.
    pub(crate) fn into_report(self, answers_sent: usize) -> GradeReport {
        let total_count = if self.total > 0 {
            self.total
        } else {
            u32::try_from(answers_sent).unwrap_or(u32::MAX)
        };
        GradeReport {
            score: self.score,
            correct_count: self.correct,
            total_count,
            tab_switches: self.tab_switches,
            level_awarded: self
                .level_awarded
                .and_then(|raw| raw.parse::<SkillLevel>().ok()),
            details: self
                .details
                .into_iter()
                .map(|d| QuestionFeedback {
                    question_id: d.question_id,
                    prompt: d.question,
                    your_answer: d.your_answer.filter(|answer| answer != SKIPPED),
                    correct_answer: d.correct_answer,
                    is_correct: d.is_correct,
                    explanation: Some(d.explanation).filter(|e| !e.trim().is_empty()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordDto {
    id: SessionId,
    skill: String,
    level: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    correct_answers: u32,
    #[serde(default)]
    tab_switches: u32,
    status: String,
    started_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl From<RecordDto> for AssessmentRecord {
    fn from(dto: RecordDto) -> Self {
        let status = match dto.status.as_str() {
            "completed" => AssessmentStatus::Completed,
            "abandoned" => AssessmentStatus::Abandoned,
            _ => AssessmentStatus::InProgress,
        };
        Self {
            id: dto.id,
            skill: dto.skill,
            level: SkillLevel::normalize(&dto.level),
            score: dto.score,
            total_questions: dto.total_questions,
            correct_answers: dto.correct_answers,
            tab_switches: dto.tab_switches,
            status,
            started_at: dto.started_at,
            completed_at: dto.completed_at,
        }
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
