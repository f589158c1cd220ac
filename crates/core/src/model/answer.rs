use std::collections::BTreeMap;

use crate::model::{Question, QuestionId, SessionId};

/// Wire value sent for a question the user never answered.
pub const NO_ANSWER: i64 = -1;

/// What the user picked for one question at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Chosen(usize),
    NoAnswer,
}

impl Selection {
    /// Integer form the grading service expects; `NO_ANSWER` for skipped questions.
    #[must_use]
    pub fn wire_value(self) -> i64 {
        match self {
            Selection::Chosen(index) => i64::try_from(index).unwrap_or(NO_ANSWER),
            Selection::NoAnswer => NO_ANSWER,
        }
    }
}

/// Latest selection per question index. Overwrites, never keeps history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: BTreeMap<usize, usize>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for the question at `index`, returning the replaced selection.
    pub fn record(&mut self, index: usize, option: usize) -> Option<usize> {
        self.selections.insert(index, option)
    }

    #[must_use]
    pub fn selection(&self, index: usize) -> Option<usize> {
        self.selections.get(&index).copied()
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.selections.contains_key(&index)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    /// One entry per question, in question order, with `Selection::NoAnswer`
    /// for every index that was never recorded.
    #[must_use]
    pub fn entries_for(&self, questions: &[Question]) -> Vec<AnswerEntry> {
        questions
            .iter()
            .enumerate()
            .map(|(index, question)| AnswerEntry {
                question_id: question.id(),
                selection: self
                    .selection(index)
                    .map_or(Selection::NoAnswer, Selection::Chosen),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    pub selection: Selection,
}

/// Everything the grading service needs for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub session_id: SessionId,
    pub answers: Vec<AnswerEntry>,
    pub tab_switches: u32,
}

impl SubmissionPayload {
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|entry| matches!(entry.selection, Selection::Chosen(_)))
            .count()
    }
}
