use thiserror::Error;

use crate::model::QuestionId;

/// Fewest choices a multiple-choice question may carry.
pub const MIN_OPTIONS: usize = 2;

/// Most choices a question may carry, one per letter `a` to `z`.
pub const MAX_OPTIONS: usize = 26;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has {count} options, at least 2 are required")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} has {count} options, at most 26 are allowed")]
    TooManyOptions { id: QuestionId, count: usize },

    #[error("question {id} has a blank option at position {index}")]
    BlankOption { id: QuestionId, index: usize },
}

/// A multiple-choice question as served by the question source.
///
/// Questions never carry their correct answer; grading happens remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    code_snippet: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// A blank `code_snippet` is treated as absent, since the source sends `""`
    /// for questions without code.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, when the option count
    /// falls outside `MIN_OPTIONS..=MAX_OPTIONS`, or when any option is blank.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        code_snippet: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                id,
                count: options.len(),
            });
        }
        if options.len() > MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions {
                id,
                count: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::BlankOption { id, index });
        }

        Ok(Self {
            id,
            prompt,
            options,
            code_snippet: code_snippet.filter(|code| !code.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn code_snippet(&self) -> Option<&str> {
        self.code_snippet.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn blank_snippet_is_dropped() {
        let q = Question::new(
            QuestionId::new(1),
            "Which keyword declares a block-scoped variable?",
            opts(&["var", "let", "const", "static"]),
            Some("   ".into()),
        )
        .unwrap();
        assert_eq!(q.code_snippet(), None);
        assert_eq!(q.option(1), Some("let"));
        assert_eq!(q.option(4), None);
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::new(QuestionId::new(3), "Pick one", opts(&["only"]), None).unwrap_err();
        assert_eq!(
            err,
            QuestionError::TooFewOptions {
                id: QuestionId::new(3),
                count: 1
            }
        );
    }

    #[test]
    fn rejects_options_past_the_alphabet() {
        let options: Vec<String> = (0..=MAX_OPTIONS).map(|n| format!("choice {n}")).collect();
        assert_eq!(
            Question::new(QuestionId::new(4), "Pick one", options.clone(), None),
            Err(QuestionError::TooManyOptions {
                id: QuestionId::new(4),
                count: 27
            })
        );
        let q = Question::new(
            QuestionId::new(4),
            "Pick one",
            options[..MAX_OPTIONS].to_vec(),
            None,
        )
        .unwrap();
        assert_eq!(q.option_count(), MAX_OPTIONS);
    }

    #[test]
    fn rejects_blank_prompt_and_option() {
        assert!(matches!(
            Question::new(QuestionId::new(1), " ", opts(&["a", "b"]), None),
            Err(QuestionError::EmptyPrompt { .. })
        ));
        assert!(matches!(
            Question::new(QuestionId::new(1), "Q", opts(&["a", ""]), None),
            Err(QuestionError::BlankOption { index: 1, .. })
        ));
    }
}
