use proctor_core::model::Question;
use proctor_core::{Phase, SessionState, WarningLevel};

use crate::vm::time_fmt::format_clock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub label: char,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub prompt: String,
    pub code_snippet: Option<String>,
    pub options: Vec<OptionVm>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteState {
    Current,
    Answered,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteCell {
    pub number: usize,
    pub state: PaletteState,
}

/// Advisory shown after a focus loss.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarningVm {
    pub headline: &'static str,
    pub subtitle: &'static str,
    pub label: String,
    pub is_final: bool,
}

impl WarningVm {
    fn from_level(level: WarningLevel, count: u32, limit: u32) -> Option<Self> {
        let label = format!("{count} of {limit} warnings");
        match level {
            WarningLevel::None => None,
            WarningLevel::First => Some(Self {
                headline: "We Caught You",
                subtitle: "Focus loss detected. Next switch is the final warning.",
                label,
                is_final: false,
            }),
            WarningLevel::Final => Some(Self {
                headline: "Last Chance",
                subtitle: "One more switch and your assessment auto-submits.",
                label,
                is_final: true,
            }),
        }
    }
}

/// Everything the in-progress screen shows, derived from one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssessmentVm {
    pub skill: String,
    pub level: &'static str,
    pub phase: Phase,
    pub proctored: bool,
    pub clock: Option<String>,
    pub clock_urgent: bool,
    pub counter: String,
    pub question: Option<QuestionVm>,
    pub answered: usize,
    pub total: usize,
    pub palette: Vec<PaletteCell>,
    pub strikes: Option<String>,
    pub warning: Option<WarningVm>,
    pub locked: bool,
    pub failure: Option<String>,
    pub exit_warning: Option<&'static str>,
}

impl AssessmentVm {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        let total = state.questions().len();
        let current = state.current_index();
        let answers = state.answers();

        let question = state
            .current_question()
            .map(|q| question_vm(q, answers.selection(current)));

        let palette = (0..total)
            .map(|index| PaletteCell {
                number: index + 1,
                state: if index == current {
                    PaletteState::Current
                } else if answers.is_answered(index) {
                    PaletteState::Answered
                } else {
                    PaletteState::Pending
                },
            })
            .collect();

        let warning = state.strike_limit().and_then(|limit| {
            WarningVm::from_level(state.warning(), state.strike_count(), limit)
        });

        Self {
            skill: state.skill().to_string(),
            level: state.level().as_str(),
            phase: state.phase(),
            proctored: state.config().strike_limit().is_some(),
            clock: state.time_remaining().map(format_clock),
            clock_urgent: state.is_time_urgent(),
            counter: if total == 0 {
                String::new()
            } else {
                format!("{:02} / {total:02}", current + 1)
            },
            question,
            answered: answers.answered_count(),
            total,
            palette,
            strikes: state
                .strike_limit()
                .map(|limit| format!("{}/{limit}", state.strike_count())),
            warning,
            locked: state.is_locked(),
            failure: state.failure().map(str::to_string),
            exit_warning: state.exit_warning(),
        }
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.total > 0
            && self
                .palette
                .last()
                .is_some_and(|cell| cell.state == PaletteState::Current)
    }
}

fn question_vm(question: &Question, selected: Option<usize>) -> QuestionVm {
    QuestionVm {
        prompt: question.prompt().to_string(),
        code_snippet: question.code_snippet().map(str::to_string),
        options: question
            .options()
            .iter()
            // `Question` caps options at `MAX_OPTIONS`, one per letter.
            .zip('A'..='Z')
            .enumerate()
            .map(|(index, (text, label))| OptionVm {
                label,
                text: text.clone(),
                selected: selected == Some(index),
            })
            .collect(),
    }
}
