use proctor_core::SessionState;
use proctor_core::model::{QuestionFeedback, SubmissionResult};

/// Score at or above which a passing attempt is `Excellent`.
pub const EXCELLENT_FROM: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Excellent,
    Passed,
    Foundations,
}

impl Verdict {
    #[must_use]
    pub fn classify(score: f64, passed: bool) -> Self {
        match (passed, score >= EXCELLENT_FROM) {
            (false, _) => Verdict::Foundations,
            (true, true) => Verdict::Excellent,
            (true, false) => Verdict::Passed,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent, skill verified!",
            Verdict::Passed => "Passed, roadmap calibrated to your level",
            Verdict::Foundations => "Your roadmap is set to build your foundations",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackVm {
    pub number: usize,
    pub prompt: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl FeedbackVm {
    fn new(number: usize, feedback: &QuestionFeedback) -> Self {
        Self {
            number,
            prompt: feedback.prompt.clone(),
            your_answer: feedback
                .your_answer
                .clone()
                .unwrap_or_else(|| "Skipped".to_string()),
            correct_answer: feedback.correct_answer.clone(),
            is_correct: feedback.is_correct,
            explanation: feedback.explanation.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultVm {
    pub skill: String,
    pub percent: u32,
    pub score_text: String,
    pub correct_text: String,
    pub tab_switches: u32,
    pub tab_violation: bool,
    pub passed: bool,
    pub verdict: Verdict,
    pub level_awarded: &'static str,
    pub note: Option<&'static str>,
    pub feedback: Vec<FeedbackVm>,
}

impl ResultVm {
    /// `None` until the session has a result.
    #[must_use]
    pub fn from_state(state: &SessionState) -> Option<Self> {
        state
            .result()
            .map(|result| Self::from_result(state.skill(), result))
    }

    #[must_use]
    pub fn from_result(skill: &str, result: &SubmissionResult) -> Self {
        let score = result.score();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = score.round().clamp(0.0, 100.0) as u32;

        Self {
            skill: skill.to_string(),
            percent,
            score_text: format!("{percent}%"),
            correct_text: format!("{}/{}", result.correct_count(), result.total_count()),
            tab_switches: result.tab_switches(),
            tab_violation: result.tab_violation(),
            passed: result.passed(),
            verdict: Verdict::classify(score, result.passed()),
            level_awarded: result.level_awarded().as_str(),
            note: result
                .is_degraded()
                .then_some("Grading was unavailable, so this is a best-effort result."),
            feedback: result
                .details()
                .iter()
                .enumerate()
                .map(|(index, feedback)| FeedbackVm::new(index + 1, feedback))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::{GradeReport, QuestionId, SkillLevel};

    fn graded(score: f64, threshold: f64) -> ResultVm {
        let report = GradeReport {
            score,
            correct_count: 7,
            total_count: 10,
            tab_switches: Some(1),
            level_awarded: None,
            details: vec![QuestionFeedback {
                question_id: QuestionId::new(1),
                prompt: "Largest heading?".into(),
                your_answer: None,
                correct_answer: "<h1>".into(),
                is_correct: false,
                explanation: None,
            }],
        };
        let result = SubmissionResult::from_report(report, threshold, 1, Some(3));
        ResultVm::from_result("HTML", &result)
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(Verdict::classify(80.0, true), Verdict::Excellent);
        assert_eq!(Verdict::classify(79.9, true), Verdict::Passed);
        assert_eq!(Verdict::classify(65.0, false), Verdict::Foundations);
        assert_eq!(Verdict::classify(95.0, false), Verdict::Foundations);
    }

    #[test]
    fn high_threshold_failure_is_not_excellent() {
        let vm = graded(85.0, 90.0);
        assert!(!vm.passed);
        assert_eq!(vm.verdict, Verdict::Foundations);
        assert_eq!(vm.verdict.message(), Verdict::Foundations.message());

        let vm = graded(92.0, 90.0);
        assert!(vm.passed);
        assert_eq!(vm.verdict, Verdict::Excellent);
    }

    #[test]
    fn maps_graded_result() {
        let vm = graded(72.4, 70.0);
        assert_eq!(vm.score_text, "72%");
        assert_eq!(vm.correct_text, "7/10");
        assert_eq!(vm.verdict, Verdict::Passed);
        assert_eq!(vm.level_awarded, SkillLevel::Advanced.as_str());
        assert!(vm.note.is_none());
        assert_eq!(vm.feedback[0].your_answer, "Skipped");
        assert!(!vm.tab_violation);
    }

    #[test]
    fn degraded_result_carries_note() {
        let result = SubmissionResult::degraded(5, 3, Some(3));
        let vm = ResultVm::from_result("Go", &result);
        assert_eq!(vm.score_text, "0%");
        assert_eq!(vm.correct_text, "0/5");
        assert_eq!(vm.verdict, Verdict::Foundations);
        assert!(vm.note.is_some());
        assert!(vm.tab_violation);
        assert!(!vm.passed);
    }
}
