use crate::model::{QuestionId, SkillLevel};

/// Per-question feedback returned by the grading service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFeedback {
    pub question_id: QuestionId,
    pub prompt: String,
    /// The chosen option text, or `None` when the question was skipped.
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Raw grading outcome as reported by the grading service.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub score: f64,
    pub correct_count: u32,
    pub total_count: u32,
    pub tab_switches: Option<u32>,
    pub level_awarded: Option<SkillLevel>,
    pub details: Vec<QuestionFeedback>,
}

/// Outcome shown on the result screen once a session terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    score: f64,
    correct_count: u32,
    total_count: u32,
    passed: bool,
    tab_switches: u32,
    tab_violation: bool,
    level_awarded: SkillLevel,
    details: Vec<QuestionFeedback>,
    degraded: bool,
}

impl SubmissionResult {
    /// Derive the displayed result from a grading report.
    ///
    /// `passed` is computed locally against `pass_threshold`; the score is
    /// clamped into `0..=100` and a non-finite score counts as zero.
    #[must_use]
    pub fn from_report(
        report: GradeReport,
        pass_threshold: f64,
        tab_switches_sent: u32,
        strike_limit: Option<u32>,
    ) -> Self {
        let score = if report.score.is_finite() {
            report.score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let tab_switches = report.tab_switches.unwrap_or(tab_switches_sent);

        Self {
            score,
            correct_count: report.correct_count,
            total_count: report.total_count,
            passed: score >= pass_threshold,
            tab_switches,
            tab_violation: is_violation(tab_switches, strike_limit),
            level_awarded: report
                .level_awarded
                .unwrap_or_else(|| SkillLevel::from_score(score)),
            details: report.details,
            degraded: false,
        }
    }

    /// Zero-score result synthesized locally when grading fails, so the
    /// session still terminates.
    #[must_use]
    pub fn degraded(total_count: u32, tab_switches: u32, strike_limit: Option<u32>) -> Self {
        Self {
            score: 0.0,
            correct_count: 0,
            total_count,
            passed: false,
            tab_switches,
            tab_violation: is_violation(tab_switches, strike_limit),
            level_awarded: SkillLevel::Beginner,
            details: Vec::new(),
            degraded: true,
        }
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn tab_switches(&self) -> u32 {
        self.tab_switches
    }

    #[must_use]
    pub fn tab_violation(&self) -> bool {
        self.tab_violation
    }

    #[must_use]
    pub fn level_awarded(&self) -> SkillLevel {
        self.level_awarded
    }

    #[must_use]
    pub fn details(&self) -> &[QuestionFeedback] {
        &self.details
    }

    /// True when this result was synthesized after a grading failure.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

fn is_violation(tab_switches: u32, strike_limit: Option<u32>) -> bool {
    strike_limit.is_some_and(|limit| tab_switches >= limit)
}
