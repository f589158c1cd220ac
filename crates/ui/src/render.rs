//! Plain-text rendering of the view-models for terminal output.

use std::fmt::Write as _;

use proctor_core::Phase;

use crate::vm::{AssessmentVm, HistoryRowVm, PaletteState, ResultVm};

/// Commands the terminal driver understands, shown under every question.
pub const COMMAND_HELP: &str =
    "[a-z] select  n next  p previous  g<N> jump  s submit  blur focus loss  q quit";

#[must_use]
pub fn render_assessment(vm: &AssessmentVm) -> String {
    let mut out = String::new();
    let badge = if vm.proctored { "  [PROCTORED]" } else { "" };
    let _ = writeln!(out, "{} ({}){badge}", vm.skill, vm.level);

    match vm.phase {
        Phase::Loading => {
            out.push_str("Loading questions...\n");
            return out;
        }
        Phase::Failed => {
            let reason = vm.failure.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Could not load the assessment: {reason}");
            out.push_str("Type `retry` to try again or `q` to quit.\n");
            return out;
        }
        Phase::Submitting => {
            out.push_str("Submitting your answers...\n");
            return out;
        }
        Phase::Active | Phase::Result => {}
    }

    let mut status = vec![format!("Question {}", vm.counter)];
    if let Some(clock) = &vm.clock {
        let marker = if vm.clock_urgent { " !" } else { "" };
        status.push(format!("Time {clock}{marker}"));
    }
    if let Some(strikes) = &vm.strikes {
        status.push(format!("Strikes {strikes}"));
    }
    status.push(format!("Answered {}/{}", vm.answered, vm.total));
    let _ = writeln!(out, "{}", status.join("  |  "));

    let palette: Vec<String> = vm
        .palette
        .iter()
        .map(|cell| match cell.state {
            PaletteState::Current => format!("[{}]", cell.number),
            PaletteState::Answered => format!("*{}", cell.number),
            PaletteState::Pending => cell.number.to_string(),
        })
        .collect();
    let _ = writeln!(out, "{}", palette.join(" "));

    if let Some(warning) = &vm.warning {
        let _ = writeln!(
            out,
            "\n!! {} ({}): {}",
            warning.headline, warning.label, warning.subtitle
        );
    }
    if vm.locked {
        out.push_str("\nSession locked. Answers can no longer change.\n");
    }

    if let Some(question) = &vm.question {
        let _ = writeln!(out, "\n{}", question.prompt);
        if let Some(snippet) = &question.code_snippet {
            for line in snippet.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        out.push('\n');
        for option in &question.options {
            let mark = if option.selected { '>' } else { ' ' };
            let _ = writeln!(out, "{mark} {}) {}", option.label.to_ascii_lowercase(), option.text);
        }
    }

    if vm.phase == Phase::Active && vm.is_last_question() {
        out.push_str("\nLast question. Type `s` to submit.\n");
    }
    let _ = writeln!(out, "\n{COMMAND_HELP}");
    out
}

#[must_use]
pub fn render_result(vm: &ResultVm) -> String {
    let mut out = String::new();
    out.push_str("Assessment complete!\n");
    let _ = writeln!(out, "You scored {} on {}", vm.score_text, vm.skill);
    let _ = writeln!(out, "Skill level awarded: {}", vm.level_awarded);
    let _ = writeln!(out, "{}", vm.verdict.message());
    if let Some(note) = vm.note {
        let _ = writeln!(out, "({note})");
    }
    let violation = if vm.tab_violation { " (limit reached)" } else { "" };
    let _ = writeln!(
        out,
        "\nScore {}  |  Correct {}  |  Tab switches {}{violation}",
        vm.score_text, vm.correct_text, vm.tab_switches
    );

    if !vm.feedback.is_empty() {
        out.push('\n');
    }
    for item in &vm.feedback {
        let mark = if item.is_correct { "ok" } else { "x " };
        let _ = writeln!(out, "{mark} {}. {}", item.number, item.prompt);
        let _ = writeln!(
            out,
            "     your answer: {}  |  correct: {}",
            item.your_answer, item.correct_answer
        );
        if let Some(explanation) = &item.explanation {
            let _ = writeln!(out, "     {explanation}");
        }
    }
    out
}

#[must_use]
pub fn render_history(rows: &[HistoryRowVm]) -> String {
    if rows.is_empty() {
        return "No completed assessments yet.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "#{:<5} {:<16} {:<12} {:>5}  {:>6}  switches {}  {}  {}",
            row.id,
            row.skill,
            row.level,
            row.score_text,
            row.correct_text,
            row.tab_switches,
            row.status,
            row.completed_at_str.as_deref().unwrap_or(&row.started_at_str),
        );
    }
    out
}
