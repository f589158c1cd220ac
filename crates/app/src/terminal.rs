//! Line-oriented terminal front end for one session.

use std::io::Write as _;

use proctor_core::{Phase, SessionState};
use services::{ControllerError, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use ui::render::{render_assessment, render_result};
use ui::vm::{AssessmentVm, ResultVm};

/// Sent by terminals with focus reporting enabled when the window loses focus.
const FOCUS_OUT: &str = "\x1b[O";
const FOCUS_IN: &str = "\x1b[I";
const ENABLE_FOCUS_REPORTING: &str = "\x1b[?1004h";
const DISABLE_FOCUS_REPORTING: &str = "\x1b[?1004l";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Select(usize),
    Next,
    Previous,
    Jump(usize),
    Submit,
    FocusLost,
    Dismiss,
    Retry,
    Quit,
    Unrecognized,
}

/// Parse one line of user input. Each focus-out report in the line becomes a
/// `FocusLost`, followed by whatever command was typed alongside it.
#[must_use]
pub fn parse_input(line: &str) -> Vec<Input> {
    let mut inputs = vec![Input::FocusLost; line.matches(FOCUS_OUT).count()];
    let rest = line.replace(FOCUS_OUT, "").replace(FOCUS_IN, "");
    if !rest.trim().is_empty() {
        inputs.push(parse_command(&rest).unwrap_or(Input::Unrecognized));
    }
    inputs
}

/// Letters pick options, except the command letters `n`, `p`, `s`, `g` and `q`.
fn parse_command(text: &str) -> Option<Input> {
    let word = text.trim().to_ascii_lowercase();
    match word.as_str() {
        "n" | "next" => Some(Input::Next),
        "p" | "prev" | "previous" => Some(Input::Previous),
        "s" | "submit" => Some(Input::Submit),
        "blur" => Some(Input::FocusLost),
        "ok" | "dismiss" => Some(Input::Dismiss),
        "retry" => Some(Input::Retry),
        "q" | "quit" => Some(Input::Quit),
        _ => {
            if let Some(number) = word.strip_prefix('g') {
                let number: usize = number.trim().parse().ok()?;
                return number.checked_sub(1).map(Input::Jump);
            }
            let mut chars = word.chars();
            match (chars.next(), chars.next()) {
                (Some(letter @ 'a'..='z'), None) => {
                    Some(Input::Select(usize::from(letter as u8 - b'a')))
                }
                _ => None,
            }
        }
    }
}

fn apply(handle: &SessionHandle, input: Input) -> Result<(), ControllerError> {
    match input {
        Input::Select(option) => handle.select(option),
        Input::Next => handle.next(),
        Input::Previous => handle.previous(),
        Input::Jump(index) => handle.jump(index),
        Input::Submit => handle.submit(),
        Input::FocusLost => handle.focus_lost(),
        Input::Dismiss => handle.dismiss_warning(),
        Input::Retry => handle.retry(),
        Input::Quit | Input::Unrecognized => Ok(()),
    }
}

/// Everything but the clock, so ticks alone do not redraw the screen.
fn screen_key(vm: &AssessmentVm) -> AssessmentVm {
    AssessmentVm {
        clock: None,
        ..vm.clone()
    }
}

fn print(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Drive `handle` from stdin until the session ends. Returns the final state.
///
/// # Errors
///
/// Returns `ControllerError::Stopped` if the session driver goes away early.
pub async fn run_session(handle: SessionHandle) -> Result<SessionState, ControllerError> {
    let proctored = handle.snapshot().config().is_proctored();
    if proctored {
        print(ENABLE_FOCUS_REPORTING);
    }

    let outcome = interact(&handle).await;

    if proctored {
        print(DISABLE_FOCUS_REPORTING);
    }
    if let Ok(state) = &outcome {
        if let Some(vm) = ResultVm::from_state(state) {
            print(&format!("\n{}", render_result(&vm)));
        }
    }
    let _ = handle.dispose();
    outcome
}

async fn interact(handle: &SessionHandle) -> Result<SessionState, ControllerError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = handle.subscribe();
    let mut last_screen: Option<AssessmentVm> = None;
    let mut quit_armed = false;

    loop {
        let state = updates.borrow_and_update().clone();
        if state.is_finished() {
            return Ok(state);
        }

        let vm = AssessmentVm::from_state(&state);
        let key = screen_key(&vm);
        if last_screen.as_ref() != Some(&key) {
            print(&format!("\n{}", render_assessment(&vm)));
            last_screen = Some(key);
        }

        tokio::select! {
            changed = updates.changed() => {
                changed.map_err(|_| ControllerError::Stopped)?;
            }
            line = lines.next_line() => {
                let inputs = match line {
                    Ok(Some(line)) => parse_input(&line),
                    Ok(None) | Err(_) => vec![Input::Quit],
                };
                for input in inputs {
                    debug!(?input, "terminal input");
                    match input {
                        Input::Unrecognized => print("Unrecognized command.\n"),
                        Input::Quit => {
                            let state = handle.snapshot();
                            match state.phase() {
                                Phase::Active => {
                                    if quit_armed {
                                        handle.submit()?;
                                        return handle.finished().await;
                                    }
                                    if let Some(warning) = state.exit_warning() {
                                        print(&format!("{warning}\nType q again to leave.\n"));
                                    }
                                    quit_armed = true;
                                }
                                Phase::Submitting => return handle.finished().await,
                                Phase::Loading | Phase::Failed | Phase::Result => {
                                    handle.dispose()?;
                                    return handle.finished().await;
                                }
                            }
                        }
                        _ => {
                            quit_armed = false;
                            apply(handle, input)?;
                        }
                    }
                }
            }
        }
    }
}
