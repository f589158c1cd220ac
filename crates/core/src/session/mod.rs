//! The proctored session state machine.
//!
//! Timer ticks, focus losses and user actions all arrive as `Message`s and go
//! through one reducer, `SessionState::apply`. Network work comes back out as
//! `Effect`s for the driver to run.

mod message;
mod state;

pub use message::{Effect, Message, Navigation, SubmitTrigger};
pub use state::{EXIT_WARNING, NO_QUESTIONS, Phase, Rejection, SessionState};
