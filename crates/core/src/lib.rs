#![forbid(unsafe_code)]

pub mod config;
pub mod model;
pub mod session;
pub mod strikes;
pub mod time;
pub mod timer;

pub use config::{ConfigError, SessionConfig};
pub use session::{Effect, Message, Navigation, Phase, Rejection, SessionState, SubmitTrigger};
pub use strikes::{StrikeMonitor, WarningLevel};
pub use time::Clock;
pub use timer::Countdown;
