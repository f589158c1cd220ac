/// Remaining time below which the clock is shown as urgent.
pub const URGENT_BELOW_SECS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is stopped; nothing changed.
    Idle,
    Running { remaining: u32 },
    /// Reached zero on this tick. Reported once.
    Expired,
}

/// One-second countdown for a session.
///
/// Only ticks between `start` and `stop`; expiring stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(budget_secs: u32) -> Self {
        Self {
            remaining: budget_secs,
            running: false,
        }
    }

    /// Start ticking. An exhausted countdown stays stopped.
    pub fn start(&mut self) {
        self.running = self.remaining > 0;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
            }
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.remaining < URGENT_BELOW_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_tick_before_start() {
        let mut countdown = Countdown::new(5);
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 5);
    }

    #[test]
    fn expires_once() {
        let mut countdown = Countdown::new(2);
        countdown.start();
        assert_eq!(countdown.tick(), TickOutcome::Running { remaining: 1 });
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());

        countdown.start();
        assert!(!countdown.is_running());
    }

    #[test]
    fn stop_freezes_remaining() {
        let mut countdown = Countdown::new(900);
        countdown.start();
        countdown.tick();
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 899);
    }

    #[test]
    fn urgent_under_two_minutes() {
        assert!(!Countdown::new(120).is_urgent());
        assert!(Countdown::new(119).is_urgent());
    }
}
