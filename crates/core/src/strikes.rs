/// Advisory warning shown after a focus loss. Not part of the grading payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningLevel {
    #[default]
    None,
    /// Soft warning after the first strike.
    First,
    /// One strike left before the session auto-submits.
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Monitor detached; the event was dropped.
    Ignored,
    Warned { count: u32, level: WarningLevel },
    LimitReached { count: u32 },
}

/// Counts focus losses while attached to an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeMonitor {
    count: u32,
    limit: u32,
    warning: WarningLevel,
    attached: bool,
}

impl StrikeMonitor {
    /// A detached monitor. `limit` is clamped to at least one.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            count: 0,
            limit: limit.max(1),
            warning: WarningLevel::None,
            attached: false,
        }
    }

    pub fn attach(&mut self) {
        self.attached = self.count < self.limit;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn record_focus_loss(&mut self) -> StrikeOutcome {
        if !self.attached {
            return StrikeOutcome::Ignored;
        }
        self.count += 1;
        if self.count >= self.limit {
            self.warning = WarningLevel::None;
            self.attached = false;
            return StrikeOutcome::LimitReached { count: self.count };
        }
        self.warning = if self.count + 1 == self.limit {
            WarningLevel::Final
        } else {
            WarningLevel::First
        };
        StrikeOutcome::Warned {
            count: self.count,
            level: self.warning,
        }
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = WarningLevel::None;
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn warning(&self) -> WarningLevel {
        self.warning
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_then_reaches_limit() {
        let mut monitor = StrikeMonitor::new(3);
        monitor.attach();

        assert_eq!(
            monitor.record_focus_loss(),
            StrikeOutcome::Warned {
                count: 1,
                level: WarningLevel::First
            }
        );
        assert_eq!(
            monitor.record_focus_loss(),
            StrikeOutcome::Warned {
                count: 2,
                level: WarningLevel::Final
            }
        );
        assert_eq!(
            monitor.record_focus_loss(),
            StrikeOutcome::LimitReached { count: 3 }
        );
        assert_eq!(monitor.warning(), WarningLevel::None);
        assert_eq!(monitor.record_focus_loss(), StrikeOutcome::Ignored);
        assert_eq!(monitor.count(), 3);
    }

    #[test]
    fn detached_monitor_ignores_events() {
        let mut monitor = StrikeMonitor::new(3);
        assert_eq!(monitor.record_focus_loss(), StrikeOutcome::Ignored);
        monitor.attach();
        monitor.record_focus_loss();
        monitor.detach();
        assert_eq!(monitor.record_focus_loss(), StrikeOutcome::Ignored);
        assert_eq!(monitor.count(), 1);
    }

    #[test]
    fn dismiss_keeps_count() {
        let mut monitor = StrikeMonitor::new(3);
        monitor.attach();
        monitor.record_focus_loss();
        monitor.dismiss_warning();
        assert_eq!(monitor.warning(), WarningLevel::None);
        assert_eq!(monitor.count(), 1);
    }

    #[test]
    fn single_strike_limit_submits_immediately() {
        let mut monitor = StrikeMonitor::new(1);
        monitor.attach();
        assert_eq!(
            monitor.record_focus_loss(),
            StrikeOutcome::LimitReached { count: 1 }
        );
    }
}
