use thiserror::Error;

/// Countdown budget of a full assessment.
pub const DEFAULT_TIME_BUDGET_SECS: u32 = 15 * 60;
/// Focus losses that end a proctored session.
pub const DEFAULT_STRIKE_LIMIT: u32 = 3;
/// Default score a session must reach to pass.
pub const DEFAULT_PASS_THRESHOLD: f64 = 60.0;
/// Pass mark used by the onboarding assessment.
pub const ONBOARDING_PASS_THRESHOLD: f64 = 70.0;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("time budget must be at least one second")]
    ZeroTimeBudget,

    #[error("strike limit must be at least one")]
    ZeroStrikeLimit,

    #[error("pass threshold must be within 0..=100, got {0}")]
    InvalidPassThreshold(f64),
}

/// Per-call-site parameters of a session.
///
/// `None` for the time budget gives an untimed session; `None` for the
/// strike limit turns focus monitoring off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    time_budget_secs: Option<u32>,
    strike_limit: Option<u32>,
    pass_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::node_assessment()
    }
}

impl SessionConfig {
    /// Skill check attached to a roadmap node.
    #[must_use]
    pub fn node_assessment() -> Self {
        Self {
            time_budget_secs: Some(DEFAULT_TIME_BUDGET_SECS),
            strike_limit: Some(DEFAULT_STRIKE_LIMIT),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }

    /// Placement assessment taken during onboarding.
    #[must_use]
    pub fn onboarding() -> Self {
        Self {
            pass_threshold: ONBOARDING_PASS_THRESHOLD,
            ..Self::node_assessment()
        }
    }

    /// No countdown and no focus monitoring.
    #[must_use]
    pub fn unproctored() -> Self {
        Self {
            time_budget_secs: None,
            strike_limit: None,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_time_budget(mut self, secs: Option<u32>) -> Self {
        self.time_budget_secs = secs;
        self
    }

    #[must_use]
    pub fn with_strike_limit(mut self, limit: Option<u32>) -> Self {
        self.strike_limit = limit;
        self
    }

    #[must_use]
    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for a zero budget, a zero strike limit, or a
    /// threshold outside `0..=100`.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.time_budget_secs == Some(0) {
            return Err(ConfigError::ZeroTimeBudget);
        }
        if self.strike_limit == Some(0) {
            return Err(ConfigError::ZeroStrikeLimit);
        }
        if !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(ConfigError::InvalidPassThreshold(self.pass_threshold));
        }
        Ok(self)
    }

    #[must_use]
    pub fn time_budget_secs(&self) -> Option<u32> {
        self.time_budget_secs
    }

    #[must_use]
    pub fn strike_limit(&self) -> Option<u32> {
        self.strike_limit
    }

    #[must_use]
    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    #[must_use]
    pub fn is_proctored(&self) -> bool {
        self.strike_limit.is_some()
    }
}
