//! Exponential backoff schedule
//!
//! The delay before retry `attempt` (zero-based) is `base × 2^attempt`: the
//! first retry waits exactly `base`, the next `2 × base`, and so on. The
//! first call of a request never waits.
//!
//! Jitter is opt-in. With [`Jitter::None`] the doubling sequence is exact,
//! which is what tests rely on.

use std::time::Duration;

use rand::Rng;

/// Largest exponent applied to the base delay; later attempts reuse it.
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Randomisation applied on top of the exponential delay
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Jitter {
    /// Exact doubling sequence
    #[default]
    None,
    /// Spread the delay uniformly within `±ratio` of its nominal value
    /// (e.g. `0.2` for ±20%). Ratios are clamped to `0.0..=1.0`; a
    /// non-finite ratio disables jitter.
    Proportional(f64),
}

impl Jitter {
    /// Apply the jitter to a nominal delay
    pub fn apply(&self, delay: Duration) -> Duration {
        match *self {
            Jitter::None => delay,
            Jitter::Proportional(ratio) => {
                if !ratio.is_finite() || ratio <= 0.0 || delay.is_zero() {
                    return delay;
                }
                let ratio = ratio.min(1.0);
                let factor = rand::thread_rng().gen_range((1.0 - ratio)..=(1.0 + ratio));
                Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
            }
        }
    }
}

/// Delay calculator for retry loops
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Backoff {
    jitter: Jitter,
    max_delay: Option<Duration>,
}

impl Backoff {
    /// Plain doubling, no jitter, no cap
    pub const fn new() -> Self {
        Self { jitter: Jitter::None, max_delay: None }
    }

    /// Enable proportional jitter (e.g. `0.2` for ±20%)
    #[must_use]
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter = Jitter::Proportional(ratio);
        self
    }

    /// Cap every computed delay (applied before jitter)
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Nominal `base × 2^attempt`, saturating on overflow
    pub fn exponential(attempt: u32, base: Duration) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        base.saturating_mul(1u32 << exponent)
    }

    /// Delay to wait before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32, base: Duration) -> Duration {
        let mut delay = Self::exponential(attempt, base);
        if let Some(max) = self.max_delay {
            delay = delay.min(max);
        }
        self.jitter.apply(delay)
    }

    /// The first `count` delays of the schedule
    pub fn schedule(&self, base: Duration, count: u32) -> Vec<Duration> {
        (0..count).map(|attempt| self.delay(attempt, base)).collect()
    }
}
