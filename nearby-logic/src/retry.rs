use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// How long to wait before reconnecting a dropped nearby feed
pub enum RetryPolicy {
    /// Always wait the same amount of time
    Fixed(Duration),
    /// Double the wait on each consecutive failure up to `max`.
    /// With `jitter` the actual wait is picked between half and all of that value.
    Exponential {
        initial: Duration,
        max: Duration,
        jitter: bool,
    },
}

impl RetryPolicy {
    /// One second between every attempt, how the legacy web client behaved
    pub const LEGACY: Self = Self::Fixed(Duration::from_secs(1));

    /// Delay before the given reconnect attempt, `attempt` starts at 1
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential {
                initial,
                max,
                jitter,
            } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                let base = initial.saturating_mul(factor).min(max);
                if jitter {
                    let half = base / 2;
                    let spread = (base - half).as_millis() as u64;
                    half + Duration::from_millis(rand::random_range(0..=spread))
                } else {
                    base
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            jitter: true,
        }
    }
}
