//! Reconnect policy for the connection supervisor.
//!
//! The observed design uses a single fixed retry delay — not exponential —
//! so the delay is a parameter here, not a law. Jitter is available for
//! deployments with many concurrent clients but defaults to off.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default retry delay in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 3000;

/// WebSocket close codes that suppress auto-reconnect.
///
/// 1000 = normal closure, 1001 = going away. Anything else (or a close with
/// no code at all) is treated as abnormal and retried.
pub const NORMAL_CLOSE_CODES: &[u16] = &[1000, 1001];

/// Whether a close code counts as a deliberate, terminal closure.
#[must_use]
pub fn is_normal_close(code: Option<u16>) -> bool {
    code.is_some_and(|c| NORMAL_CLOSE_CODES.contains(&c))
}

/// Fixed-delay reconnect policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the single scheduled retry, in milliseconds.
    pub delay_ms: u64,
    /// Jitter factor 0.0–1.0 applied symmetrically around the delay.
    /// 0.0 (the default) reproduces the observed fixed-delay behavior.
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            jitter_factor: 0.0,
        }
    }
}

impl ReconnectPolicy {
    /// The delay before the next reconnect attempt.
    ///
    /// With a nonzero jitter factor the delay varies by ±`jitter_factor`
    /// around `delay_ms`, clamped at zero.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.jitter_factor <= 0.0 {
            return Duration::from_millis(self.delay_ms);
        }
        let spread = (self.delay_ms as f64) * self.jitter_factor;
        let offset = (rand::random::<f64>() * 2.0 - 1.0) * spread;
        let delayed = ((self.delay_ms as f64) + offset).max(0.0);
        Duration::from_millis(delayed.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_three_seconds() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_ms, 3000);
        assert_eq!(policy.jitter_factor, 0.0);
        assert_eq!(policy.next_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = ReconnectPolicy {
            delay_ms: 500,
            jitter_factor: 0.0,
        };
        for _ in 0..10 {
            assert_eq!(policy.next_delay(), Duration::from_millis(500));
        }
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = ReconnectPolicy {
            delay_ms: 1000,
            jitter_factor: 0.2,
        };
        for _ in 0..100 {
            let delay = policy.next_delay().as_millis() as u64;
            assert!((800..=1200).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn normal_close_codes() {
        assert!(is_normal_close(Some(1000)));
        assert!(is_normal_close(Some(1001)));
        assert!(!is_normal_close(Some(1006)));
        assert!(!is_normal_close(Some(1011)));
        assert!(!is_normal_close(None));
    }

    #[test]
    fn serde_fills_defaults() {
        let policy: ReconnectPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.delay_ms, DEFAULT_DELAY_MS);
    }
}
