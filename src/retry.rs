//! Retransmit deadline policy.
//!
//! Every unacknowledged unit — the INIT announcement, a single Data packet
//! under stop-and-wait, or a whole window under go-back-N — is sent at most
//! [`MAX_TRIES`] times.  The wait before declaring an attempt lost grows
//! linearly with the attempt number:
//!
//! ```text
//! attempt 0 → 1 × BASE_RTT
//! attempt 1 → 2 × BASE_RTT
//! attempt 2 → 3 × BASE_RTT
//! ```
//!
//! Deadlines are computed fresh for every wait; the clock itself holds no
//! per-attempt state and nothing a wait call could mutate.

use std::time::Duration;

/// Baseline round-trip estimate used as the first-attempt timeout.
pub const BASE_RTT: Duration = Duration::from_millis(500);

/// Transmissions allowed per unacknowledged unit before giving up.
pub const MAX_TRIES: u32 = 3;

/// Per-attempt deadline calculator.
///
/// The defaults match the protocol constants; tests substitute shorter
/// values via [`RetryClock::with`].
#[derive(Debug, Clone, Copy)]
pub struct RetryClock {
    base_rtt: Duration,
    max_tries: u32,
}

impl Default for RetryClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryClock {
    /// Clock with the protocol's standard constants.
    pub fn new() -> Self {
        Self {
            base_rtt: BASE_RTT,
            max_tries: MAX_TRIES,
        }
    }

    /// Clock with custom parameters.
    pub fn with(base_rtt: Duration, max_tries: u32) -> Self {
        assert!(max_tries >= 1, "at least one attempt is required");
        Self { base_rtt, max_tries }
    }

    /// Transmissions allowed per unit.
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Deadline for the given 0-based attempt: `base_rtt × (attempt + 1)`.
    ///
    /// `Duration` multiplication carries sub-second overflow into the
    /// seconds field, so the result is always a properly normalised value.
    pub fn next_timeout(&self, attempt: u32) -> Duration {
        self.base_rtt * (attempt + 1)
    }
}
