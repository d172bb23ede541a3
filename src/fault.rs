//! Opt-in fault injection for exercising the reliability machinery.
//!
//! Real networks drop datagrams; loopback does not.  These hooks let the
//! test harness provoke losses deterministically:
//!
//! | Hook                  | Party    | Effect                                        |
//! |-----------------------|----------|-----------------------------------------------|
//! | `skip-init-wait`      | sender   | Skip the channel wait on the first INIT try.  |
//! | `lose-once:<seq>`     | sender   | Misdirect Data `<seq>` to a dead port, once.  |
//! | `lose-always:<seq>`   | sender   | Misdirect Data `<seq>` on every transmission. |
//! | `suppress-odd-acks`   | receiver | Drop go-back-N Acks with an odd request, except the final one. |
//!
//! With no hook configured every method is an inert constant-false check —
//! the default transfer path is untouched.

use std::str::FromStr;

// ---------------------------------------------------------------------------
// Hook descriptions
// ---------------------------------------------------------------------------

/// Sender-side fault hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderFault {
    /// Treat the first INIT attempt as timed out without waiting, forcing
    /// the retry path through the handshake.
    SkipFirstInitWait,
    /// Redirect the Data packet with this sequence number to an unroutable
    /// port on its first transmission only; retransmissions go through.
    MisdirectOnce(u32),
    /// Redirect it on every transmission; the transfer must then exhaust
    /// its retries and die.
    MisdirectAlways(u32),
}

/// Receiver-side fault hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverFault {
    /// Under go-back-N, drop outgoing Acks whose request number is odd —
    /// except the final `total + 1` request, so the transfer can finish.
    SuppressOddRequests,
}

impl FromStr for SenderFault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "skip-init-wait" {
            return Ok(Self::SkipFirstInitWait);
        }
        if let Some(seq) = s.strip_prefix("lose-once:") {
            let seq = seq.parse().map_err(|_| format!("bad sequence number in {s:?}"))?;
            return Ok(Self::MisdirectOnce(seq));
        }
        if let Some(seq) = s.strip_prefix("lose-always:") {
            let seq = seq.parse().map_err(|_| format!("bad sequence number in {s:?}"))?;
            return Ok(Self::MisdirectAlways(seq));
        }
        Err(format!(
            "unknown sender fault {s:?} (expected skip-init-wait, lose-once:<seq> or lose-always:<seq>)"
        ))
    }
}

impl FromStr for ReceiverFault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suppress-odd-acks" => Ok(Self::SuppressOddRequests),
            _ => Err(format!(
                "unknown receiver fault {s:?} (expected suppress-odd-acks)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Stateful plans queried by the state machines
// ---------------------------------------------------------------------------

/// Sender-side plan; tracks whether a one-shot hook has already fired.
#[derive(Debug, Default)]
pub struct SenderFaultPlan {
    fault: Option<SenderFault>,
    fired: bool,
}

impl SenderFaultPlan {
    pub fn new(fault: Option<SenderFault>) -> Self {
        Self { fault, fired: false }
    }

    /// `true` when the channel wait of INIT attempt `attempt` should be
    /// skipped (fires at most once, on the first attempt).
    pub fn skip_init_wait(&mut self, attempt: u32) -> bool {
        if attempt == 0 && !self.fired && self.fault == Some(SenderFault::SkipFirstInitWait) {
            self.fired = true;
            return true;
        }
        false
    }

    /// `true` when this transmission of Data `seq` should be misdirected.
    pub fn misdirect(&mut self, seq: u32) -> bool {
        match self.fault {
            Some(SenderFault::MisdirectOnce(target)) if seq == target && !self.fired => {
                self.fired = true;
                true
            }
            Some(SenderFault::MisdirectAlways(target)) => seq == target,
            _ => false,
        }
    }
}

/// Receiver-side plan; stateless, queried per outgoing Ack.
#[derive(Debug, Default)]
pub struct ReceiverFaultPlan {
    fault: Option<ReceiverFault>,
}

impl ReceiverFaultPlan {
    pub fn new(fault: Option<ReceiverFault>) -> Self {
        Self { fault }
    }

    /// `true` when the Ack carrying request number `req` should be dropped.
    pub fn suppress_request(&self, req: u32, total_chunks: u32) -> bool {
        match self.fault {
            Some(ReceiverFault::SuppressOddRequests) => {
                req % 2 == 1 && req != total_chunks + 1
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
