//! Transfer finite-state machine types.
//!
//! Both parties walk a small linear FSM; the transitions themselves live in
//! [`crate::sender`] and [`crate::receiver`].  Keeping the phase types in
//! their own module makes the lifecycle visible in log output without
//! touching protocol plumbing.

/// Phases of the sending side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderPhase {
    /// Nothing sent yet; initial state.
    #[default]
    Idle,
    /// Init announced; waiting for the handshake Ack.
    AwaitingInitAck,
    /// Handshake complete; Data packets moving under the chosen strategy.
    Transmitting,
    /// Every chunk acknowledged.
    Done,
    /// A fatal error ended the transfer.
    Failed,
}

/// Phases of the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverPhase {
    /// Socket not yet bound; initial state.
    #[default]
    Idle,
    /// Bound and blocking for the Init announcement.
    AwaitingInit,
    /// Handshake accepted; Data packets arriving.
    Receiving,
    /// Every chunk stored and the output file assembled.
    Done,
}

impl std::fmt::Display for SenderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::fmt::Display for ReceiverPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
