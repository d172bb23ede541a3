//! Crate-wide error taxonomy.
//!
//! Every fatal condition a transfer can hit is a variant here.  None of
//! them is retried above the retry clock's bounded attempts; the binary
//! maps any of them to a non-zero exit status.  The only silent drops in
//! the whole protocol are the expected, non-error discards: out-of-order
//! Data under stop-and-wait and duplicate Data under go-back-N.

use thiserror::Error;

use crate::packet::PacketError;
use crate::socket::SocketError;

/// Fatal transfer errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing startup configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Socket create/bind/send/receive failure.
    #[error(transparent)]
    Socket(#[from] SocketError),

    /// File read/write failure outside the socket layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Packet encoding failure (notably an oversized file name).
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// The handshake could not be completed: wrong first packet, strategy
    /// mismatch, or an unexpected peer.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// A reply outside the expected protocol flow.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The retry clock ran out of attempts for one unacknowledged unit.
    #[error("transfer timed out: no response after {attempts} attempt(s) for {unit}")]
    TransferTimedOut { attempts: u32, unit: String },

    /// A chunk was missing at reassembly time.  The state machines only
    /// invoke reassembly once every chunk is stored, so reaching this is an
    /// internal-invariant failure.
    #[error("incomplete transfer: chunk {seq} missing at reassembly")]
    IncompleteTransfer { seq: u32 },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
