//! Per-transfer session parameters.
//!
//! A [`Session`] is built once — by the sender from its configuration, by
//! the receiver from an accepted Init packet — and then passed by reference
//! into the state machines.  It owns no sockets and no cursors; the
//! per-strategy cursors live with the state machine that uses them.

use std::net::SocketAddr;

use crate::packet::CHUNK_LEN;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The ARQ strategy negotiated for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// At most one Data packet outstanding at a time.
    StopAndWait,
    /// Sliding window of the given size with cumulative acknowledgments.
    GoBackN(u32),
}

impl Mode {
    /// Parse the wire encoding: `1` = stop-and-wait, `N > 1` = go-back-N.
    ///
    /// Returns `None` for zero or negative values.
    pub fn from_wire(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Mode::StopAndWait),
            n if n > 1 => Some(Mode::GoBackN(n as u32)),
            _ => None,
        }
    }

    /// The wire encoding of this mode.
    pub fn to_wire(self) -> i32 {
        match self {
            Mode::StopAndWait => 1,
            Mode::GoBackN(n) => n as i32,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::StopAndWait => write!(f, "stop-and-wait"),
            Mode::GoBackN(n) => write!(f, "go-back-{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Number of Data packets needed to carry `file_size` bytes.
pub fn total_chunks(file_size: u32) -> u32 {
    file_size.div_ceil(CHUNK_LEN as u32)
}

/// Parameters of one transfer, fixed at handshake time.
#[derive(Debug, Clone)]
pub struct Session {
    /// Address of the remote party.
    pub peer: SocketAddr,
    /// Name announced in the Init packet.
    pub file_name: String,
    /// Total file size in bytes.
    pub file_size: u32,
    /// Negotiated ARQ strategy.
    pub mode: Mode,
    /// Data packet count; sequence numbers run `1..=total_chunks`.
    pub total_chunks: u32,
}

impl Session {
    pub fn new(peer: SocketAddr, file_name: String, file_size: u32, mode: Mode) -> Self {
        Self {
            peer,
            file_name,
            file_size,
            mode,
            total_chunks: total_chunks(file_size),
        }
    }

    /// Byte offset of chunk `seq` within the file.
    pub fn chunk_offset(&self, seq: u32) -> usize {
        (seq as usize - 1) * CHUNK_LEN
    }

    /// True byte length of chunk `seq`: [`CHUNK_LEN`] for every chunk except
    /// the last, which carries only the file's remainder.
    pub fn chunk_len(&self, seq: u32) -> usize {
        debug_assert!(seq >= 1 && seq <= self.total_chunks);
        if seq < self.total_chunks {
            CHUNK_LEN
        } else {
            self.file_size as usize - (self.total_chunks as usize - 1) * CHUNK_LEN
        }
    }

    /// The slice of `file` carried by chunk `seq`.
    pub fn chunk_of<'a>(&self, file: &'a [u8], seq: u32) -> &'a [u8] {
        let start = self.chunk_offset(seq);
        &file[start..start + self.chunk_len(seq)]
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
