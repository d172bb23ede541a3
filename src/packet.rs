//! Wire-format definitions for protocol packets.
//!
//! Every datagram exchanged between the two parties is a [`Packet`].  This
//! module is responsible for:
//! - Defining the on-wire binary layout (kind tag, header fields, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**, and every field occupies its
//! full declared width (`mode` in particular is a 32-bit field on the wire).
//!
//! ```text
//! +------+----------------+-----------+--------+----------+--------------+
//! | kind |   file_name    | file_size |  mode  |   seq    |   payload    |
//! |  1 B |      56 B      |    4 B    |  4 B   |   4 B    |    1024 B    |
//! +------+----------------+-----------+--------+----------+--------------+
//! ```
//!
//! Total packet size: [`PACKET_LEN`] = 1093 bytes, for every kind.
//!
//! The file name slot is zero-padded; a name of exactly [`FILE_NAME_LEN`]
//! bytes fills the slot with **no** terminator, so decode never relies on
//! one.  The payload slot is zero-padded too — the wire carries no payload
//! length, so the true byte count of the final chunk is derived by the
//! caller from the announced file size.

use thiserror::Error;

/// Capacity of the file-name slot in bytes.
pub const FILE_NAME_LEN: usize = 56;

/// Capacity of the payload slot — the fixed chunk size of the protocol.
pub const CHUNK_LEN: usize = 1024;

/// Byte length of every packet on the wire.
pub const PACKET_LEN: usize = 1 + FILE_NAME_LEN + 4 + 4 + 4 + CHUNK_LEN;

// Byte offsets of each field within the serialised packet.
const OFF_KIND: usize = 0;
const OFF_NAME: usize = 1;
const OFF_FILE_SIZE: usize = OFF_NAME + FILE_NAME_LEN;
const OFF_MODE: usize = OFF_FILE_SIZE + 4;
const OFF_SEQ: usize = OFF_MODE + 4;
const OFF_PAYLOAD: usize = OFF_SEQ + 4;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Discriminates the three packet kinds.
///
/// The wire tag is an ASCII digit, not a binary enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Handshake announcement carrying the session parameters.
    Init,
    /// One file chunk.
    Data,
    /// Acknowledgment.  Under stop-and-wait `seq` echoes the acknowledged
    /// packet; under go-back-N `seq` is the cumulative request number.
    Ack,
}

impl Kind {
    /// The single-byte wire tag for this kind.
    pub fn to_wire(self) -> u8 {
        match self {
            Kind::Init => b'0',
            Kind::Data => b'1',
            Kind::Ack => b'2',
        }
    }

    /// Parse a wire tag back into a [`Kind`].
    pub fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            b'0' => Some(Kind::Init),
            b'1' => Some(Kind::Data),
            b'2' => Some(Kind::Ack),
            _ => None,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Init => write!(f, "INIT"),
            Kind::Data => write!(f, "DATA"),
            Kind::Ack => write!(f, "ACK"),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A complete protocol datagram.
///
/// Fields are in host byte order; [`Packet::encode`] converts to big-endian
/// on the wire and [`Packet::decode`] converts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet kind tag.
    pub kind: Kind,
    /// File name, at most [`FILE_NAME_LEN`] bytes.  Meaningful on Init,
    /// echoed on the other kinds.
    pub file_name: String,
    /// Total file size in bytes.  Meaningful on Init, echoed on the others.
    pub file_size: u32,
    /// ARQ strategy: `1` = stop-and-wait, `N > 1` = go-back-N with window N.
    pub mode: i32,
    /// Sequence number.  `0` is reserved for the handshake; Data chunks run
    /// from `1`.  On go-back-N Acks this is the cumulative request number.
    pub seq: u32,
    /// Payload bytes, at most [`CHUNK_LEN`].  Only Data packets carry a
    /// meaningful payload; it is zero-padded to full capacity on the wire.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build the handshake announcement (`seq` fixed to 0).
    pub fn init(file_name: &str, file_size: u32, mode: i32) -> Self {
        Self {
            kind: Kind::Init,
            file_name: file_name.to_owned(),
            file_size,
            mode,
            seq: 0,
            payload: Vec::new(),
        }
    }

    /// Build a Data packet carrying one chunk.
    pub fn data(file_name: &str, file_size: u32, mode: i32, seq: u32, chunk: &[u8]) -> Self {
        Self {
            kind: Kind::Data,
            file_name: file_name.to_owned(),
            file_size,
            mode,
            seq,
            payload: chunk.to_vec(),
        }
    }

    /// Build an Ack for the given sequence / request number.
    pub fn ack(file_name: &str, file_size: u32, mode: i32, seq: u32) -> Self {
        Self {
            kind: Kind::Ack,
            file_name: file_name.to_owned(),
            file_size,
            mode,
            seq,
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated [`PACKET_LEN`] buffer.
    ///
    /// Returns [`PacketError::NameTooLong`] when the file name does not fit
    /// its slot — names are never silently truncated.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let name = self.file_name.as_bytes();
        if name.len() > FILE_NAME_LEN {
            return Err(PacketError::NameTooLong { len: name.len() });
        }
        debug_assert!(
            self.payload.len() <= CHUNK_LEN,
            "payload exceeds chunk capacity ({} / {})",
            self.payload.len(),
            CHUNK_LEN
        );

        let mut buf = vec![0u8; PACKET_LEN];
        buf[OFF_KIND] = self.kind.to_wire();
        buf[OFF_NAME..OFF_NAME + name.len()].copy_from_slice(name);
        buf[OFF_FILE_SIZE..OFF_FILE_SIZE + 4].copy_from_slice(&self.file_size.to_be_bytes());
        buf[OFF_MODE..OFF_MODE + 4].copy_from_slice(&self.mode.to_be_bytes());
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_PAYLOAD..OFF_PAYLOAD + self.payload.len()].copy_from_slice(&self.payload);
        Ok(buf)
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if `buf` is shorter than [`PACKET_LEN`] or the kind
    /// tag is unknown.  Trailing bytes beyond [`PACKET_LEN`] are ignored.
    ///
    /// The decoded payload is always the full [`CHUNK_LEN`] block; padding
    /// bytes beyond the chunk's true length carry no meaning.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < PACKET_LEN {
            return Err(PacketError::TooShort { len: buf.len() });
        }

        let kind = Kind::from_wire(buf[OFF_KIND])
            .ok_or(PacketError::UnknownKind { tag: buf[OFF_KIND] })?;

        // The name slot is zero-padded but not necessarily terminated: a
        // 56-byte name fills it completely.
        let name_slot = &buf[OFF_NAME..OFF_NAME + FILE_NAME_LEN];
        let name_len = name_slot
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILE_NAME_LEN);
        let file_name = String::from_utf8_lossy(&name_slot[..name_len]).into_owned();

        let file_size =
            u32::from_be_bytes(buf[OFF_FILE_SIZE..OFF_FILE_SIZE + 4].try_into().unwrap());
        let mode = i32::from_be_bytes(buf[OFF_MODE..OFF_MODE + 4].try_into().unwrap());
        let seq = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());

        Ok(Self {
            kind,
            file_name,
            file_size,
            mode,
            seq,
            payload: buf[OFF_PAYLOAD..OFF_PAYLOAD + CHUNK_LEN].to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise when encoding or parsing a datagram.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PacketError {
    /// The file name does not fit the fixed 56-byte slot.
    #[error("file name too long: {len} bytes (max {FILE_NAME_LEN})")]
    NameTooLong { len: usize },

    /// Buffer shorter than one full packet.
    #[error("datagram too short: {len} bytes (need {PACKET_LEN})")]
    TooShort { len: usize },

    /// The kind tag is not one of `'0'`, `'1'`, `'2'`.
    #[error("unknown packet kind tag {tag:#04x}")]
    UnknownKind { tag: u8 },
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
