//! `arq-over-udp` — reliable, ordered whole-file delivery over UDP.
//!
//! Two automatic-repeat-request strategies are available, chosen at
//! handshake time: stop-and-wait (one packet outstanding) and go-back-N
//! (fixed sliding window with cumulative acknowledgments).
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐    Data chunks    ┌────────────┐
//!  │  Sender  │──────────────────▶│  Receiver  │
//!  └────┬─────┘                   └──────┬─────┘
//!       │            Acks               │
//!       │◀───────────────────────────────┘
//!       │                               │
//!       │ file buffer            ChunkStore ──▶ Reassembler ──▶ output file
//!       │                               │
//!  ┌────▼───────────────────────────────▼────┐
//!  │                 Socket                  │
//!  │  (packet-oriented tokio UdpSocket wrap) │
//!  └─────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]     — wire format (serialise / deserialise)
//! - [`session`]    — per-transfer parameters and chunk geometry
//! - [`retry`]      — bounded, linearly growing retransmit deadlines
//! - [`window`]     — go-back-N outbound window state machine
//! - [`sender`]     — outbound transfer driver (handshake + both strategies)
//! - [`receiver`]   — inbound transfer driver (handshake + both strategies)
//! - [`store`]      — write-once on-disk chunk store
//! - [`reassemble`] — ordered concatenation into the output file
//! - [`state`]      — finite-state-machine types
//! - [`fault`]      — optional fault hooks for testing the retry paths
//! - [`config`]     — per-role startup configuration
//! - [`socket`]     — async UDP socket abstraction
//! - [`error`]      — crate-wide error taxonomy

pub mod config;
pub mod error;
pub mod fault;
pub mod packet;
pub mod reassemble;
pub mod receiver;
pub mod retry;
pub mod sender;
pub mod session;
pub mod socket;
pub mod state;
pub mod store;
pub mod window;

pub use config::{ReceiverConfig, SenderConfig, IDLE_TIMEOUT};
pub use error::{Error, Result};
pub use fault::{ReceiverFault, SenderFault};
pub use packet::{Kind, Packet, CHUNK_LEN, FILE_NAME_LEN, PACKET_LEN};
pub use receiver::Receiver;
pub use retry::RetryClock;
pub use sender::Sender;
pub use session::{Mode, Session};
