//! Startup configuration for the two roles.
//!
//! The CLI layer builds these structs; everything the state machines need
//! beyond them is derived during setup (host resolution, socket binding,
//! reading the source file).  Semantic validation that clap cannot express
//! — a nonsensical mode value, say — surfaces as a configuration error at
//! startup, before any datagram moves.

use std::path::PathBuf;
use std::time::Duration;

use crate::fault::{ReceiverFault, SenderFault};
use crate::retry::RetryClock;
use crate::session::Mode;

/// How long the receiver lets the channel sit idle before giving up.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration of the sending side.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Receiver host name or address.
    pub host: String,
    /// Receiver port.
    pub port: u16,
    /// ARQ strategy to announce.
    pub mode: Mode,
    /// Source file to deliver.
    pub file: PathBuf,
    /// Optional fault-injection hook (test harness only).
    pub fault: Option<SenderFault>,
    /// Retransmit deadline policy.
    pub retry: RetryClock,
}

impl SenderConfig {
    pub fn new(host: impl Into<String>, port: u16, mode: Mode, file: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            mode,
            file: file.into(),
            fault: None,
            retry: RetryClock::new(),
        }
    }
}

/// Configuration of the receiving side.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Port to bind; `0` lets the OS pick one.
    pub port: u16,
    /// ARQ strategy this receiver accepts.
    pub mode: Mode,
    /// When set, only this host may initiate a transfer.
    pub sender: Option<String>,
    /// Explicit output path; defaults to `<file_name><pid>` in `work_dir`.
    pub output: Option<PathBuf>,
    /// Directory for chunk artifacts and the default output file.
    pub work_dir: PathBuf,
    /// Optional fault-injection hook (test harness only).
    pub fault: Option<ReceiverFault>,
    /// Fatal idle-channel deadline applied to every wait.
    pub idle_timeout: Duration,
}

impl ReceiverConfig {
    pub fn new(port: u16, mode: Mode) -> Self {
        Self {
            port,
            mode,
            sender: None,
            output: None,
            work_dir: PathBuf::from("."),
            fault: None,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}
