//! Sending-side state machine.
//!
//! A [`Sender`] walks `Idle → AwaitingInitAck → Transmitting → Done` (or
//! `Failed`).  The whole source file is read into memory up front; the
//! transfer then runs as one sequential task whose only suspension points
//! are the bounded waits for acknowledgments, with every deadline computed
//! fresh from the [`RetryClock`](crate::retry::RetryClock).
//!
//! # Strategy drivers
//!
//! - **Stop-and-wait** — exactly one Data packet outstanding; each one is
//!   retried under the clock until its echo Ack arrives.
//! - **Go-back-N** — the window is blasted out eagerly, then a single
//!   bounded wait covers the whole window; on timeout the entire window is
//!   resent unmodified, on a cumulative request the base slides and the
//!   newly exposed chunks go out immediately.
//!
//! Either way, running out of attempts for one unit kills the transfer.

use std::net::SocketAddr;

use crate::config::SenderConfig;
use crate::error::{Error, Result};
use crate::fault::SenderFaultPlan;
use crate::packet::{Kind, Packet, PacketError, FILE_NAME_LEN};
use crate::retry::RetryClock;
use crate::session::{Mode, Session};
use crate::socket::Socket;
use crate::state::SenderPhase;
use crate::window::GbnWindow;

/// Drives one complete outbound transfer.
pub struct Sender {
    socket: Socket,
    session: Session,
    file: Vec<u8>,
    retry: RetryClock,
    fault: SenderFaultPlan,
    phase: SenderPhase,
}

impl Sender {
    /// Read the source file, resolve the peer and bind an ephemeral socket.
    pub async fn new(config: SenderConfig) -> Result<Self> {
        let file = std::fs::read(&config.file)?;
        if file.len() > u32::MAX as usize {
            return Err(Error::Configuration(format!(
                "{} is too large for a 32-bit file size",
                config.file.display()
            )));
        }
        let file_name = config
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Configuration(format!("{} has no file name", config.file.display()))
            })?;
        // The codec would reject this on the first encode anyway; failing
        // here reports it before any socket exists.
        if file_name.len() > FILE_NAME_LEN {
            return Err(PacketError::NameTooLong {
                len: file_name.len(),
            }
            .into());
        }

        let peer = resolve(&config.host, config.port).await?;
        let socket = Socket::bind(SocketAddr::from(([0, 0, 0, 0], 0))).await?;

        let session = Session::new(peer, file_name, file.len() as u32, config.mode);
        log::info!(
            "sending {} ({} bytes, {} chunk(s)) to {} via {}",
            session.file_name,
            session.file_size,
            session.total_chunks,
            session.peer,
            session.mode
        );

        Ok(Self {
            socket,
            session,
            file,
            retry: config.retry,
            fault: SenderFaultPlan::new(config.fault),
            phase: SenderPhase::Idle,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SenderPhase {
        self.phase
    }

    /// Run the transfer to completion.
    pub async fn run(mut self) -> Result<()> {
        match self.drive().await {
            Ok(()) => {
                self.phase = SenderPhase::Done;
                log::info!("transmission complete");
                Ok(())
            }
            Err(e) => {
                self.phase = SenderPhase::Failed;
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        let handshake_req = self.handshake().await?;
        self.phase = SenderPhase::Transmitting;

        match self.session.mode {
            Mode::StopAndWait => self.send_stop_and_wait().await,
            Mode::GoBackN(n) => self.send_go_back_n(n, handshake_req).await,
        }
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Announce the session and wait for the handshake Ack.
    ///
    /// The identical Init packet is re-sent on every attempt.  Returns the
    /// Ack's sequence / request number; apart from the kind check its
    /// content is not validated here.
    async fn handshake(&mut self) -> Result<u32> {
        self.phase = SenderPhase::AwaitingInitAck;
        let init = Packet::init(
            &self.session.file_name,
            self.session.file_size,
            self.session.mode.to_wire(),
        );

        for attempt in 0..self.retry.max_tries() {
            self.socket.send_to(&init, self.session.peer).await?;
            log::debug!("→ INIT (attempt {})", attempt + 1);

            if self.fault.skip_init_wait(attempt) {
                log::debug!("fault hook: skipping channel wait for INIT");
                continue;
            }

            let wait = self.retry.next_timeout(attempt);
            match self.socket.recv_within(wait).await? {
                Some((reply, _)) => {
                    if reply.kind != Kind::Ack {
                        return Err(Error::UnexpectedResponse(format!(
                            "{} while waiting for the handshake Ack",
                            reply.kind
                        )));
                    }
                    log::debug!("← ACK INIT (req={})", reply.seq);
                    return Ok(reply.seq);
                }
                None => log::debug!("TIMEOUT-{} for INIT", attempt + 1),
            }
        }

        Err(Error::TransferTimedOut {
            attempts: self.retry.max_tries(),
            unit: "INIT".into(),
        })
    }

    // -----------------------------------------------------------------------
    // Stop-and-wait
    // -----------------------------------------------------------------------

    async fn send_stop_and_wait(&mut self) -> Result<()> {
        for seq in 1..=self.session.total_chunks {
            let packet = self.data_packet(seq);
            self.deliver_and_await_echo(&packet, seq).await?;
        }
        Ok(())
    }

    /// Send one Data packet and wait for the Ack echoing its sequence
    /// number, under the retry clock.
    async fn deliver_and_await_echo(&mut self, packet: &Packet, seq: u32) -> Result<()> {
        for attempt in 0..self.retry.max_tries() {
            let dest = self.transmit_dest(seq);
            self.socket.send_to(packet, dest).await?;
            log::debug!("→ DATA {seq} (attempt {})", attempt + 1);

            let wait = self.retry.next_timeout(attempt);
            match self.socket.recv_within(wait).await? {
                Some((reply, _)) => {
                    if reply.kind != Kind::Ack {
                        return Err(Error::UnexpectedResponse(format!(
                            "{} while waiting for ACK {seq}",
                            reply.kind
                        )));
                    }
                    if reply.seq != seq {
                        return Err(Error::UnexpectedResponse(format!(
                            "ACK {} while waiting for ACK {seq}",
                            reply.seq
                        )));
                    }
                    log::debug!("← ACK {seq}");
                    return Ok(());
                }
                None => log::debug!("TIMEOUT-{} for DATA {seq}", attempt + 1),
            }
        }

        Err(Error::TransferTimedOut {
            attempts: self.retry.max_tries(),
            unit: format!("DATA {seq}"),
        })
    }

    // -----------------------------------------------------------------------
    // Go-back-N
    // -----------------------------------------------------------------------

    async fn send_go_back_n(&mut self, window_size: u32, handshake_req: u32) -> Result<()> {
        let mut window = GbnWindow::new(window_size, self.session.total_chunks);

        // An empty file is fully acknowledged by the handshake itself: the
        // Init Ack's request number is already total + 1.
        if window.is_complete(handshake_req) {
            log::debug!("nothing to send, handshake already requested {handshake_req}");
            return Ok(());
        }

        loop {
            // Blast out everything the current window allows.
            while let Some(seq) = window.next_to_send() {
                let packet = self.data_packet(seq);
                let dest = self.transmit_dest(seq);
                self.socket.send_to(&packet, dest).await?;
                log::debug!(
                    "→ DATA {seq} (window {}..={})",
                    window.base(),
                    window.window_end()
                );
            }

            // One bounded wait covers the whole window.
            let wait = self.retry.next_timeout(window.attempts());
            match self.socket.recv_within(wait).await? {
                Some((reply, _)) => {
                    if reply.kind != Kind::Ack {
                        return Err(Error::UnexpectedResponse(format!(
                            "{} while waiting for a cumulative ACK",
                            reply.kind
                        )));
                    }
                    let req = reply.seq;
                    log::debug!("← REQUEST {req}");
                    if window.is_complete(req) {
                        return Ok(());
                    }
                    if !window.on_request(req) {
                        log::debug!("stale request {req}, window stays at {}", window.base());
                    }
                }
                None => {
                    let attempts = window.on_timeout();
                    log::debug!("TIMEOUT-{attempts} for window at {}", window.base());
                    if attempts >= self.retry.max_tries() {
                        return Err(Error::TransferTimedOut {
                            attempts,
                            unit: format!("window at base {}", window.base()),
                        });
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Build the Data packet carrying chunk `seq`.
    fn data_packet(&self, seq: u32) -> Packet {
        Packet::data(
            &self.session.file_name,
            self.session.file_size,
            self.session.mode.to_wire(),
            seq,
            self.session.chunk_of(&self.file, seq),
        )
    }

    /// Destination for one transmission of Data `seq` — the peer, unless a
    /// fault hook wants this copy lost.
    fn transmit_dest(&mut self, seq: u32) -> SocketAddr {
        if self.fault.misdirect(seq) {
            let dead = dead_letter(self.session.peer);
            log::debug!("fault hook: misdirecting DATA {seq} to {dead}");
            dead
        } else {
            self.session.peer
        }
    }
}

/// An address next to the peer where nothing is listening.
fn dead_letter(peer: SocketAddr) -> SocketAddr {
    let mut dead = peer;
    dead.set_port(peer.port().wrapping_sub(1));
    dead
}

/// Resolve `host:port` to the first reported address.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| Error::Configuration(format!("cannot resolve host {host:?}")))
}
