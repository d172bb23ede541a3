//! Receiving-side state machine.
//!
//! A [`Receiver`] walks `Idle → AwaitingInit → Receiving → Done`.  It binds
//! its socket, blocks for the Init announcement, then accepts Data packets
//! under the negotiated strategy, persisting each accepted chunk through
//! the [`ChunkStore`].  Once every chunk is stored the output file is
//! assembled and the chunk artifacts are deleted.
//!
//! Every wait — handshake included — is bounded by the same fatal
//! idle-channel deadline.  The receiver never retransmits anything: under
//! stop-and-wait an unexpected Data packet is silently discarded (the
//! sender's own clock will drive the retry), under go-back-N every arrival
//! is answered with the cumulative next-expected request.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ReceiverConfig;
use crate::error::{Error, Result};
use crate::fault::ReceiverFaultPlan;
use crate::packet::{Kind, Packet};
use crate::reassemble::reassemble;
use crate::session::{Mode, Session};
use crate::socket::{Socket, SocketError};
use crate::state::ReceiverPhase;
use crate::store::ChunkStore;

/// Drives one complete inbound transfer.
pub struct Receiver {
    socket: Socket,
    mode: Mode,
    store: ChunkStore,
    fault: ReceiverFaultPlan,
    idle_timeout: Duration,
    /// Addresses the pinned sender resolves to, when one was configured.
    allowed_peers: Option<Vec<IpAddr>>,
    output: Option<PathBuf>,
    work_dir: PathBuf,
    phase: ReceiverPhase,
}

impl Receiver {
    /// Bind the socket and resolve the pinned sender, if any.
    pub async fn new(config: ReceiverConfig) -> Result<Self> {
        let socket = Socket::bind(SocketAddr::from(([0, 0, 0, 0], config.port))).await?;
        log::info!(
            "listening on {} for a {} transfer",
            socket.local_addr,
            config.mode
        );

        let allowed_peers = match &config.sender {
            Some(host) => {
                let addrs: Vec<IpAddr> = tokio::net::lookup_host((host.as_str(), 0))
                    .await?
                    .map(|a| a.ip())
                    .collect();
                if addrs.is_empty() {
                    return Err(Error::Configuration(format!(
                        "cannot resolve pinned sender {host:?}"
                    )));
                }
                Some(addrs)
            }
            None => None,
        };

        Ok(Self {
            socket,
            mode: config.mode,
            store: ChunkStore::new(config.work_dir.clone()),
            fault: ReceiverFaultPlan::new(config.fault),
            idle_timeout: config.idle_timeout,
            allowed_peers,
            output: config.output,
            work_dir: config.work_dir,
            phase: ReceiverPhase::Idle,
        })
    }

    /// Address the receiver is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ReceiverPhase {
        self.phase
    }

    /// Run the transfer to completion and return the output file path.
    pub async fn run(mut self) -> Result<PathBuf> {
        let session = self.await_init().await?;
        self.phase = ReceiverPhase::Receiving;

        match session.mode {
            Mode::StopAndWait => self.recv_stop_and_wait(&session).await?,
            Mode::GoBackN(_) => self.recv_go_back_n(&session).await?,
        }

        let output = self.output_path(&session);
        reassemble(&self.store, &session, &output)?;
        self.phase = ReceiverPhase::Done;
        log::info!("transmission complete");
        Ok(output)
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Block for the Init announcement and answer it.
    ///
    /// The first datagram must be a well-formed Init whose strategy matches
    /// ours, from the pinned sender when one is configured.  The reply
    /// differs per strategy: stop-and-wait echoes the Init's sequence
    /// number, go-back-N requests chunk 1.
    async fn await_init(&mut self) -> Result<Session> {
        self.phase = ReceiverPhase::AwaitingInit;

        let (init, peer) = match self.socket.recv_within(self.idle_timeout).await {
            Ok(Some(got)) => got,
            Ok(None) => {
                return Err(Error::TransferTimedOut {
                    attempts: 1,
                    unit: "INIT (idle channel)".into(),
                })
            }
            Err(SocketError::Packet(e)) => {
                return Err(Error::HandshakeFailed(format!(
                    "first datagram is not a valid packet: {e}"
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if init.kind != Kind::Init {
            return Err(Error::HandshakeFailed(format!(
                "expected INIT, got {}",
                init.kind
            )));
        }
        let peer_mode = Mode::from_wire(init.mode).ok_or_else(|| {
            Error::HandshakeFailed(format!("unintelligible mode {}", init.mode))
        })?;
        if peer_mode != self.mode {
            return Err(Error::HandshakeFailed(format!(
                "strategy mismatch: peer announced {peer_mode}, configured for {}",
                self.mode
            )));
        }
        if let Some(allowed) = &self.allowed_peers {
            if !allowed.contains(&peer.ip()) {
                return Err(Error::HandshakeFailed(format!("unexpected sender {peer}")));
            }
        }

        let session = Session::new(peer, init.file_name, init.file_size, self.mode);
        log::info!(
            "← INIT: {} ({} bytes, {} chunk(s)) from {}",
            session.file_name,
            session.file_size,
            session.total_chunks,
            session.peer
        );

        let reply_seq = match self.mode {
            Mode::StopAndWait => init.seq,
            Mode::GoBackN(_) => 1,
        };
        self.send_ack(&session, reply_seq).await?;
        log::debug!("→ ACK INIT (req={reply_seq})");

        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Stop-and-wait reception
    // -----------------------------------------------------------------------

    async fn recv_stop_and_wait(&mut self, session: &Session) -> Result<()> {
        let mut expected = 1u32;
        while expected <= session.total_chunks {
            let packet = self.next_from_peer(session).await?;
            if packet.kind != Kind::Data {
                log::debug!("discarding {} during data phase", packet.kind);
                continue;
            }
            if packet.seq != expected {
                // Duplicate or out of order: drop it without an Ack and let
                // the sender's clock drive the retransmission.
                log::debug!("discarding DATA {} (want {expected})", packet.seq);
                continue;
            }

            self.store_chunk(session, expected, &packet.payload)?;
            log::debug!("← DATA {expected}");
            self.send_ack(session, expected).await?;
            log::debug!("→ ACK {expected}");
            expected += 1;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Go-back-N reception
    // -----------------------------------------------------------------------

    async fn recv_go_back_n(&mut self, session: &Session) -> Result<()> {
        let mut expected = 1u32;
        while expected <= session.total_chunks {
            let packet = self.next_from_peer(session).await?;

            if packet.kind == Kind::Data {
                if packet.seq == expected {
                    self.store_chunk(session, expected, &packet.payload)?;
                    log::debug!("← DATA {expected}");
                    expected += 1;
                } else {
                    log::debug!("← DATA {} out of order (want {expected})", packet.seq);
                }
            }
            // A re-sent INIT lands here too when our handshake Ack was
            // lost; the cumulative request below re-answers it.

            if self.fault.suppress_request(expected, session.total_chunks) {
                log::debug!("fault hook: suppressing REQUEST {expected}");
                continue;
            }
            self.send_ack(session, expected).await?;
            log::debug!("→ REQUEST {expected}");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Next packet from the session peer, under the idle-channel deadline.
    /// Datagrams from other addresses are ignored.
    async fn next_from_peer(&mut self, session: &Session) -> Result<Packet> {
        loop {
            match self.socket.recv_within(self.idle_timeout).await? {
                Some((packet, addr)) if addr == session.peer => return Ok(packet),
                Some((_, addr)) => {
                    log::debug!("ignoring datagram from unrelated {addr}");
                }
                None => {
                    return Err(Error::TransferTimedOut {
                        attempts: 1,
                        unit: "DATA (idle channel)".into(),
                    })
                }
            }
        }
    }

    /// Persist chunk `seq`, truncated from the padded wire payload to its
    /// true length.
    fn store_chunk(&self, session: &Session, seq: u32, payload: &[u8]) -> Result<()> {
        let len = session.chunk_len(seq);
        self.store.insert(seq, &payload[..len])?;
        Ok(())
    }

    async fn send_ack(&self, session: &Session, seq: u32) -> Result<()> {
        let ack = Packet::ack(
            &session.file_name,
            session.file_size,
            session.mode.to_wire(),
            seq,
        );
        self.socket.send_to(&ack, session.peer).await?;
        Ok(())
    }

    /// Destination of the reassembled file: the explicit override, or the
    /// announced name suffixed with our pid, in the working directory.
    fn output_path(&self, session: &Session) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        // Only the final path component of the announced name is trusted.
        let base = Path::new(&session.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transfer".into());
        self.work_dir.join(format!("{base}{}", std::process::id()))
    }
}
