//! End-to-end transfer tests.
//!
//! Each test spins up a real receiver on a loopback port and drives a
//! sender (or a hand-rolled peer speaking raw packets) against it as a
//! separate tokio task.  Retry clocks are shortened so the timeout paths
//! run in milliseconds rather than seconds.

use std::path::PathBuf;
use std::time::Duration;

use arq_over_udp::{
    packet::{Kind, Packet},
    socket::Socket,
    Error, Mode, Receiver, ReceiverConfig, ReceiverFault, RetryClock, Sender, SenderConfig,
    SenderFault,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Short enough to keep tests fast, far above loopback round-trip time.
fn fast_clock() -> RetryClock {
    RetryClock::with(Duration::from_millis(200), 3)
}

/// Deterministic non-repeating test payload.
fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Everything a finished transfer leaves behind.
struct Outcome {
    sent: Result<(), Error>,
    received: Result<PathBuf, Error>,
    work: tempfile::TempDir,
    _source_dir: tempfile::TempDir,
}

impl Outcome {
    fn output_bytes(&self) -> Vec<u8> {
        std::fs::read(self.received.as_ref().expect("receive failed")).unwrap()
    }

    /// Chunk artifacts left in the receiver's working directory.
    fn leftover_artifacts(&self) -> Vec<String> {
        std::fs::read_dir(self.work.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("packet"))
            .collect()
    }
}

/// Run one complete sender/receiver pair over loopback.
async fn transfer(
    data: &[u8],
    mode: Mode,
    sender_fault: Option<SenderFault>,
    receiver_fault: Option<ReceiverFault>,
) -> Outcome {
    let source_dir = tempfile::tempdir().unwrap();
    let source = source_dir.path().join("source.bin");
    std::fs::write(&source, data).unwrap();

    let work = tempfile::tempdir().unwrap();
    let mut rcfg = ReceiverConfig::new(0, mode);
    rcfg.work_dir = work.path().to_path_buf();
    rcfg.output = Some(work.path().join("received.bin"));
    rcfg.fault = receiver_fault;
    rcfg.idle_timeout = Duration::from_secs(10);
    let receiver = Receiver::new(rcfg).await.expect("bind receiver");
    let port = receiver.local_addr().port();
    let rx_task = tokio::spawn(receiver.run());

    let mut scfg = SenderConfig::new("127.0.0.1", port, mode, &source);
    scfg.retry = fast_clock();
    scfg.fault = sender_fault;
    let sender = Sender::new(scfg).await.expect("set up sender");
    let tx_task = tokio::spawn(sender.run());

    let (sent, received) = tokio::join!(tx_task, rx_task);
    Outcome {
        sent: sent.unwrap(),
        received: received.unwrap(),
        work,
        _source_dir: source_dir,
    }
}

// ---------------------------------------------------------------------------
// Clean-path scenarios
// ---------------------------------------------------------------------------

/// 2500 bytes under stop-and-wait: chunks of 1024, 1024 and 452.
#[tokio::test]
async fn stop_and_wait_delivers_2500_bytes() {
    let data = patterned(2500);
    let outcome = transfer(&data, Mode::StopAndWait, None, None).await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
    assert!(
        outcome.leftover_artifacts().is_empty(),
        "chunk artifacts survived reassembly"
    );
}

/// 5000 bytes under go-back-3: five chunks moving in two windows.
#[tokio::test]
async fn go_back_n_delivers_5000_bytes_window_3() {
    let data = patterned(5000);
    let outcome = transfer(&data, Mode::GoBackN(3), None, None).await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
    assert!(outcome.leftover_artifacts().is_empty());
}

/// A file that is an exact multiple of the chunk size.
#[tokio::test]
async fn exact_chunk_multiple_roundtrips() {
    let data = patterned(2048);
    let outcome = transfer(&data, Mode::GoBackN(4), None, None).await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
}

/// An empty file completes right after the handshake, both strategies.
#[tokio::test]
async fn empty_file_completes_after_handshake_stop_and_wait() {
    let outcome = transfer(&[], Mode::StopAndWait, None, None).await;
    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), Vec::<u8>::new());
}

#[tokio::test]
async fn empty_file_completes_after_handshake_go_back_n() {
    let outcome = transfer(&[], Mode::GoBackN(3), None, None).await;
    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), Vec::<u8>::new());
}

// ---------------------------------------------------------------------------
// Fault-injection scenarios
// ---------------------------------------------------------------------------

/// A lost handshake Ack path: the first INIT wait is skipped, so the
/// transfer must succeed through an INIT retransmission.
#[tokio::test]
async fn init_retry_recovers_the_handshake() {
    let data = patterned(1500);
    let outcome = transfer(
        &data,
        Mode::StopAndWait,
        Some(SenderFault::SkipFirstInitWait),
        None,
    )
    .await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
}

/// One lost Data packet under stop-and-wait is healed by a retransmission.
#[tokio::test]
async fn lost_data_packet_is_retransmitted() {
    let data = patterned(2500);
    let outcome = transfer(
        &data,
        Mode::StopAndWait,
        Some(SenderFault::MisdirectOnce(2)),
        None,
    )
    .await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
}

/// One lost Data packet under go-back-N forces a full-window resend; the
/// receiver discards what it already has and the transfer still completes.
#[tokio::test]
async fn go_back_n_resends_window_after_loss() {
    let data = patterned(5000);
    let outcome = transfer(
        &data,
        Mode::GoBackN(3),
        Some(SenderFault::MisdirectOnce(2)),
        None,
    )
    .await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
}

/// Suppressed cumulative Acks must not stall go-back-N: the surviving
/// even-numbered requests (and the guaranteed final one) carry it through.
#[tokio::test]
async fn suppressed_acks_do_not_stall_go_back_n() {
    let data = patterned(5000);
    let outcome = transfer(
        &data,
        Mode::GoBackN(3),
        None,
        Some(ReceiverFault::SuppressOddRequests),
    )
    .await;

    outcome.sent.as_ref().expect("send failed");
    assert_eq!(outcome.output_bytes(), data);
}

/// A permanently lost packet exhausts the retry clock on both sides.
#[tokio::test]
async fn permanent_loss_kills_the_transfer() {
    let data = patterned(2500);
    let source_dir = tempfile::tempdir().unwrap();
    let source = source_dir.path().join("source.bin");
    std::fs::write(&source, &data).unwrap();

    let work = tempfile::tempdir().unwrap();
    let mut rcfg = ReceiverConfig::new(0, Mode::StopAndWait);
    rcfg.work_dir = work.path().to_path_buf();
    rcfg.idle_timeout = Duration::from_secs(2);
    let receiver = Receiver::new(rcfg).await.unwrap();
    let port = receiver.local_addr().port();
    let rx_task = tokio::spawn(receiver.run());

    let mut scfg = SenderConfig::new("127.0.0.1", port, Mode::StopAndWait, &source);
    scfg.retry = fast_clock();
    scfg.fault = Some(SenderFault::MisdirectAlways(1));
    let sent = Sender::new(scfg).await.unwrap().run().await;

    assert!(
        matches!(sent, Err(Error::TransferTimedOut { attempts: 3, .. })),
        "sender ended with {sent:?}"
    );
    // The receiver saw the handshake but never a Data packet.
    let received = rx_task.await.unwrap();
    assert!(matches!(received, Err(Error::TransferTimedOut { .. })));
}

// ---------------------------------------------------------------------------
// Timeout and handshake failures
// ---------------------------------------------------------------------------

/// Against a bound but silent peer the sender must give up after exactly
/// the configured number of INIT attempts.
#[tokio::test]
async fn silent_peer_exhausts_init_retries() {
    let silent = Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();

    let source_dir = tempfile::tempdir().unwrap();
    let source = source_dir.path().join("source.bin");
    std::fs::write(&source, b"payload").unwrap();

    let mut scfg = SenderConfig::new(
        "127.0.0.1",
        silent.local_addr.port(),
        Mode::StopAndWait,
        &source,
    );
    scfg.retry = RetryClock::with(Duration::from_millis(50), 3);
    let sent = Sender::new(scfg).await.unwrap().run().await;

    match sent {
        Err(Error::TransferTimedOut { attempts, unit }) => {
            assert_eq!(attempts, 3);
            assert_eq!(unit, "INIT");
        }
        other => panic!("expected a transfer timeout, got {other:?}"),
    }
}

/// A strategy mismatch between the two parties is a fatal handshake error.
#[tokio::test]
async fn mode_mismatch_fails_the_handshake() {
    let work = tempfile::tempdir().unwrap();
    let mut rcfg = ReceiverConfig::new(0, Mode::GoBackN(3));
    rcfg.work_dir = work.path().to_path_buf();
    rcfg.idle_timeout = Duration::from_secs(5);
    let receiver = Receiver::new(rcfg).await.unwrap();
    let port = receiver.local_addr().port();
    let rx_task = tokio::spawn(receiver.run());

    // Announce stop-and-wait against a go-back-3 receiver.
    let peer = Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let init = Packet::init("f.bin", 10, Mode::StopAndWait.to_wire());
    peer.send_to(&init, format!("127.0.0.1:{port}").parse().unwrap())
        .await
        .unwrap();

    let received = rx_task.await.unwrap();
    assert!(
        matches!(received, Err(Error::HandshakeFailed(_))),
        "receiver ended with {received:?}"
    );
}

// ---------------------------------------------------------------------------
// Protocol properties, driven with raw packets
// ---------------------------------------------------------------------------

/// Stop-and-wait: an out-of-order Data packet must be discarded without an
/// Ack and without advancing the expected sequence number.
#[tokio::test]
async fn stop_and_wait_discards_out_of_order_silently() {
    let data = patterned(2048); // two full chunks

    let work = tempfile::tempdir().unwrap();
    let mut rcfg = ReceiverConfig::new(0, Mode::StopAndWait);
    rcfg.work_dir = work.path().to_path_buf();
    rcfg.output = Some(work.path().join("received.bin"));
    rcfg.idle_timeout = Duration::from_secs(5);
    let receiver = Receiver::new(rcfg).await.unwrap();
    let addr = format!("127.0.0.1:{}", receiver.local_addr().port())
        .parse()
        .unwrap();
    let rx_task = tokio::spawn(receiver.run());

    let peer = Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let mode = Mode::StopAndWait.to_wire();

    peer.send_to(&Packet::init("f.bin", 2048, mode), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.kind, Kind::Ack);
    assert_eq!(ack.seq, 0, "handshake Ack must echo sequence 0");

    // Chunk 2 before chunk 1: no Ack may come back.
    peer.send_to(&Packet::data("f.bin", 2048, mode, 2, &data[1024..2048]), addr)
        .await
        .unwrap();
    let silence = peer.recv_within(Duration::from_millis(200)).await.unwrap();
    assert!(silence.is_none(), "out-of-order Data must not be acked");

    // Now deliver in order; each exact match is acked.
    peer.send_to(&Packet::data("f.bin", 2048, mode, 1, &data[0..1024]), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 1);

    peer.send_to(&Packet::data("f.bin", 2048, mode, 2, &data[1024..2048]), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 2);

    let output = rx_task.await.unwrap().expect("receive failed");
    assert_eq!(std::fs::read(output).unwrap(), data);
}

/// Go-back-N: every arrival is answered with the cumulative next-expected
/// request, and a duplicate never advances it.
#[tokio::test]
async fn go_back_n_acks_are_cumulative() {
    let data = patterned(2048);

    let work = tempfile::tempdir().unwrap();
    let mut rcfg = ReceiverConfig::new(0, Mode::GoBackN(2));
    rcfg.work_dir = work.path().to_path_buf();
    rcfg.output = Some(work.path().join("received.bin"));
    rcfg.idle_timeout = Duration::from_secs(5);
    let receiver = Receiver::new(rcfg).await.unwrap();
    let addr = format!("127.0.0.1:{}", receiver.local_addr().port())
        .parse()
        .unwrap();
    let rx_task = tokio::spawn(receiver.run());

    let peer = Socket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let mode = Mode::GoBackN(2).to_wire();

    peer.send_to(&Packet::init("f.bin", 2048, mode), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 1, "handshake Ack must request chunk 1");

    // Out-of-order chunk 2: discarded, but still answered with request 1.
    peer.send_to(&Packet::data("f.bin", 2048, mode, 2, &data[1024..2048]), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 1, "cumulative request must not move");

    peer.send_to(&Packet::data("f.bin", 2048, mode, 1, &data[0..1024]), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 2);

    peer.send_to(&Packet::data("f.bin", 2048, mode, 2, &data[1024..2048]), addr)
        .await
        .unwrap();
    let (ack, _) = peer.recv_from().await.unwrap();
    assert_eq!(ack.seq, 3, "final request must announce total + 1");

    let output = rx_task.await.unwrap().expect("receive failed");
    assert_eq!(std::fs::read(output).unwrap(), data);
}
