//! Entry point for `arq-over-udp`.
//!
//! Parses CLI arguments and dispatches into either **send** or **recv**
//! mode.  All actual protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing) and the
//! mapping from a fatal error to a non-zero exit status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use arq_over_udp::{
    Error, Mode, Receiver, ReceiverConfig, ReceiverFault, Sender, SenderConfig, SenderFault,
};

/// Reliable whole-file delivery over UDP (stop-and-wait / go-back-N).
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Send a file to a receiver.
    Send {
        /// Receiver host name or address.
        #[arg(long)]
        host: String,
        /// Receiver port.
        #[arg(short, long)]
        port: u16,
        /// ARQ strategy: 1 = stop-and-wait, N > 1 = go-back-N with window N.
        #[arg(short, long)]
        mode: i32,
        /// File to deliver.
        #[arg(short, long)]
        file: PathBuf,
        /// Fault hook for testing (skip-init-wait, lose-once:<seq>, lose-always:<seq>).
        #[arg(long, value_parser = parse_sender_fault)]
        fault: Option<SenderFault>,
    },
    /// Receive a file from a sender.
    Recv {
        /// Port to bind (0 lets the OS pick one).
        #[arg(short, long)]
        port: u16,
        /// ARQ strategy: 1 = stop-and-wait, N > 1 = go-back-N with window N.
        #[arg(short, long)]
        mode: i32,
        /// Only accept a transfer initiated by this host.
        #[arg(long)]
        sender: Option<String>,
        /// Output file path (default: announced name + pid, in the work dir).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for chunk artifacts and the default output file.
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,
        /// Fault hook for testing (suppress-odd-acks).
        #[arg(long, value_parser = parse_receiver_fault)]
        fault: Option<ReceiverFault>,
    },
}

fn parse_sender_fault(s: &str) -> Result<SenderFault, String> {
    s.parse()
}

fn parse_receiver_fault(s: &str) -> Result<ReceiverFault, String> {
    s.parse()
}

/// Map the wire mode number to a strategy, rejecting nonsense values at
/// startup.
fn parse_mode(raw: i32) -> Result<Mode, Error> {
    Mode::from_wire(raw).ok_or_else(|| {
        Error::Configuration(format!(
            "mode must be 1 (stop-and-wait) or a window size > 1, got {raw}"
        ))
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.role {
        Role::Send {
            host,
            port,
            mode,
            file,
            fault,
        } => run_send(host, port, mode, file, fault).await,
        Role::Recv {
            port,
            mode,
            sender,
            output,
            work_dir,
            fault,
        } => run_recv(port, mode, sender, output, work_dir, fault).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_send(
    host: String,
    port: u16,
    mode: i32,
    file: PathBuf,
    fault: Option<SenderFault>,
) -> Result<(), Error> {
    let mut config = SenderConfig::new(host, port, parse_mode(mode)?, file);
    config.fault = fault;
    Sender::new(config).await?.run().await
}

async fn run_recv(
    port: u16,
    mode: i32,
    sender: Option<String>,
    output: Option<PathBuf>,
    work_dir: PathBuf,
    fault: Option<ReceiverFault>,
) -> Result<(), Error> {
    let mut config = ReceiverConfig::new(port, parse_mode(mode)?);
    config.sender = sender;
    config.output = output;
    config.work_dir = work_dir;
    config.fault = fault;
    let output = Receiver::new(config).await?.run().await?;
    log::info!("wrote {}", output.display());
    Ok(())
}
