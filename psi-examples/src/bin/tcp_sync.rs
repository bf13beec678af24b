//! TCP-based ECDH-PSI example.
//!
//! The server plays the sender and the client the receiver: after the run,
//! the client prints which of its items the server also holds. Messages are
//! newline-delimited JSON.
//!
//! Run server:
//! ```bash
//! cargo run --bin tcp_sync -- server
//! ```
//!
//! Run client (in another terminal):
//! ```bash
//! cargo run --bin tcp_sync -- client --items alice_secret,shared_item_1,shared_item_2
//! ```
//!
//! Plain TCP is for demonstration only; production deployments need TLS.

use clap::{Parser, ValueEnum};
use ecdh_psi::{
    run_party, CurveId, EcdhPsi, EngineConfig, Intersection, MaskingCurve, PsiError, PsiMessage,
    Ristretto255, Role, Secp256k1, Token, Transport,
};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::{TcpListener, TcpStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Two-party ECDH-PSI over TCP")]
struct Cli {
    /// Which side to run
    #[arg(value_enum)]
    mode: Mode,

    /// Address to listen on (server) or connect to (client)
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Curve both sides must agree on
    #[arg(long, default_value = "ristretto255", value_parser = parse_curve)]
    curve: CurveId,

    /// Comma-separated items; a built-in set is used when omitted
    #[arg(long, value_delimiter = ',')]
    items: Vec<String>,

    /// Largest peer batch accepted; bounds the size of one received message
    #[arg(long, default_value_t = 1_000_000)]
    max_peer_items: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Server,
    Client,
}

fn parse_curve(s: &str) -> Result<CurveId, String> {
    s.parse().map_err(|e: PsiError| e.to_string())
}

/// Upper bound on one JSON line carrying `max_items` points or tokens.
///
/// Each entry is a quoted hex string plus a separator; points are
/// `2 * encoded_len` hex chars and tokens 32.
fn max_line_len(curve: CurveId, max_items: u64) -> u64 {
    const ENVELOPE: u64 = 256;
    let entry = (2 * curve.encoded_len()).max(2 * Token::LEN) as u64 + 3;
    max_items.saturating_mul(entry).saturating_add(ENVELOPE)
}

/// Newline-delimited JSON framing of `PsiMessage` over a TCP stream.
struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    max_line: u64,
}

impl TcpTransport {
    fn new(stream: TcpStream, max_line: u64) -> std::io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            max_line,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, message: PsiMessage) -> ecdh_psi::Result<()> {
        let line = serde_json::to_string(&message).map_err(|e| PsiError::Transport(e.to_string()))?;
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .map_err(|e| PsiError::Transport(e.to_string()))
    }

    fn receive(&mut self) -> ecdh_psi::Result<PsiMessage> {
        let line = read_bounded_line(&mut self.reader, self.max_line)?;
        serde_json::from_str(&line).map_err(|e| PsiError::Transport(e.to_string()))
    }
}

/// Read one newline-terminated line of at most `max_line` bytes.
fn read_bounded_line<R: BufRead>(reader: &mut R, max_line: u64) -> ecdh_psi::Result<String> {
    let mut line = String::new();
    let read = reader
        .by_ref()
        .take(max_line)
        .read_line(&mut line)
        .map_err(|e| PsiError::Transport(e.to_string()))?;
    if read == 0 {
        return Err(PsiError::Transport("connection closed by peer".to_string()));
    }
    if !line.ends_with('\n') {
        return Err(PsiError::Transport(format!(
            "message exceeds {max_line} bytes or was truncated"
        )));
    }
    Ok(line)
}

fn run<C: MaskingCurve>(
    items: &[String],
    role: Role,
    transport: TcpTransport,
) -> ecdh_psi::Result<Option<Intersection>> {
    let engine = EcdhPsi::<C>::with_config(EngineConfig::default())?;
    run_party(&engine, items, role, transport)
}

fn run_on_curve(
    curve: CurveId,
    items: &[String],
    role: Role,
    transport: TcpTransport,
) -> ecdh_psi::Result<Option<Intersection>> {
    match curve {
        CurveId::Ristretto255 => run::<Ristretto255>(items, role, transport),
        CurveId::Secp256k1 => run::<Secp256k1>(items, role, transport),
    }
}

fn default_items(mode: Mode) -> Vec<String> {
    let items: &[&str] = match mode {
        Mode::Server => &[
            "bob_secret_1",
            "shared_item_1",
            "bob_secret_2",
            "shared_item_2",
            "bob_secret_3",
        ],
        Mode::Client => &[
            "alice_secret_1",
            "shared_item_1",
            "alice_secret_2",
            "shared_item_2",
            "alice_secret_3",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

fn run_server(cli: &Cli, items: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&cli.addr)?;
    info!(addr = %cli.addr, curve = %cli.curve, "waiting for client");

    let (stream, peer) = listener.accept()?;
    info!(%peer, items = items.len(), "client connected");

    let transport = TcpTransport::new(stream, max_line_len(cli.curve, cli.max_peer_items))?;
    run_on_curve(cli.curve, items, Role::Sender, transport)?;
    println!("✓ Server protocol completed (the server learns nothing)");
    Ok(())
}

fn run_client(cli: &Cli, items: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(&cli.addr)?;
    info!(addr = %cli.addr, curve = %cli.curve, items = items.len(), "connected to server");

    let transport = TcpTransport::new(stream, max_line_len(cli.curve, cli.max_peer_items))?;
    let result = run_on_curve(cli.curve, items, Role::Receiver, transport)?
        .ok_or("client did not learn an intersection")?;

    println!("\nIntersection items (client side): {}", result.len());
    for (i, index) in result.local_indices().into_iter().enumerate() {
        println!("  {}: {}", i + 1, items[index]);
    }
    println!("\n✓ Client protocol completed!");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let items = if cli.items.is_empty() {
        default_items(cli.mode)
    } else {
        cli.items.clone()
    };

    match cli.mode {
        Mode::Server => run_server(&cli, &items),
        Mode::Client => run_client(&cli, &items),
    }
}
