//! Headless whiteboard peer.
//!
//! Drives a full `SyncSession` over a real websocket, which makes it both a
//! smoke-test client for the relay and a way to populate a room without a
//! browser: `watch` joins a room and logs everything it replicates,
//! `scribble` joins and draws a stroke in timed batches.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};
use uuid::Uuid;

use canvas::session::{Action, SyncSession};
use wire::Envelope;

/// How often an in-progress stroke is flushed into a `draw_batch` frame.
const FLUSH_INTERVAL_MS: u64 = 50;

/// How long `watch` waits for a snapshot before re-requesting state.
const SNAPSHOT_RETRY_MS: u64 = 3000;

type Reader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame encode failed: {0}")]
    Encode(#[from] wire::CodecError),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "whiteboard-cli", about = "Headless whiteboard peer")]
struct Cli {
    /// Relay websocket URL.
    #[arg(long, env = "WHITEBOARD_URL", default_value = "ws://127.0.0.1:8081/ws")]
    url: String,

    /// Display name announced to the room.
    #[arg(long, default_value = "cli")]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a room, log replicated activity until interrupted, then dump
    /// the synced document as JSON.
    Watch {
        #[arg(long)]
        room: String,
    },
    /// Join a room, draw one stroke in timed batches, and exit.
    Scribble {
        #[arg(long)]
        room: String,

        /// Number of points in the stroke.
        #[arg(long, default_value_t = 64)]
        points: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Watch { room } => run_watch(&cli.url, &room, &cli.name).await,
        Command::Scribble { room, points } => run_scribble(&cli.url, &room, &cli.name, points).await,
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_watch(url: &str, room: &str, name: &str) -> Result<(), CliError> {
    let (mut session, out_tx, mut read) = connect_session(url, room, name).await?;

    let mut retry = tokio::time::interval(Duration::from_millis(SNAPSHOT_RETRY_MS));
    retry.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            msg = read.next() => {
                let Some(msg) = msg else { break };
                let msg = msg.map_err(|error| CliError::WsConnect(Box::new(error)))?;
                match msg {
                    Message::Text(text) => {
                        handle_frame(&mut session, &out_tx, text.as_str()).await?;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            _ = retry.tick() => {
                let actions = session.retry_request_state();
                if !actions.is_empty() {
                    info!("no snapshot yet, re-requesting state");
                }
                execute(&out_tx, actions).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, leaving room");
                break;
            }
        }
    }

    session.disconnected();
    print_document(&session)?;
    Ok(())
}

async fn run_scribble(url: &str, room: &str, name: &str, points: usize) -> Result<(), CliError> {
    let (mut session, out_tx, mut read) = connect_session(url, room, name).await?;

    // Trace a loose spiral, flushing partial batches on the same cadence a
    // browser client would.
    session.pointer_down(0.0, 0.0);
    for i in 1..points {
        let t = i as f64 * 0.2;
        let r = 10.0 + i as f64 * 2.0;
        session.pointer_move(r * t.cos(), r * t.sin());
        if i % 8 == 0 {
            execute(&out_tx, session.flush_batch()).await?;
            tokio::time::sleep(Duration::from_millis(FLUSH_INTERVAL_MS)).await;
            drain_pending(&mut session, &out_tx, &mut read).await?;
        }
    }
    execute(&out_tx, session.pointer_up()).await?;

    info!(
        points,
        strokes = session.document().strokes().len(),
        "scribble complete"
    );
    session.disconnected();
    Ok(())
}

// =============================================================================
// SESSION PLUMBING
// =============================================================================

/// Connect to the relay, announce presence, and request the room's current
/// document. Returns the session, the outbound frame channel, and the read
/// half of the socket.
async fn connect_session(
    url: &str,
    room: &str,
    name: &str,
) -> Result<(SyncSession, mpsc::Sender<String>, Reader), CliError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;
    let (mut write, read) = socket.split();

    // A writer task serializes all outbound sends, including delayed ones.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if write.send(Message::text(frame)).await.is_err() {
                break;
            }
        }
    });

    let user_id = format!("cli-{}", Uuid::new_v4());
    let mut session = SyncSession::new(room, &user_id, name, now_ms());
    execute(&out_tx, session.connected()).await?;
    info!(%room, %user_id, "joined room");

    Ok((session, out_tx, read))
}

/// Decode one inbound frame, run it through the session, and execute the
/// resulting actions. Malformed frames are logged and skipped.
async fn handle_frame(
    session: &mut SyncSession,
    out_tx: &mpsc::Sender<String>,
    text: &str,
) -> Result<(), CliError> {
    let envelope = match Envelope::decode(text) {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!(%error, "skipping malformed frame");
            return Ok(());
        }
    };

    let actions = session.handle(&envelope);
    info!(
        event = %envelope.event,
        phase = ?session.phase(),
        peers = session.roster().len(),
        strokes = session.document().strokes().len(),
        shapes = session.document().shapes().len(),
        texts = session.document().text_elements().len(),
        "frame"
    );
    execute(out_tx, actions).await
}

/// Apply any frames already buffered on the socket without blocking.
async fn drain_pending(
    session: &mut SyncSession,
    out_tx: &mpsc::Sender<String>,
    read: &mut Reader,
) -> Result<(), CliError> {
    while let Ok(Some(msg)) = tokio::time::timeout(Duration::from_millis(1), read.next()).await {
        let msg = msg.map_err(|error| CliError::WsConnect(Box::new(error)))?;
        if let Message::Text(text) = msg {
            handle_frame(session, out_tx, text.as_str()).await?;
        }
    }
    Ok(())
}

/// Execute session actions: immediate sends go straight to the writer task,
/// delayed sends are spawned so they never block the caller.
async fn execute(out_tx: &mpsc::Sender<String>, actions: Vec<Action>) -> Result<(), CliError> {
    for action in actions {
        match action {
            Action::Send(envelope) => {
                let frame = envelope.encode()?;
                out_tx.send(frame).await.map_err(|_| CliError::WsClosed)?;
            }
            Action::SendAfter { delay_ms, envelope } => {
                let frame = envelope.encode()?;
                let tx = out_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    if tx.send(frame).await.is_err() {
                        warn!("socket closed before delayed frame could be sent");
                    }
                });
            }
        }
    }
    Ok(())
}

/// Print the replicated document to stdout as one JSON object.
fn print_document(session: &SyncSession) -> Result<(), CliError> {
    let doc = session.document();
    let value = serde_json::json!({
        "strokes": doc.strokes(),
        "shapes": doc.shapes(),
        "textElements": doc.text_elements(),
    });
    let rendered = serde_json::to_string_pretty(&value)?;
    println!("{rendered}");
    Ok(())
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}
