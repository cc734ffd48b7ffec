//! SneedChat terminal client.
//!
//! ## Design
//! - [`ClientState`] owns every piece of mutable view state — transcript,
//!   presence roster, viewport — so there are no ambient globals; one
//!   [`ChatClient`] instance is the whole client
//! - One socket handle at a time; any closure schedules exactly one
//!   reconnect after a fixed delay, and a graceful shutdown sends a
//!   normal-closure frame and suppresses it
//! - Each inbound frame is applied in a fixed order: message upserts, then
//!   deletions, then presence updates — never reordered, never batched
//!   across frames
//!
//! The update semantics themselves live in [`transcript`], [`roster`] and
//! [`scroll`]; this module is the event loop that drives them.

pub mod attach;
pub mod cli;
pub mod config;
pub mod error;
pub mod roster;
pub mod scroll;
pub mod transcript;
pub mod view;
pub mod wire;

use futures_util::{SinkExt, StreamExt};
use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

pub use config::Config;
pub use error::ChatError;
use roster::Roster;
use transcript::Transcript;
use view::{format_entry, format_presence, Viewport};
use wire::{parse_frame, parse_room_id, Command, Frame};

/// Current Unix epoch in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Client state
// ---------------------------------------------------------------------------

/// Everything the client displays, owned in one place.
pub struct ClientState {
    pub transcript: Transcript,
    pub roster: Roster,
    pub viewport: Viewport,
    /// Room we are in (or rejoining after a reconnect).
    pub room: Option<u32>,
}

impl ClientState {
    pub fn new(rows: usize) -> Self {
        Self {
            transcript: Transcript::new(),
            roster: Roster::new(),
            viewport: Viewport::new(rows),
            room: None,
        }
    }

    /// Apply one inbound frame. Within a frame the three batches run in
    /// fixed order: upsert messages, delete messages, then presence — the
    /// roster is re-sorted once after its batch.
    pub fn apply_frame(&mut self, frame: Frame, now: u64) {
        match frame {
            Frame::Notice(text) => self.transcript.push_notice(&text, now as i64),
            Frame::Update(update) => {
                for msg in update.messages {
                    self.transcript.upsert(msg);
                }
                for id in update.delete {
                    self.transcript.delete(id);
                }
                if !update.users.is_empty() {
                    for (id, change) in &update.users {
                        self.roster.apply(*id, change, now);
                    }
                    self.roster.resort(now);
                }
            }
        }
    }

    /// Switch the active room: old-room content is cleared *before* the
    /// join command exists, and the viewport is pinned so the new room's
    /// first messages land in view.
    pub fn switch_room(&mut self, room_id: u32) -> Command {
        self.transcript.clear();
        self.roster.clear();
        self.viewport.force_follow();
        self.room = Some(room_id);
        Command::Join(room_id)
    }
}

// ---------------------------------------------------------------------------
// Input events
// ---------------------------------------------------------------------------

/// One event from the terminal side of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A typed line: chat text or a slash command.
    Line(String),
    ScrollUp(usize),
    ScrollDown(usize),
    /// Terminal resize to this many viewport rows.
    Resize(usize),
    /// Graceful shutdown (Ctrl-C / EOF) — the page-unload of a terminal.
    Shutdown,
}

/// Why a connected session ended.
enum SessionEnd {
    /// Closed or errored — the reconnect rule applies.
    Disconnected,
    /// User shutdown — no reconnect.
    Shutdown,
}

// ---------------------------------------------------------------------------
// ChatClient — connection supervisor
// ---------------------------------------------------------------------------

/// The chat client engine: dials the derived endpoint, pumps frames into
/// [`ClientState`], forwards typed input as outbound commands, and owns the
/// reconnect loop.
pub struct ChatClient {
    config: Config,
    endpoint: String,
    pub state: ClientState,
    /// When set, rendered screens are sent here instead of drawn to stdout.
    pub screen_tx: Option<mpsc::UnboundedSender<String>>,
}

impl ChatClient {
    pub fn new(config: Config, rows: usize) -> Result<Self, ChatError> {
        let endpoint = config.endpoint()?;
        let mut state = ClientState::new(rows);
        state.room = config.initial_room();
        Ok(Self {
            config,
            endpoint,
            state,
            screen_tx: None,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run until the input side shuts down. Every disconnect — dial
    /// failure, abnormal closure, clean server close — funnels into the
    /// same fixed-delay reconnect; only [`InputEvent::Shutdown`] exits.
    pub async fn run(
        &mut self,
        input_rx: &mut mpsc::UnboundedReceiver<InputEvent>,
    ) -> Result<(), ChatError> {
        self.state
            .transcript
            .push_notice("Connecting to SneedChat...", now_secs() as i64);
        self.redraw();

        loop {
            match self.session(input_rx).await {
                SessionEnd::Shutdown => {
                    info!("client shut down");
                    return Ok(());
                }
                SessionEnd::Disconnected => {
                    self.state
                        .transcript
                        .push_notice("Connection closed by remote server.", now_secs() as i64);
                    self.redraw();
                    debug!(
                        delay_secs = self.config.reconnect_delay_secs,
                        "scheduling reconnect"
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.reconnect_delay_secs)).await;
                }
            }
        }
    }

    /// One connection attempt and, if it succeeds, one connected session.
    async fn session(
        &mut self,
        input_rx: &mut mpsc::UnboundedReceiver<InputEvent>,
    ) -> SessionEnd {
        let ws = match connect_async(&self.endpoint).await {
            Ok((ws, _response)) => ws,
            Err(err) => {
                warn!(endpoint = %self.endpoint, %err, "connect failed");
                return SessionEnd::Disconnected;
            }
        };
        info!(endpoint = %self.endpoint, "connected");
        let (mut sink, mut stream) = ws.split();

        // Re-enter the active room on a fresh socket. switch_room clears the
        // stale transcript so old-room content never interleaves with the
        // rejoined room's history.
        match self.state.room {
            Some(room_id) => {
                let join = self.state.switch_room(room_id);
                self.state
                    .transcript
                    .push_notice(&format!("Connected to room {room_id}!"), now_secs() as i64);
                if sink.send(WsMessage::Text(join.to_wire())).await.is_err() {
                    return SessionEnd::Disconnected;
                }
            }
            None => {
                self.state
                    .transcript
                    .push_notice("Connected! You may now join a room.", now_secs() as i64);
            }
        }
        self.redraw();

        let mut follow_tick =
            tokio::time::interval(Duration::from_millis(self.config.follow_tick_ms.max(1)));

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        self.state.apply_frame(parse_frame(&text), now_secs());
                        self.redraw();
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        return SessionEnd::Disconnected;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong handled by tungstenite; binary ignored.
                    }
                    Some(Err(err)) => {
                        warn!(%err, "socket error");
                        return SessionEnd::Disconnected;
                    }
                },
                event = input_rx.recv() => match event {
                    None | Some(InputEvent::Shutdown) => {
                        // Normal closure; the run loop never sees a
                        // Disconnected, so no reconnect fires.
                        let _ = sink
                            .send(WsMessage::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: "client exit".into(),
                            })))
                            .await;
                        return SessionEnd::Shutdown;
                    }
                    Some(event) => {
                        if let Some(command) = self.handle_input(event) {
                            if let Err(err) = sink.send(WsMessage::Text(command.to_wire())).await {
                                warn!(%err, "send failed");
                                return SessionEnd::Disconnected;
                            }
                        }
                        self.redraw();
                    }
                },
                _ = follow_tick.tick() => {
                    if self.state.viewport.tick() {
                        self.redraw();
                    }
                }
            }
        }
    }

    /// Turn one input event into at most one outbound command.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<Command> {
        match event {
            InputEvent::Line(line) => self.handle_line(&line),
            InputEvent::ScrollUp(rows) => {
                let total = self.state.transcript.len();
                self.state.viewport.scroll_up(rows, total);
                None
            }
            InputEvent::ScrollDown(rows) => {
                self.state.viewport.scroll_down(rows);
                None
            }
            InputEvent::Resize(rows) => {
                self.state.viewport.resize(rows);
                None
            }
            InputEvent::Shutdown => None,
        }
    }

    /// Map a typed line to an outbound command.
    ///
    /// The server owns slash-command parsing; locally we only build the
    /// strings. The exceptions are `/join` (room ids must at least be
    /// positive integers before we touch the network), `/edit` (the client
    /// constructs the JSON fragment; with no replacement text it echoes the
    /// message's unrendered source locally), and the local `/up`–`/down`
    /// viewport commands which never reach the wire.
    pub fn handle_line(&mut self, line: &str) -> Option<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(arg) = trimmed.strip_prefix("/join ") {
            return match parse_room_id(arg) {
                Some(room_id) => Some(self.state.switch_room(room_id)),
                None => {
                    warn!(room = arg, "rejected /join: not a positive integer room id");
                    None
                }
            };
        }

        if let Some(arg) = trimmed.strip_prefix("/delete ") {
            if let Ok(id) = arg.trim().parse::<u32>() {
                return Some(Command::Delete(id));
            }
            // Let the server answer with its own diagnostic.
            return Some(Command::Say(trimmed.to_string()));
        }

        if let Some(arg) = trimmed.strip_prefix("/edit ") {
            // `/edit <id> <new text>` — the client builds the JSON fragment.
            // A bare `/edit <id>` echoes the message's unrendered source as a
            // local line, so the user can copy it, tweak it and resend.
            let mut parts = arg.splitn(2, ' ');
            match (
                parts.next().and_then(|id| id.parse::<u32>().ok()),
                parts.next(),
            ) {
                (Some(id), Some(message)) => {
                    return Some(Command::Edit {
                        id,
                        message: message.trim().to_string(),
                    });
                }
                (Some(id), None) => {
                    let prefill = self
                        .state
                        .transcript
                        .get(id)
                        .map(|entry| format!("/edit {id} {}", entry.raw));
                    match prefill {
                        Some(line) => {
                            self.state.transcript.push_notice(&line, now_secs() as i64)
                        }
                        None => warn!(id, "no displayed message with that id to edit"),
                    }
                    return None;
                }
                _ => return Some(Command::Say(trimmed.to_string())),
            }
        }

        if trimmed == "/up" || trimmed.starts_with("/up ") {
            let rows = trimmed[3..].trim().parse::<usize>().unwrap_or(1);
            self.handle_input(InputEvent::ScrollUp(rows));
            return None;
        }
        if trimmed == "/down" || trimmed.starts_with("/down ") {
            let rows = trimmed[5..].trim().parse::<usize>().unwrap_or(1);
            self.handle_input(InputEvent::ScrollDown(rows));
            return None;
        }

        Some(Command::Say(trimmed.to_string()))
    }

    /// Repaint the whole screen: presence row, separator, visible window.
    fn redraw(&mut self) {
        let now = now_secs();
        let mut screen = String::new();

        let users: Vec<String> = self
            .state
            .roster
            .entries()
            .iter()
            .map(|e| format_presence(e, now))
            .collect();
        screen.push_str(&users.join("  "));
        screen.push('\n');
        screen.push_str(&"─".repeat(40));
        screen.push('\n');

        let lines: Vec<String> = self
            .state
            .transcript
            .entries()
            .iter()
            .map(format_entry)
            .collect();
        for line in self.state.viewport.visible(&lines) {
            screen.push_str(line);
            screen.push('\n');
        }

        match &self.screen_tx {
            Some(tx) => {
                let _ = tx.send(screen);
            }
            None => {
                // Clear, home, repaint.
                print!("\x1b[2J\x1b[H{screen}");
                let _ = io::stdout().flush();
            }
        }
    }
}
