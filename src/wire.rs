//! Wire types for the chat socket.
//!
//! Inbound frames are UTF-8 text: either JSON carrying up to three update
//! batches (`messages`, `delete`, `users`) or a bare string the server wants
//! displayed verbatim. Outbound frames are plain text — chat lines as typed,
//! control commands as slash-prefixed strings. The server owns command
//! parsing; the client only constructs the strings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message author as the server describes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u32,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// One message record inside a `messages` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub message_id: u32,
    /// Rendered, HTML-safe body.
    pub message: String,
    /// Unrendered body, kept for re-editing. Absent on older servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_raw: Option<String>,
    /// Seconds since epoch.
    pub message_date: i64,
    /// `None` marks a server-issued system message.
    #[serde(default)]
    pub author: Option<Author>,
}

/// Presence payload for one user inside a `users` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Seconds since epoch. Absent on older servers; the client falls back
    /// to the local receipt time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<u64>,
}

/// A `users` map value: an activity object, or `false` to drop the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresenceUpdate {
    Active(UserActivity),
    Gone(bool),
}

/// The JSON shape of an inbound update frame. All three batches are
/// independent and optional; an empty object is a valid no-op frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub users: HashMap<u32, PresenceUpdate>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Update(Update),
    /// Anything that didn't parse as an update — displayed as a system line.
    Notice(String),
}

/// Decode one inbound text frame.
///
/// Malformed JSON is not an error: the server sends bare display strings on
/// the same socket, so anything unparseable degrades to a [`Frame::Notice`].
pub fn parse_frame(text: &str) -> Frame {
    match serde_json::from_str::<Update>(text) {
        Ok(update) => Frame::Update(update),
        Err(_) => Frame::Notice(text.to_string()),
    }
}

/// An outbound command, serialized to the plain-text wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A chat line, sent verbatim.
    Say(String),
    Join(u32),
    Delete(u32),
    Edit { id: u32, message: String },
}

impl Command {
    /// The exact string written to the socket.
    pub fn to_wire(&self) -> String {
        match self {
            Command::Say(text) => text.clone(),
            Command::Join(room_id) => format!("/join {room_id}"),
            Command::Delete(message_id) => format!("/delete {message_id}"),
            Command::Edit { id, message } => {
                let fragment = serde_json::json!({ "id": id, "message": message });
                format!("/edit {fragment}")
            }
        }
    }
}

/// Validate a join target. The server enforces the real semantics; the
/// client only rejects ids that cannot be a room at all.
pub fn parse_room_id(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}
