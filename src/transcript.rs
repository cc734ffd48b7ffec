//! The displayed message list and its reconciliation rules.
//!
//! ## Design
//! - One `Vec<Entry>` in display order, oldest first
//! - Upsert by server id replaces in place (position preserved); unknown ids
//!   append to the end
//! - At most [`RETAIN_LIMIT`] entries; overflow evicts from the front
//! - An entry "continues" its predecessor (author/timestamp chrome is
//!   suppressed when rendering) iff both share an author id and the timestamp
//!   gap is under [`GROUP_WINDOW_SECS`]
//!
//! Continuation is a property of adjacency, so it is recomputed at every
//! point where adjacency changes: the touched index on insert and replace,
//! the successor on delete, and the new front after eviction.

use crate::wire::{Author, WireMessage};
use tracing::warn;

/// Maximum number of entries kept in the visible list.
pub const RETAIN_LIMIT: usize = 200;

/// Same-author messages closer together than this merge into one group.
/// `message_date` is seconds since epoch, so the window is in seconds.
pub const GROUP_WINDOW_SECS: i64 = 30;

/// One displayed line: a server message, or a locally pushed system notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Server-assigned id. Local notices carry none and can never be the
    /// target of an upsert or delete.
    pub id: Option<u32>,
    /// `None` renders as a system line.
    pub author: Option<Author>,
    /// Rendered body.
    pub body: String,
    /// Unrendered body, used to pre-fill an edit.
    pub raw: String,
    /// Seconds since epoch.
    pub timestamp: i64,
    /// Whether this entry merges with its immediate predecessor.
    pub continues: bool,
}

/// Where an upserted message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// An entry with the same id was already displayed and was replaced
    /// without moving.
    Replaced(usize),
    Appended,
}

/// The ordered, bounded message list.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record from a `messages` batch.
    ///
    /// If the id is already displayed the entry is replaced in place — an
    /// edit must not move the message to the end. Otherwise the entry is
    /// appended and the list is trimmed back to [`RETAIN_LIMIT`].
    pub fn upsert(&mut self, msg: WireMessage) -> Placement {
        let entry = Entry {
            id: Some(msg.message_id),
            author: msg.author,
            raw: msg.message_raw.unwrap_or_else(|| msg.message.clone()),
            body: msg.message,
            timestamp: msg.message_date,
            continues: false,
        };

        if let Some(idx) = self.index_of(msg.message_id) {
            self.entries[idx] = entry;
            self.recompute_at(idx);
            self.recompute_at(idx + 1);
            Placement::Replaced(idx)
        } else {
            self.entries.push(entry);
            self.recompute_at(self.entries.len() - 1);
            self.evict();
            Placement::Appended
        }
    }

    /// Apply one id from a `delete` batch.
    ///
    /// Removal changes which entry is "immediately previous" for the
    /// successor, so its continuation flag is recomputed. An id we never
    /// displayed is a stale reference, not a failure: logged and skipped.
    pub fn delete(&mut self, id: u32) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.entries.remove(idx);
                self.recompute_at(idx);
                true
            }
            None => {
                warn!(message_id = id, "delete for a message not on display");
                false
            }
        }
    }

    /// Append a locally generated system line ("Connecting…" and friends).
    pub fn push_notice(&mut self, text: &str, now: i64) {
        self.entries.push(Entry {
            id: None,
            author: None,
            body: text.to_string(),
            raw: text.to_string(),
            timestamp: now,
            continues: false,
        });
        self.evict();
    }

    /// Drop every entry (room switch).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up a displayed message by server id.
    pub fn get(&self, id: u32) -> Option<&Entry> {
        self.index_of(id).map(|idx| &self.entries[idx])
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.id == Some(id))
    }

    /// Recompute the continuation flag of the entry at `idx` against its
    /// current predecessor. Out-of-range indices are a no-op so callers can
    /// blindly pass `idx + 1` after a replace or the removal index after a
    /// delete.
    fn recompute_at(&mut self, idx: usize) {
        if idx >= self.entries.len() {
            return;
        }
        let continues = if idx == 0 {
            false
        } else {
            Self::merges(&self.entries[idx - 1], &self.entries[idx])
        };
        self.entries[idx].continues = continues;
    }

    /// The grouping rule: same author id, gap under the window.
    fn merges(prev: &Entry, next: &Entry) -> bool {
        match (&prev.author, &next.author) {
            (Some(a), Some(b)) => {
                a.id == b.id && next.timestamp - prev.timestamp < GROUP_WINDOW_SECS
            }
            _ => false,
        }
    }

    fn evict(&mut self) {
        let mut evicted = false;
        while self.entries.len() > RETAIN_LIMIT {
            self.entries.remove(0);
            evicted = true;
        }
        if evicted {
            // The surviving front entry has no predecessor any more.
            self.recompute_at(0);
        }
    }
}
