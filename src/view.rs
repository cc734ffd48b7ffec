//! Terminal rendering: entry and roster formatting, plus the windowed
//! viewport that feeds user scrolling into the [`ScrollTracker`].
//!
//! Continuation styling means exactly what it did in the chat widget: a
//! merged message drops its author/timestamp chrome and shows the body
//! alone, indented under the group head.

use crate::roster::PresenceEntry;
use crate::scroll::ScrollTracker;
use crate::transcript::Entry;
use colored::Colorize;

/// Indent applied to continuation lines in place of the author column.
const CONTINUATION_PAD: &str = "        │ ";

/// UTC wall-clock `HH:MM` for an epoch-seconds timestamp.
fn clock(timestamp: i64) -> String {
    let day_secs = timestamp.rem_euclid(86_400);
    format!("{:02}:{:02}", day_secs / 3_600, (day_secs % 3_600) / 60)
}

/// Render one transcript entry as a terminal line.
pub fn format_entry(entry: &Entry) -> String {
    match &entry.author {
        None => format!("{} {}", "*".dimmed(), entry.body.dimmed()),
        Some(_) if entry.continues => {
            format!("{}{}", CONTINUATION_PAD.dimmed(), entry.body)
        }
        Some(author) => format!(
            "{} {} {}",
            clock(entry.timestamp).dimmed(),
            format!("<{}>", author.username).cyan().bold(),
            entry.body
        ),
    }
}

/// Render one presence row. Stale users keep their place in the list but
/// are visibly idle.
pub fn format_presence(entry: &PresenceEntry, now: u64) -> String {
    if entry.is_active(now) {
        format!("{} {}", "●".green(), entry.username)
    } else {
        format!("{} {}", "○".dimmed(), entry.username.as_str().dimmed())
    }
}

/// A fixed-height window over the rendered transcript.
///
/// The window's distance from the bottom is the scroll position; every user
/// scroll is forwarded to the tracker, and the follow tick re-pins the
/// window while the tracker is in Following.
#[derive(Debug)]
pub struct Viewport {
    pub tracker: ScrollTracker,
    height: usize,
    rows_from_bottom: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            tracker: ScrollTracker::new(),
            height: height.max(1),
            rows_from_bottom: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows_from_bottom(&self) -> usize {
        self.rows_from_bottom
    }

    /// User scrolled up into history.
    pub fn scroll_up(&mut self, rows: usize, total_lines: usize) {
        let max_offset = total_lines.saturating_sub(self.height);
        self.rows_from_bottom = (self.rows_from_bottom + rows).min(max_offset);
        self.tracker.on_scroll(self.rows_from_bottom);
    }

    /// User scrolled back toward the newest content.
    pub fn scroll_down(&mut self, rows: usize) {
        self.rows_from_bottom = self.rows_from_bottom.saturating_sub(rows);
        self.tracker.on_scroll(self.rows_from_bottom);
    }

    /// Terminal resize: adopt the new height and force-follow, same as the
    /// chat widget did on window resize.
    pub fn resize(&mut self, height: usize) {
        self.height = height.max(1);
        self.rows_from_bottom = 0;
        self.tracker.force_follow();
    }

    /// Room switch pin: jump to the bottom and arm the one-shot override.
    pub fn force_follow(&mut self) {
        self.rows_from_bottom = 0;
        self.tracker.force_follow();
    }

    /// The periodic follow tick. Returns true when the window moved.
    pub fn tick(&mut self) -> bool {
        if self.tracker.should_pin() && self.rows_from_bottom != 0 {
            self.rows_from_bottom = 0;
            true
        } else {
            false
        }
    }

    /// The slice of rendered lines currently in the window.
    pub fn visible<'a>(&self, lines: &'a [String]) -> &'a [String] {
        let end = lines.len().saturating_sub(self.rows_from_bottom);
        let start = end.saturating_sub(self.height);
        &lines[start..end]
    }
}
