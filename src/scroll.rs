//! Autoscroll tracking for the message viewport.
//!
//! Two states: *Following* (new content is pinned into view) and *Anchored*
//! (the reader scrolled up into history; autoscroll is suspended). A
//! periodic tick re-pins the viewport while Following. Room switches and
//! resizes force Following with a one-shot override that swallows the next
//! scroll event, so the synthetic scroll those operations generate cannot
//! immediately re-anchor the view.

/// How close to the bottom (in rows) still counts as "at the bottom".
pub const BOTTOM_TOLERANCE_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Following,
    Anchored,
}

#[derive(Debug)]
pub struct ScrollTracker {
    state: ScrollState,
    force_follow: bool,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTracker {
    /// A fresh viewport starts pinned to the newest content.
    pub fn new() -> Self {
        Self {
            state: ScrollState::Following,
            force_follow: false,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn is_following(&self) -> bool {
        self.state == ScrollState::Following
    }

    /// Feed one user scroll event, given how far from the bottom the
    /// viewport now sits.
    pub fn on_scroll(&mut self, rows_from_bottom: usize) {
        if self.force_follow {
            // One-shot override: consumed here, state untouched.
            self.force_follow = false;
            return;
        }
        self.state = if rows_from_bottom <= BOTTOM_TOLERANCE_ROWS {
            ScrollState::Following
        } else {
            ScrollState::Anchored
        };
    }

    /// Pin to the bottom and arm the one-shot override (room switch,
    /// terminal resize).
    pub fn force_follow(&mut self) {
        self.state = ScrollState::Following;
        self.force_follow = true;
    }

    /// Asked by the periodic tick: should the viewport be re-pinned now?
    pub fn should_pin(&self) -> bool {
        self.is_following()
    }
}
