//! The user-activity list shown beside the message stream.

use crate::wire::PresenceUpdate;
use tracing::debug;

/// A user counts as active for this long after their last activity.
pub const ACTIVE_WINDOW_SECS: u64 = 30;

/// One visible presence row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub id: u32,
    pub username: String,
    pub avatar_url: String,
    /// Seconds since epoch.
    pub last_activity: u64,
}

impl PresenceEntry {
    pub fn is_active(&self, now: u64) -> bool {
        now.saturating_sub(self.last_activity) <= ACTIVE_WINDOW_SECS
    }
}

/// Presence entries keyed by author id, kept in display order.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<PresenceEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `users` map entry: an activity object upserts, `false`
    /// removes. `now` supplies `last_activity` when the server omits it.
    pub fn apply(&mut self, id: u32, update: &PresenceUpdate, now: u64) {
        match update {
            PresenceUpdate::Active(activity) => {
                let entry = PresenceEntry {
                    id,
                    username: activity.username.clone(),
                    avatar_url: activity.avatar_url.clone(),
                    last_activity: activity.last_activity.unwrap_or(now),
                };
                match self.entries.iter_mut().find(|e| e.id == id) {
                    Some(existing) => *existing = entry,
                    None => self.entries.push(entry),
                }
            }
            PresenceUpdate::Gone(false) => {
                self.entries.retain(|e| e.id != id);
            }
            PresenceUpdate::Gone(true) => {
                // Only `false` means removal; the server never sends `true`.
                debug!(user_id = id, "ignoring unexpected `true` presence value");
            }
        }
    }

    /// Full re-sort: active-within-window entries first, then ties by
    /// case-insensitive username ascending. The sort is stable, so equal
    /// keys keep their arrival order.
    pub fn resort(&mut self, now: u64) {
        self.entries
            .sort_by_key(|e| (!e.is_active(now), e.username.to_lowercase()));
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

    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    pub fn get(&self, id: u32) -> Option<&PresenceEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::UserActivity;

    fn active(name: &str, last_activity: u64) -> PresenceUpdate {
        PresenceUpdate::Active(UserActivity {
            username: name.to_string(),
            avatar_url: String::new(),
            last_activity: Some(last_activity),
        })
    }

    #[test]
    fn test_apply_inserts_then_updates() {
        let mut r = Roster::new();
        r.apply(5, &active("ann", 100), 100);
        r.apply(5, &active("ann", 120), 120);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(5).unwrap().last_activity, 120);
    }

    #[test]
    fn test_apply_false_removes() {
        let mut r = Roster::new();
        r.apply(5, &active("ann", 100), 100);
        r.apply(5, &PresenceUpdate::Gone(false), 100);
        assert!(r.is_empty());
    }

    #[test]
    fn test_apply_true_is_ignored() {
        let mut r = Roster::new();
        r.apply(5, &active("ann", 100), 100);
        r.apply(5, &PresenceUpdate::Gone(true), 100);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_missing_last_activity_defaults_to_now() {
        let mut r = Roster::new();
        r.apply(
            5,
            &PresenceUpdate::Active(UserActivity {
                username: "ann".to_string(),
                avatar_url: String::new(),
                last_activity: None,
            }),
            777,
        );
        assert_eq!(r.get(5).unwrap().last_activity, 777);
    }

    #[test]
    fn test_resort_active_before_stale() {
        let mut r = Roster::new();
        let now = 1000;
        r.apply(1, &active("stale", now - 120), now);
        r.apply(2, &active("fresh", now - 5), now);
        r.resort(now);
        assert_eq!(r.entries()[0].username, "fresh");
        assert_eq!(r.entries()[1].username, "stale");
    }

    #[test]
    fn test_resort_ties_by_name_case_insensitive() {
        let mut r = Roster::new();
        let now = 1000;
        r.apply(1, &active("zeta", now), now);
        r.apply(2, &active("Alpha", now), now);
        r.apply(3, &active("beta", now), now);
        r.resort(now);
        let names: Vec<_> = r.entries().iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_resort_boundary_of_window() {
        let mut r = Roster::new();
        let now = 1000;
        // Exactly 30 seconds old still counts as active; 31 does not.
        r.apply(1, &active("edge", now - ACTIVE_WINDOW_SECS), now);
        r.apply(2, &active("aged", now - ACTIVE_WINDOW_SECS - 1), now);
        r.resort(now);
        assert_eq!(r.entries()[0].username, "edge");
        assert_eq!(r.entries()[1].username, "aged");
    }

    #[test]
    fn test_resort_is_stable_for_equal_keys() {
        let mut r = Roster::new();
        let now = 1000;
        r.apply(1, &active("same", now), now);
        r.apply(2, &active("same", now), now);
        r.resort(now);
        assert_eq!(r.entries()[0].id, 1);
        assert_eq!(r.entries()[1].id, 2);
    }

    #[test]
    fn test_clear() {
        let mut r = Roster::new();
        r.apply(1, &active("ann", 100), 100);
        r.clear();
        assert!(r.is_empty());
    }
}
