use std::collections::HashMap;

use crate::models::{HorseId, PlayerId, Timestamp};

/// A vet's first pick, waiting for the second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSelection {
    pub horse_id: HorseId,
    pub expires_at: Timestamp,
}

/// Per-player breeding selections. Entries expire on their own and are
/// dropped when the player quits or a selected horse dies.
#[derive(Debug, Default)]
pub struct BreedingSessions {
    pending: HashMap<PlayerId, PendingSelection>,
}

impl BreedingSessions {
    pub fn new() -> Self {
        BreedingSessions::default()
    }

    /// Remembers `horse_id` as the player's first pick, replacing any earlier one.
    pub fn select(&mut self, actor: PlayerId, horse_id: HorseId, expires_at: Timestamp) {
        self.pending.insert(actor, PendingSelection { horse_id, expires_at });
    }

    /// Removes and returns the player's pick if it has not expired at `now`.
    pub fn take(&mut self, actor: PlayerId, now: Timestamp) -> Option<PendingSelection> {
        self.pending.remove(&actor).filter(|selection| selection.expires_at > now)
    }

    pub fn pending(&self, actor: PlayerId) -> Option<&PendingSelection> {
        self.pending.get(&actor)
    }

    pub fn cancel(&mut self, actor: PlayerId) -> bool {
        self.pending.remove(&actor).is_some()
    }

    /// Drops every selection that points at `horse_id`.
    pub fn forget_horse(&mut self, horse_id: HorseId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, selection| selection.horse_id != horse_id);
        before - self.pending.len()
    }

    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, selection| selection.expires_at > now);
        let purged = before - self.pending.len();
        if purged > 0 {
            log::debug!("🐴 Expired {} breeding selections", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selections_expire() {
        let mut sessions = BreedingSessions::new();
        let start = Timestamp::from_secs_since_unix_epoch(100);
        sessions.select(PlayerId(1), HorseId(5), start.plus_secs(60));
        sessions.select(PlayerId(2), HorseId(6), start.plus_secs(10));

        assert_eq!(sessions.purge_expired(start.plus_secs(10)), 1);
        assert!(sessions.pending(PlayerId(2)).is_none());
        assert_eq!(sessions.take(PlayerId(1), start.plus_secs(60)), None);
        assert!(sessions.is_empty());
    }

    #[test]
    fn take_consumes_the_selection() {
        let mut sessions = BreedingSessions::new();
        let now = Timestamp::from_secs_since_unix_epoch(0);
        sessions.select(PlayerId(1), HorseId(5), now.plus_secs(60));
        assert_eq!(sessions.take(PlayerId(1), now).map(|s| s.horse_id), Some(HorseId(5)));
        assert_eq!(sessions.take(PlayerId(1), now), None);
    }

    #[test]
    fn dead_horses_and_quitting_players_clear_selections() {
        let mut sessions = BreedingSessions::new();
        let later = Timestamp::from_secs_since_unix_epoch(500);
        sessions.select(PlayerId(1), HorseId(5), later);
        sessions.select(PlayerId(2), HorseId(5), later);
        sessions.select(PlayerId(3), HorseId(9), later);

        assert_eq!(sessions.forget_horse(HorseId(5)), 2);
        assert!(sessions.cancel(PlayerId(3)));
        assert!(!sessions.cancel(PlayerId(3)));
        assert!(sessions.is_empty());
    }
}
