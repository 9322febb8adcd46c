use crate::models::Timestamp;

// One heartbeat per simulated second. Breeding cooldowns count heartbeats.
pub(crate) const GLOBAL_TICK_INTERVAL_SECS: u64 = 1;

// --- Heartbeat counter ---

/// Counts heartbeats and remembers when the last one ran.
///
/// The host owns the clock; this only tracks what the manager has seen so
/// periodic work (maturation) can run every N ticks and a paused heartbeat
/// shows up in the log.
#[derive(Debug, Default, Clone)]
pub struct GlobalTick {
    count: u64,
    last: Option<Timestamp>,
}

impl GlobalTick {
    pub fn new() -> Self {
        GlobalTick::default()
    }

    /// Records a heartbeat at `now` and returns its number (first is 1).
    pub fn advance(&mut self, now: Timestamp) -> u64 {
        if let Some(last) = self.last {
            let gap = now.secs_since(last);
            if gap > GLOBAL_TICK_INTERVAL_SECS * 2 {
                log::debug!("🐴 Heartbeat resumed after {}s; cooldowns were paused meanwhile", gap);
            } else if now < last {
                log::warn!("🐴 Heartbeat clock went backwards ({:?} -> {:?})", last, now);
            }
        }
        self.count += 1;
        self.last = Some(now);
        self.count
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn last(&self) -> Option<Timestamp> {
        self.last
    }

    /// True on every `every`-th heartbeat.
    pub fn is_due(&self, every: u64) -> bool {
        every > 0 && self.count > 0 && self.count % every == 0
    }
}
