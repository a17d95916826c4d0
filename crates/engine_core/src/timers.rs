//! Delayed actions keyed by purpose.
//!
//! Every "wait" in the simulation (reload completion, jump cooldown, recoil
//! burst window, dry-fire debounce) is a pending entry in a [`DelayedActions`]
//! registry. Arming a key that is already pending evicts the old entry first,
//! so at most one action per purpose is ever in flight. The registry never runs
//! callbacks itself: [`DelayedActions::tick`] hands back the keys that came due
//! and the owner dispatches on them, which keeps completions inside the owner's
//! own `&mut self` borrow.

/// A pending timer registry keyed by purpose.
#[derive(Debug, Clone)]
pub struct DelayedActions<K> {
    pending: Vec<(K, f32)>,
}

impl<K> Default for DelayedActions<K> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> DelayedActions<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to come due after `delay` seconds, cancelling any pending action with the same key.
    pub fn arm(&mut self, key: K, delay: f32) {
        self.cancel(key);
        self.pending.push((key, delay.max(0.0)));
    }

    /// Cancel a pending action. Returns true if one was pending.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| *k != key);
        before != self.pending.len()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.iter().any(|(k, _)| *k == key)
    }

    /// Seconds left before `key` comes due, if pending.
    pub fn remaining(&self, key: K) -> Option<f32> {
        self.pending
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, remaining)| *remaining)
    }

    /// Advance all timers by `dt` and return the keys that came due, in arm order.
    pub fn tick(&mut self, dt: f32) -> Vec<K> {
        let mut due = Vec::new();
        self.pending.retain_mut(|(key, remaining)| {
            *remaining -= dt;
            if *remaining <= 0.0 {
                due.push(*key);
                false
            } else {
                true
            }
        });
        due
    }

    /// Drop every pending action.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
