//! Fault-isolated subscriber lists.
//!
//! The timer engine, the statistics engine, and the store all notify
//! observers through a `CallbackList`. Each invocation is wrapped in
//! `catch_unwind` so one panicking subscriber cannot prevent the rest
//! from being notified or corrupt the notifying component's state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide so identifiers stay unique across detach/reattach cycles.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by every `on_*` registration; pass it back to
/// the matching `unsubscribe_*` to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

pub(crate) struct CallbackList<T> {
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for CallbackList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> CallbackList<T> {
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if the id is not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Invoke every subscriber in registration order. A panicking
    /// subscriber is logged and skipped; the rest still run.
    pub fn notify(&mut self, value: &T) {
        for (id, callback) in &mut self.entries {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                tracing::warn!(subscriber = ?id, "subscriber panicked during notification");
            }
        }
    }

    /// Move the list out of its slot, leaving an empty one behind.
    ///
    /// Used when dispatch happens behind a `RefCell`: the borrow is
    /// released before subscribers run, so a subscriber may safely call
    /// back into the owner.
    pub fn detach(&mut self) -> CallbackList<T> {
        std::mem::take(self)
    }

    /// Put a detached list back, keeping subscriptions added meanwhile.
    pub fn reattach(&mut self, mut detached: CallbackList<T>) {
        detached.entries.append(&mut self.entries);
        self.entries = detached.entries;
    }
}
