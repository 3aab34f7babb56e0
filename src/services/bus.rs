// src/services/bus.rs
use log::error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::models::HybridView;

pub type Subscriber = Arc<dyn Fn(&[HybridView]) + Send + Sync>;

/// Publish/subscribe register for refreshed portfolio collections.
#[derive(Default)]
pub struct SubscriptionBus {
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

/// Handle returned by [`SubscriptionBus::subscribe`]. Dropping it keeps the
/// subscription alive; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    bus: Weak<SubscriptionBus>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl SubscriptionBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // Callbacks run outside the lock, so a poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Subscriber)>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&[HybridView]) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            bus: Arc::downgrade(self),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Calls every subscriber in registration order. A panicking subscriber
    /// is logged and skipped.
    pub fn publish(&self, views: &[HybridView]) {
        // Snapshot so callbacks may (un)subscribe without deadlocking
        let subscribers: Vec<(u64, Subscriber)> = self.lock().clone();

        for (id, callback) in subscribers {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(views))).is_err() {
                error!("Subscriber {} panicked while handling {} views", id, views.len());
            }
        }
    }
}
