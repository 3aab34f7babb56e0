// src/services/scheduler.rs
use log::info;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::bus::SubscriptionBus;
use super::merge::HybridMerge;
use crate::models::HybridView;

/// Periodic refresh: re-fetch every holding, then publish the whole
/// collection once. At most one timer runs at a time and ticks never overlap:
/// a tick that comes due while a refresh is in flight is skipped.
pub struct RefreshScheduler {
    merge: Arc<HybridMerge>,
    bus: Arc<SubscriptionBus>,
    period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(merge: Arc<HybridMerge>, bus: Arc<SubscriptionBus>, period: Duration) -> Self {
        RefreshScheduler {
            merge,
            bus,
            period,
            timer: Mutex::new(None),
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Must be called from within a tokio runtime. The first publish happens
    /// one period after the call.
    pub fn start(&self, initial: Vec<HybridView>) {
        let mut timer = self.timer();
        if let Some(previous) = timer.take() {
            info!("Refresh timer already running, restarting");
            previous.abort();
        }

        let merge = Arc::clone(&self.merge);
        let bus = Arc::clone(&self.bus);
        let period = self.period;
        info!(
            "Starting refresh of {} holdings every {}s",
            initial.len(),
            period.as_secs_f64()
        );

        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut views = initial;

            loop {
                ticker.tick().await;
                views = merge.refresh_all(&views).await;
                let live = views.iter().filter(|v| v.live_data.is_some()).count();
                info!("Publishing {} views ({} with live quotes)", views.len(), live);
                bus.publish(&views);
            }
        }));
    }

    /// Cancels the timer. Fetches already in flight finish on their own and
    /// their results are dropped.
    pub fn stop(&self) {
        if let Some(handle) = self.timer().take() {
            handle.abort();
            info!("Refresh timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// One out-of-band refresh, published like a regular tick.
    pub async fn refresh_now(&self, views: &[HybridView]) -> Vec<HybridView> {
        let refreshed = self.merge.refresh_all(views).await;
        info!("Manual refresh of {} views", refreshed.len());
        self.bus.publish(&refreshed);
        refreshed
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
