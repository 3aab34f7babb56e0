// src/services/dashboard.rs
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::HybridView;

#[derive(Default)]
struct Published {
    views: Vec<HybridView>,
    updated_at: Option<DateTime<Utc>>,
}

/// Latest published collection, written by the bus subscriber and read by
/// the HTTP handlers.
#[derive(Default)]
pub struct DashboardState {
    inner: RwLock<Published>,
}

impl DashboardState {
    pub fn new(views: Vec<HybridView>) -> Self {
        DashboardState {
            inner: RwLock::new(Published {
                views,
                updated_at: Some(Utc::now()),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Published> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Published> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replaces the collection wholesale.
    pub fn replace(&self, views: Vec<HybridView>) {
        let mut published = self.write();
        published.views = views;
        published.updated_at = Some(Utc::now());
    }

    pub fn views(&self) -> Vec<HybridView> {
        self.read().views.clone()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.read().updated_at
    }

    pub fn find(&self, symbol: &str) -> Option<HybridView> {
        let symbol = symbol.trim();
        self.read()
            .views
            .iter()
            .find(|v| {
                v.base_data
                    .listing_code()
                    .map_or(false, |c| c.eq_ignore_ascii_case(symbol))
            })
            .cloned()
    }
}
