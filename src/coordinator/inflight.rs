//! In-flight marker table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::types::records::{InFlightMarker, RestaurantId};

/// Set of restaurants with a computation in flight.
///
/// The only shared mutable state of the coordinator. Acquiring a marker is a
/// single check-and-insert under the lock, so two callers can never both see
/// "no marker" for the same restaurant.
#[derive(Debug, Default)]
pub struct InFlightTable {
    markers: Mutex<HashMap<RestaurantId, InFlightMarker>>,
    settled: Notify,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RestaurantId, InFlightMarker>> {
        // Map operations cannot leave it half-updated, so poisoning is ignored
        self.markers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a marker for `id` unless one already exists.
    ///
    /// Returns a guard that removes the marker when dropped, or `None` when a
    /// computation for `id` is already in flight.
    pub fn try_acquire(
        self: &Arc<Self>,
        id: &RestaurantId,
        now: DateTime<Utc>,
    ) -> Option<InFlightGuard> {
        let mut markers = self.lock();
        if markers.contains_key(id) {
            return None;
        }

        let marker = InFlightMarker::new(id.clone(), now);
        markers.insert(id.clone(), marker.clone());

        Some(InFlightGuard {
            table: Arc::clone(self),
            marker,
        })
    }

    pub fn contains(&self, id: &RestaurantId) -> bool {
        self.lock().contains_key(id)
    }

    /// Marker for `id`, if a computation is running.
    pub fn get(&self, id: &RestaurantId) -> Option<InFlightMarker> {
        self.lock().get(id).cloned()
    }

    /// Snapshot of every marker, oldest first.
    pub fn markers(&self) -> Vec<InFlightMarker> {
        let mut markers: Vec<_> = self.lock().values().cloned().collect();
        markers.sort_by_key(|m| m.started_at);
        markers
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolves once no marker exists for `id`.
    pub async fn wait_settled(&self, id: &RestaurantId) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.contains(id) {
                return;
            }
            notified.await;
        }
    }

    fn release(&self, marker: &InFlightMarker) {
        {
            let mut markers = self.lock();
            // Only the attempt that inserted the marker may remove it
            if markers
                .get(&marker.restaurant_id)
                .is_some_and(|m| m.attempt_id == marker.attempt_id)
            {
                markers.remove(&marker.restaurant_id);
            }
        }
        self.settled.notify_waiters();
    }
}

/// Ownership of one in-flight marker. Dropping it removes the marker.
#[derive(Debug)]
pub struct InFlightGuard {
    table: Arc<InFlightTable>,
    marker: InFlightMarker,
}

impl InFlightGuard {
    pub fn marker(&self) -> &InFlightMarker {
        &self.marker
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.release(&self.marker);
    }
}
