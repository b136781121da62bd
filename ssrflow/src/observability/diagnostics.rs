//! Bounded record of recently handled requests.

use crate::core::{BrowserType, RenderState};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// What the pipeline did with one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Request id.
    pub request_id: Uuid,
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Raw `User-Agent` header.
    pub user_agent: Option<String>,
    /// Client classification.
    pub browser_type: Option<BrowserType>,
    /// Final render state.
    pub state: RenderState,
    /// Status sent.
    pub status: u16,
    /// Cache key.
    pub hash: Option<String>,
    /// Time spent in the pipeline.
    pub elapsed_ms: f64,
    /// When the request finished.
    pub finished_at: DateTime<Utc>,
}

/// Ring buffer of the most recent [`RequestSnapshot`]s.
///
/// Shared by every request; the oldest snapshot is dropped once the buffer
/// is full.
#[derive(Debug)]
pub struct Diagnostics {
    capacity: usize,
    snapshots: RwLock<VecDeque<RequestSnapshot>>,
}

impl Diagnostics {
    /// Creates a buffer holding up to `capacity` snapshots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            snapshots: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Records a snapshot, evicting the oldest if full.
    pub fn record(&self, snapshot: RequestSnapshot) {
        let mut snapshots = self.snapshots.write();
        if snapshots.len() == self.capacity {
            snapshots.pop_front();
        }
        snapshots.push_back(snapshot);
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<RequestSnapshot> {
        self.snapshots.read().back().cloned()
    }

    /// Returns all held snapshots, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<RequestSnapshot> {
        self.snapshots.read().iter().rev().cloned().collect()
    }

    /// Returns the number of held snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every snapshot.
    pub fn clear(&self) {
        self.snapshots.write().clear();
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(16)
    }
}
