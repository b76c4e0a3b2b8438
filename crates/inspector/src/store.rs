//! In-memory request log

use crate::snapshot::RequestSnapshot;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

/// Newest-first log of captured requests
///
/// Shared between the capture path and the inspection endpoint through an
/// `Arc`. Every access goes through one `RwLock`; a poisoned lock is
/// recovered since entries are only ever inserted whole.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: RwLock<VecDeque<Arc<RequestSnapshot>>>,
    max_entries: Option<usize>,
}

impl RequestLog {
    /// Create an unbounded log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that keeps at most `max_entries` snapshots, dropping the oldest
    pub fn bounded(max_entries: usize) -> Self {
        Self::with_max_entries(Some(max_entries))
    }

    /// Create a log with an optional bound
    pub fn with_max_entries(max_entries: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(
                max_entries.unwrap_or(0).min(1000),
            )),
            max_entries,
        }
    }

    /// Configured bound, if any
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// Insert a snapshot at the front
    pub fn prepend(&self, snapshot: RequestSnapshot) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(max) = self.max_entries {
            if max == 0 {
                return;
            }
            while entries.len() >= max {
                entries.pop_back();
            }
        }
        entries.push_front(Arc::new(snapshot));
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every snapshot
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// All snapshots, newest first
    pub fn entries(&self) -> Vec<Arc<RequestSnapshot>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Total count and the `len`-long window starting at `offset`
    ///
    /// Both come from the same read guard, so they are mutually consistent.
    pub fn page(&self, offset: usize, len: usize) -> (usize, Vec<Arc<RequestSnapshot>>) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let total = entries.len();
        let window = entries.iter().skip(offset).take(len).cloned().collect();
        (total, window)
    }
}
