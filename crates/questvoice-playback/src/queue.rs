//! Speech request queue.
//!
//! Pure synchronous FIFO with no locking, no I/O and no tracing; the
//! playback engine owns synchronization.
//!
//! An id never appears twice: [`SpeechQueue::push_back`] refuses duplicates
//! and [`SpeechQueue::push_front`] moves an existing entry to the head.

use std::collections::VecDeque;

use questvoice_core::{SpeechRequest, SpeechRequestId};

#[derive(Debug, Default)]
pub struct SpeechQueue {
    pending: VecDeque<SpeechRequest>,
}

impl SpeechQueue {
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if a request id is currently queued.
    pub fn contains(&self, id: &SpeechRequestId) -> bool {
        self.pending.iter().any(|request| &request.id == id)
    }

    /// Append a request.
    ///
    /// Returns its zero-based position, or `None` if the id is already queued.
    pub fn push_back(&mut self, request: SpeechRequest) -> Option<usize> {
        if self.contains(&request.id) {
            return None;
        }
        self.pending.push_back(request);
        Some(self.pending.len() - 1)
    }

    /// Insert a request at the head, replacing any queued entry for the same id.
    pub fn push_front(&mut self, request: SpeechRequest) {
        self.remove(&request.id);
        self.pending.push_front(request);
    }

    pub fn pop_front(&mut self) -> Option<SpeechRequest> {
        self.pending.pop_front()
    }

    /// Remove a queued request. Returns whether it was present.
    pub fn remove(&mut self, id: &SpeechRequestId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|request| &request.id != id);
        self.pending.len() != before
    }

    /// Drop everything. Returns how many requests were discarded.
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Queued ids in service order.
    pub fn ids(&self) -> Vec<SpeechRequestId> {
        self.pending.iter().map(|request| request.id.clone()).collect()
    }
}
