//! Process-wide request counter.
//!
//! Increment and read happen in a single atomic operation, so concurrent
//! handlers each observe a distinct value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Count of requests served since the process started.
///
/// Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    served: Arc<AtomicU64>,
}

impl RequestCounter {
    /// Create a counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more request.
    ///
    /// Returns the new total, so the first request observes 1.
    pub fn increment(&self) -> u64 {
        self.served.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the number of requests counted so far.
    pub fn current(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }
}
