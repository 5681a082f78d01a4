use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Teardown token shared between a screen and its host.
///
/// Clones observe the same flag. Once closed, results of operations that were
/// still awaiting are dropped: no UI state changes and no navigation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    closed: Arc<AtomicBool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear the session down. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
