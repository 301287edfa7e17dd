use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared by every path of one search.
///
/// Clones observe the same flag, so cancelling any clone invalidates all of them at once.
#[derive(Debug, Clone, Default)]
pub struct SearchToken {
    cancelled: Arc<AtomicBool>,
}

impl SearchToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether both tokens belong to the same search.
    pub fn same_search(&self, other: &SearchToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}
