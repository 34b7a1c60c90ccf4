//! Global concurrency limiter for fetch attempts
//!
//! One counting permit gate shared by every fetch attempt in the run,
//! regardless of how many listing tasks a page fans out. Wakeup order is
//! FIFO-ish (tokio semaphore fairness); nothing stronger is guaranteed.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting permit gate with fixed capacity.
#[derive(Clone)]
pub struct FetchLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl FetchLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Suspends until a permit is free. Dropping the permit releases it.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed")
    }
}
