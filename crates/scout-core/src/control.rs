use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::DispatchError;

/// Cooperative cancellation flag shared between a caller and an in-flight dispatch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-dispatch cancellation and wall-clock budget.
///
/// Checked before every provider call and before every backoff sleep.
#[derive(Debug, Clone)]
pub struct DispatchControl {
    cancel: CancelToken,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl DispatchControl {
    pub fn new(cancel: CancelToken, budget: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: budget.map(|budget| Instant::now() + budget),
            budget,
        }
    }

    /// No cancellation source and no deadline.
    pub fn unbounded() -> Self {
        Self::new(CancelToken::new(), None)
    }

    pub fn check(&self) -> Result<(), DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(self.deadline_exceeded());
            }
        }
        Ok(())
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn deadline_exceeded(&self) -> DispatchError {
        let budget_ms = self
            .budget
            .map(|budget| budget.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0);
        DispatchError::DeadlineExceeded { budget_ms }
    }
}
