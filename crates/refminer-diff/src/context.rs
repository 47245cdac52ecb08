use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{DiffError, Result};

/// Cancellation and deadline for one detection run.
///
/// Cheap to clone; clones share the cancellation token. Detection calls
/// [`DetectionContext::check`] at the top of every per-operation loop and for
/// every call-tree node it visits.
#[derive(Clone, Debug)]
pub struct DetectionContext {
    cancel: CancellationToken,
    started: Instant,
    deadline: Option<Instant>,
}

impl Default for DetectionContext {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl DetectionContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            deadline: None,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = self.started + timeout;
        self.with_deadline(deadline)
    }

    /// Applies an optional timeout, as read from configuration.
    pub fn with_optional_timeout(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => self.with_timeout(timeout),
            None => self,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns an error once the token is cancelled or the deadline passed.
    pub fn check(&self, phase: &'static str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DiffError::Cancelled { phase });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                let elapsed_ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
                return Err(DiffError::Timeout { phase, elapsed_ms });
            }
        }
        Ok(())
    }
}
