//! Request context: cancellation flag plus optional deadline.
//!
//! Clones (and contexts derived with `with_timeout` / `with_deadline`) share
//! one cancellation flag; cancelling any of them cancels all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct Ctx {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Ctx {
    /// Never cancelled unless `cancel` is called; no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derived context expiring `timeout` from now (or earlier, if the parent
    /// deadline comes first).
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, at: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(at),
            None => at,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Cancelled` if cancelled, else `DeadlineExceeded` if past the deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Ctx::background();
        assert_eq!(ctx.check(), Ok(()));
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_with_clones() {
        let ctx = Ctx::background();
        let derived = ctx.with_timeout(Duration::from_secs(60));
        derived.cancel();
        assert_eq!(ctx.check(), Err(Error::Cancelled));
        assert_eq!(derived.check(), Err(Error::Cancelled));
    }

    #[test]
    fn expired_deadline() {
        let ctx = Ctx::background().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.check(), Err(Error::DeadlineExceeded));
        // Cancellation takes precedence over expiry.
        ctx.cancel();
        assert_eq!(ctx.check(), Err(Error::Cancelled));
    }

    #[test]
    fn child_deadline_never_extends_parent() {
        let parent = Ctx::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
