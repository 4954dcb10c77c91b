use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::NetworkError;

/// Cancellation signal threaded through every outbound request.
///
/// Clones share the same flag, so a handle kept by the caller can stop a
/// scan running elsewhere. An optional deadline caps the whole scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires `budget` from now.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with `NetworkError::Cancelled` once the token has fired.
    pub fn check(&self) -> Result<(), NetworkError> {
        if self.is_cancelled() {
            Err(NetworkError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Clamp a per-request timeout to whatever is left of the deadline.
    pub fn clamp(&self, timeout: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
            None => timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(token.check().is_ok());
        handle.cancel();
        assert_eq!(token.check(), Err(NetworkError::Cancelled));
    }

    #[test]
    fn expired_deadline_cancels() {
        let token = CancelToken::with_deadline(Duration::ZERO);
        assert!(token.is_cancelled());
        assert_eq!(token.clamp(Duration::from_secs(8)), Duration::ZERO);
    }

    #[test]
    fn clamp_without_deadline_is_identity() {
        let token = CancelToken::new();
        assert_eq!(token.clamp(Duration::from_secs(8)), Duration::from_secs(8));
    }
}
