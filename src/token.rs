use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token.
///
/// A token is a monotonic flag (false to true, never reset) with an optional
/// parent link. [`is_cancelled`][CancelToken::is_cancelled] consults the
/// whole ancestor chain, so cancelling one token cancels every task holding
/// a descendant token. The solver's stop signal is the root of every chain;
/// each scheduled child task gets its own [`child`][CancelToken::child]
/// token so that siblings can be cancelled individually.
///
/// Cancellation is cooperative, not preemptive: a running task observes the
/// token at its next node-entry check.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    /// A fresh root token, initially not cancelled.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Derive a token cancelled whenever `self` (or any ancestor) is.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            parent: Some(Arc::clone(self)),
        })
    }

    /// Request cancellation of this token and all its descendants.
    /// Idempotent and safe to call from any number of threads.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut token = self;
        loop {
            if token.cancelled.load(Ordering::Relaxed) {
                return true;
            }
            match &token.parent {
                Some(parent) => token = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_parent_cancels_descendants() {
        let root = CancelToken::new();
        let child = root.child();
        let grandchild = child.child();

        assert!(!grandchild.is_cancelled());
        root.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn test_child_cancel_is_local() {
        let root = CancelToken::new();
        let left = root.child();
        let right = root.child();

        left.cancel();
        assert!(left.is_cancelled());
        assert!(!right.is_cancelled());
        assert!(!root.is_cancelled());
    }
}
