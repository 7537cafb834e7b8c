use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::error::{EvalError, Outcome};
use crate::eval::run_task;
use crate::node::Node;
use crate::pool::Pool;
use crate::token::CancelToken;

/// Completion-order queue over one node's child tasks.
///
/// [`spawn`][CompletionQueue::spawn] schedules one evaluation task per child
/// on the shared pool; every task reports `(child index, outcome)` on a
/// single channel, so [`take`][CompletionQueue::take] yields results in the
/// order the children *finish*, not the order they were scheduled. Each
/// child gets its own cancellation token (derived from the parent's), which
/// lets a strategy cancel not-yet-consumed siblings the moment the answer
/// is determined.
pub(crate) struct CompletionQueue {
    rx: Receiver<(usize, Outcome)>,
    tokens: Vec<Arc<CancelToken>>,
}

impl CompletionQueue {
    pub fn spawn(pool: &Pool, parent: &Arc<CancelToken>, children: &[Arc<Node>]) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut tokens = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let token = parent.child();
            let tx = tx.clone();
            let task_pool = pool.clone();
            let node = Arc::clone(child);
            let task_token = Arc::clone(&token);
            pool.execute(move || {
                let outcome = run_task(&task_pool, &node, &task_token);
                // The parent may already be gone after an early exit.
                let _ = tx.send((index, outcome));
            });
            tokens.push(token);
        }
        // `tx` drops here: once every child has reported (or been dropped
        // at shutdown), the channel disconnects.
        Self { rx, tokens }
    }

    /// Block until the next child finishes. A disconnected channel means
    /// the remaining tasks were dropped at shutdown and reads as
    /// cancellation.
    pub fn take(&self) -> Result<(usize, Outcome), EvalError> {
        self.rx.recv().map_err(|_| EvalError::Cancelled)
    }

    /// Cancel one child task.
    pub fn cancel(&self, index: usize) {
        self.tokens[index].cancel();
    }

    /// Cancel every child task. Already-consumed results are unaffected;
    /// still-running children abort at their next entry check.
    pub fn cancel_all(&self) {
        for token in &self.tokens {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    /// A subtree whose evaluation needs many task round-trips before it
    /// folds to `true`, so a plain leaf sibling always finishes first.
    fn slow_true(levels: usize) -> Arc<Node> {
        let mut node = Node::leaf(true);
        for _ in 0..levels {
            node = Node::and(vec![Node::leaf(true), node]);
        }
        node
    }

    #[test]
    fn test_completion_order_not_schedule_order() {
        let pool = Pool::default();
        let token = CancelToken::new();
        let queue = CompletionQueue::spawn(&pool, &token, &[slow_true(24), Node::leaf(false)]);

        let (first, outcome) = queue.take().unwrap();
        assert_eq!(first, 1);
        assert_eq!(outcome, Ok(false));
        let (second, outcome) = queue.take().unwrap();
        assert_eq!(second, 0);
        assert_eq!(outcome, Ok(true));
        pool.shutdown();
    }

    #[test]
    fn test_cancelled_sibling_reports_cancellation() {
        let pool = Pool::default();
        let token = CancelToken::new();
        let queue = CompletionQueue::spawn(&pool, &token, &[slow_true(24), Node::leaf(false)]);

        let (first, outcome) = queue.take().unwrap();
        assert_eq!((first, outcome), (1, Ok(false)));

        // Cancel the slow sibling; it must resolve as cancelled rather
        // than hang or deliver a value consumed by nobody.
        queue.cancel_all();
        let (second, outcome) = queue.take().unwrap();
        assert_eq!(second, 0);
        // The subtree may have finished before the cancel landed.
        assert!(outcome == Err(EvalError::Cancelled) || outcome == Ok(true));
        pool.shutdown();
    }

    #[test]
    fn test_take_after_shutdown_disconnects() {
        let pool = Pool::default();
        let token = CancelToken::new();
        pool.shutdown();
        let queue =
            CompletionQueue::spawn(&pool, &token, &[Node::leaf(true), Node::leaf(false)]);
        assert_eq!(queue.take(), Err(EvalError::Cancelled));
    }

    #[test]
    fn test_pre_cancelled_parent_cancels_children() {
        let pool = Pool::default();
        let token = CancelToken::new();
        token.cancel();
        let queue = CompletionQueue::spawn(&pool, &token, &[Node::leaf(true)]);
        let (_, outcome) = queue.take().unwrap();
        assert_eq!(outcome, Err(EvalError::Cancelled));
        pool.shutdown();
    }
}
