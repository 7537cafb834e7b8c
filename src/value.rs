use std::sync::mpsc::Receiver;
use std::sync::{Mutex, OnceLock};

use crate::error::{EvalError, Outcome};

/// One-shot handle to the eventual result of a circuit evaluation.
///
/// Created by [`Solver::solve`][crate::solver::Solver::solve] without
/// waiting for the evaluation to finish. The handle resolves exactly once
/// (success, cancellation, or fault) and may be read any number of times
/// afterwards, concurrently, with every reader observing the same outcome.
#[derive(Debug)]
pub struct CircuitValue {
    rx: Mutex<Option<Receiver<Outcome>>>,
    resolved: OnceLock<Outcome>,
}

impl CircuitValue {
    /// Bind a handle to a scheduled task's result channel.
    pub(crate) fn bound(rx: Receiver<Outcome>) -> Self {
        Self {
            rx: Mutex::new(Some(rx)),
            resolved: OnceLock::new(),
        }
    }

    /// A pre-cancelled handle: [`get_value`][CircuitValue::get_value] is
    /// immediately `Err(Cancelled)`, no work is ever scheduled. Returned by
    /// `solve` once the solver has been stopped.
    pub fn broken() -> Self {
        Self {
            rx: Mutex::new(None),
            resolved: OnceLock::new(),
        }
    }

    /// Block until the evaluation finishes and return its result.
    ///
    /// `Err(Cancelled)` if the task was cancelled or never produced a
    /// value; `Err(Fault)` if the evaluation failed internally.
    pub fn get_value(&self) -> Outcome {
        if let Some(outcome) = self.resolved.get() {
            return outcome.clone();
        }
        let mut guard = self.rx.lock().unwrap();
        // Another reader may have resolved the handle while we waited.
        if let Some(outcome) = self.resolved.get() {
            return outcome.clone();
        }
        let outcome = match guard.take() {
            // A dropped sender means the task was discarded at shutdown.
            Some(rx) => rx.recv().unwrap_or(Err(EvalError::Cancelled)),
            None => Err(EvalError::Cancelled),
        };
        let _ = self.resolved.set(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    use test_log::test;

    #[test]
    fn test_resolves_to_sent_value() {
        let (tx, rx) = mpsc::channel();
        let value = CircuitValue::bound(rx);
        tx.send(Ok(true)).unwrap();
        assert_eq!(value.get_value(), Ok(true));
        // Re-reads replay the cached outcome even after the sender is gone.
        drop(tx);
        assert_eq!(value.get_value(), Ok(true));
    }

    #[test]
    fn test_dropped_sender_reads_as_cancelled() {
        let (tx, rx) = mpsc::channel::<Outcome>();
        let value = CircuitValue::bound(rx);
        drop(tx);
        assert_eq!(value.get_value(), Err(EvalError::Cancelled));
    }

    #[test]
    fn test_broken_is_immediately_cancelled() {
        let value = CircuitValue::broken();
        assert_eq!(value.get_value(), Err(EvalError::Cancelled));
        assert_eq!(value.get_value(), Err(EvalError::Cancelled));
    }

    #[test]
    fn test_concurrent_readers_observe_one_outcome() {
        let (tx, rx) = mpsc::channel();
        let value = Arc::new(CircuitValue::bound(rx));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let value = Arc::clone(&value);
                thread::spawn(move || value.get_value())
            })
            .collect();

        tx.send(Ok(false)).unwrap();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), Ok(false));
        }
    }

    #[test]
    fn test_fault_stays_distinguishable() {
        let (tx, rx) = mpsc::channel();
        let value = CircuitValue::bound(rx);
        tx.send(Err(EvalError::Fault("bad".to_string()))).unwrap();
        assert_eq!(value.get_value(), Err(EvalError::Fault("bad".to_string())));
    }
}
