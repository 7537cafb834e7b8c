use thiserror::Error;

/// Failure outcome of a circuit evaluation.
///
/// [`Cancelled`][EvalError::Cancelled] is the expected shutdown and
/// short-circuit path, not a fault: it is raised when the solver is stopped
/// or when a sibling decision made a subtree's result irrelevant.
/// [`Fault`][EvalError::Fault] is an internal computation failure and stays
/// distinguishable from cancellation all the way to the value handle.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EvalError {
    #[error("evaluation cancelled")]
    Cancelled,
    #[error("internal evaluation fault: {0}")]
    Fault(String),
}

/// Result of one evaluation task: a boolean, or why there is none.
pub type Outcome = Result<bool, EvalError>;
