use thiserror::Error;

/// Every way an evaluation can fail.
///
/// The set is closed and flat: lexical and syntactic problems are all
/// `InvalidExpression`, only blank input is `EmptyExpression`, and
/// `DivisionByZero` is the single runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EvalError {
    #[error("empty expression")]
    EmptyExpression,
    #[error("invalid expression")]
    InvalidExpression,
    #[error("division by zero")]
    DivisionByZero,
}
