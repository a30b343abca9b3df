//! Arithmetic expression evaluation: decimal numbers, `+ - * /`,
//! parentheses and unary minus, computed in `f64`.
//!
//! ```
//! assert_eq!(calculator::evaluate("2 + 3 * 4"), Ok(14.0));
//! assert_eq!(
//!     calculator::evaluate("1 / (2 - 2)"),
//!     Err(calculator::EvalError::DivisionByZero)
//! );
//! ```

mod token;
mod lexer;
mod ast;
mod parser;
mod evaluator;
mod error;

pub use token::Token;
pub use lexer::{tokenize, Lexer};
pub use ast::{ASTNode, BinaryOperator, UnaryOperator};
pub use parser::{Parser, MAX_DEPTH};
pub use evaluator::Evaluator;
pub use error::EvalError;

/// Parses `expression` into a tree without evaluating it.
pub fn parse(expression: &str) -> Result<ASTNode, EvalError> {
    let lexer = Lexer::new(expression);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parses and evaluates `expression`.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let tree = parse(expression)?;
    Evaluator::new().evaluate(&tree)
}
