use crate::ast::{ASTNode, BinaryOperator, UnaryOperator};
use crate::error::EvalError;

enum Step<'a> {
    Visit(&'a ASTNode),
    Apply(BinaryOperator),
    Negate,
}

fn pop(values: &mut Vec<f64>) -> Result<f64, EvalError> {
    // Every visited node pushes exactly one value, so this only fails on a
    // bookkeeping bug.
    values.pop().ok_or(EvalError::InvalidExpression)
}

/// Walks an [`ASTNode`] bottom-up, left to right. Holds no state, so one
/// value may be shared freely between threads.
///
/// The walk runs on an explicit work stack: a chain like `1+1+...+1` folds
/// into a tree as tall as the chain, and that height is not bounded by the
/// parser's nesting limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    pub fn evaluate(&self, node: &ASTNode) -> Result<f64, EvalError> {
        let mut work = vec![Step::Visit(node)];
        let mut values: Vec<f64> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit(ASTNode::BinOp { left, op, right }) => {
                    work.push(Step::Apply(*op));
                    work.push(Step::Visit(right));
                    work.push(Step::Visit(left));
                }
                Step::Visit(ASTNode::UnaryOp { op: UnaryOperator::Negate, expr }) => {
                    work.push(Step::Negate);
                    work.push(Step::Visit(expr));
                }
                Step::Visit(ASTNode::Num(val)) => values.push(*val),
                Step::Negate => {
                    let val = pop(&mut values)?;
                    values.push(-val);
                }
                Step::Apply(op) => {
                    let right_val = pop(&mut values)?;
                    let left_val = pop(&mut values)?;
                    let result = match op {
                        BinaryOperator::Add => left_val + right_val,
                        BinaryOperator::Sub => left_val - right_val,
                        BinaryOperator::Mul => left_val * right_val,
                        BinaryOperator::Div => {
                            // Also true for -0.0.
                            if right_val == 0.0 {
                                return Err(EvalError::DivisionByZero);
                            }
                            left_val / right_val
                        }
                    };
                    values.push(result);
                }
            }
        }

        pop(&mut values)
    }
}
