use std::fmt;
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

#[derive(Debug, PartialEq)]
pub enum ASTNode {
    BinOp {
        left: Box<ASTNode>,
        op: BinaryOperator,
        right: Box<ASTNode>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<ASTNode>,
    },
    Num(f64),
}

impl ASTNode {
    pub fn binary(left: ASTNode, op: BinaryOperator, right: ASTNode) -> Self {
        ASTNode::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn negate(expr: ASTNode) -> Self {
        ASTNode::UnaryOp {
            op: UnaryOperator::Negate,
            expr: Box::new(expr),
        }
    }
}

/// Moves the node's children onto `stack`, leaving leaves in their place.
fn detach_children(node: &mut ASTNode, stack: &mut Vec<ASTNode>) {
    match node {
        ASTNode::BinOp { left, right, .. } => {
            stack.push(mem::replace(&mut **left, ASTNode::Num(0.0)));
            stack.push(mem::replace(&mut **right, ASTNode::Num(0.0)));
        }
        ASTNode::UnaryOp { expr, .. } => {
            stack.push(mem::replace(&mut **expr, ASTNode::Num(0.0)));
        }
        ASTNode::Num(_) => {}
    }
}

// Long operator chains fold into trees as tall as the chain is long, so
// teardown runs on a heap stack instead of recursing once per level.
impl Drop for ASTNode {
    fn drop(&mut self) {
        if let ASTNode::Num(_) = self {
            return;
        }
        let mut stack = Vec::new();
        detach_children(self, &mut stack);
        while let Some(mut node) = stack.pop() {
            detach_children(&mut node, &mut stack);
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        };
        f.write_str(symbol)
    }
}

/// Renders the tree fully parenthesised, so grouping is visible.
impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::BinOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
            ASTNode::UnaryOp { op: UnaryOperator::Negate, expr } => write!(f, "-{}", expr),
            ASTNode::Num(val) => write!(f, "{}", val),
        }
    }
}
