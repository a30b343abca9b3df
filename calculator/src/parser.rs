use crate::ast::{ASTNode, BinaryOperator};
use crate::error::EvalError;
use crate::lexer::Lexer;
use crate::token::Token;

/// Deepest chain of unary minuses and parentheses the parser accepts.
pub const MAX_DEPTH: usize = 256;

/// Recursive-descent parser over a pull-based [`Lexer`].
///
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := factor (('*' | '/') factor)*
/// factor     := '-' factor | number | '(' expression ')'
/// ```
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, EvalError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            depth: 0,
        })
    }

    fn eat(&mut self, token_type: Token) -> Result<(), EvalError> {
        if std::mem::discriminant(&self.current_token) == std::mem::discriminant(&token_type) {
            self.current_token = self.lexer.next_token()?;
            Ok(())
        } else {
            Err(EvalError::InvalidExpression)
        }
    }

    /// Parses the whole input. Blank input is `EmptyExpression`; any token
    /// left over after a complete expression is `InvalidExpression`.
    pub fn parse(&mut self) -> Result<ASTNode, EvalError> {
        if self.current_token == Token::End {
            return Err(EvalError::EmptyExpression);
        }
        let node = self.expr()?;
        self.eat(Token::End)?;
        Ok(node)
    }

    fn expr(&mut self) -> Result<ASTNode, EvalError> {
        let mut node = self.term()?;

        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.eat(self.current_token)?;
            node = ASTNode::binary(node, op, self.term()?);
        }

        Ok(node)
    }

    fn term(&mut self) -> Result<ASTNode, EvalError> {
        let mut node = self.factor()?;

        loop {
            let op = match self.current_token {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.eat(self.current_token)?;
            node = ASTNode::binary(node, op, self.factor()?);
        }

        Ok(node)
    }

    fn factor(&mut self) -> Result<ASTNode, EvalError> {
        match self.current_token {
            Token::Minus => {
                self.eat(Token::Minus)?;
                let expr = self.nested(Self::factor)?;
                Ok(ASTNode::negate(expr))
            }
            Token::Number(val) => {
                self.eat(Token::Number(0.0))?;
                Ok(ASTNode::Num(val))
            }
            Token::LParen => {
                self.eat(Token::LParen)?;
                let node = self.nested(Self::expr)?;
                self.eat(Token::RParen)?;
                Ok(node)
            }
            _ => Err(EvalError::InvalidExpression),
        }
    }

    fn nested(
        &mut self,
        rule: fn(&mut Self) -> Result<ASTNode, EvalError>,
    ) -> Result<ASTNode, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::InvalidExpression);
        }
        self.depth += 1;
        let node = rule(self);
        self.depth -= 1;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ASTNode, EvalError> {
        let mut parser = Parser::new(Lexer::new(text))?;
        parser.parse()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("42").unwrap(), ASTNode::Num(42.0));
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(parse("2 + 3 * 4").unwrap().to_string(), "(2 + (3 * 4))");
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(parse("(2 + 3) * 4").unwrap().to_string(), "((2 + 3) * 4)");
    }

    #[test]
    fn test_parse_left_associative() {
        assert_eq!(parse("1 - 2 - 3").unwrap().to_string(), "((1 - 2) - 3)");
        assert_eq!(parse("8 / 4 / 2").unwrap().to_string(), "((8 / 4) / 2)");
    }

    #[test]
    fn test_parse_double_negation() {
        assert_eq!(
            parse("--5").unwrap(),
            ASTNode::negate(ASTNode::negate(ASTNode::Num(5.0)))
        );
    }

    #[test]
    fn test_parse_unary_binds_tighter() {
        assert_eq!(parse("-2 * 3").unwrap().to_string(), "(-2 * 3)");
        assert_eq!(parse("2 * -3").unwrap().to_string(), "(2 * -3)");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), Err(EvalError::EmptyExpression));
        assert_eq!(parse(" \t\n"), Err(EvalError::EmptyExpression));
    }

    #[test]
    fn test_parse_unbalanced() {
        assert_eq!(parse("(1 + 2"), Err(EvalError::InvalidExpression));
        assert_eq!(parse("1 + 2)"), Err(EvalError::InvalidExpression));
        assert_eq!(parse("()"), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_parse_trailing_operand() {
        assert_eq!(parse("1 2"), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_parse_missing_operand() {
        assert_eq!(parse("1 +"), Err(EvalError::InvalidExpression));
        assert_eq!(parse("1+/"), Err(EvalError::InvalidExpression));
        assert_eq!(parse("* 2"), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_unary_plus_rejected() {
        assert_eq!(parse("+5"), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_depth_limit_parentheses() {
        let ok = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());

        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&deep), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_depth_limit_negation() {
        let deep = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&deep), Err(EvalError::InvalidExpression));
    }

    #[test]
    fn test_depth_resets_between_siblings() {
        let group = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        let text = format!("{} + {}", group, group);
        assert!(parse(&text).is_ok());
    }
}
