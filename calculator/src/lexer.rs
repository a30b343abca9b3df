use crate::error::EvalError;
use crate::token::Token;

pub struct Lexer {
    text: Vec<char>,
    pos: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let current_char = chars.first().copied();
        Lexer {
            text: chars,
            pos: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.current_char = self.text.get(self.pos).copied();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads the maximal run of digits and decimal points.
    fn number(&mut self) -> Result<f64, EvalError> {
        let mut result = String::new();
        let mut seen_dot = false;
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                result.push(ch);
            } else if ch == '.' {
                if seen_dot {
                    return Err(EvalError::InvalidExpression);
                }
                seen_dot = true;
                result.push(ch);
            } else {
                break;
            }
            self.advance();
        }
        // A lone "." is rejected here; "5." and ".5" are accepted.
        result.parse().map_err(|_| EvalError::InvalidExpression)
    }

    /// Pulls the next token. Once input is exhausted every call yields `Token::End`.
    pub fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Ok(Token::End);
        };

        if ch.is_ascii_digit() || ch == '.' {
            return Ok(Token::Number(self.number()?));
        }

        let token = match ch {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return Err(EvalError::InvalidExpression),
        };

        self.advance();
        Ok(token)
    }
}

/// Lexes the whole input, including the trailing `Token::End`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, EvalError> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        tokens.push(token);
        if token == Token::End {
            return Ok(tokens);
        }
    }
}
