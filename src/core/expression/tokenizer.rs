//! Expression tokenizer
//!
//! Converts generated formulas like "(1 + j / m)^(m * t) - 1" into a sequence
//! of tokens that can be parsed into an AST.

use std::iter::Peekable;
use std::str::Chars;

/// A token in an arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal (e.g., 123, 45.67, .5, 1.5e10)
    Number(f64),
    /// A variable or function name
    Identifier(String),
    /// Arithmetic operators: + - * / ^
    Operator(String),
    OpenParen,
    CloseParen,
    /// Separates function arguments
    Comma,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for arithmetic expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(expression: &'a str) -> Self {
        Self {
            chars: expression.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire expression into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }

            // Minus is always an operator here; the parser handles unary minus
            '+' | '-' | '*' | '/' | '^' => {
                self.advance();
                Token::Operator(c.to_string())
            }

            c if c.is_ascii_digit() || c == '.' => self.read_number()?,

            c if c.is_alphabetic() || c == '_' => self.read_identifier(),

            c => {
                return Err(TokenizeError::new(
                    format!("Unexpected character: '{}'", c),
                    self.position,
                ));
            }
        };

        Ok(Some(token))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Append consecutive ASCII digits to `buf`
    fn read_digits(&mut self, buf: &mut String) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            buf.push(c);
            self.advance();
        }
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();

        self.read_digits(&mut num_str);

        if self.peek() == Some('.') {
            num_str.push('.');
            self.advance();
            self.read_digits(&mut num_str);
        }

        // Exponent part (e.g., 1.5e10, 2E-5)
        if matches!(self.peek(), Some('e' | 'E')) {
            num_str.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                num_str.push(sign);
                self.advance();
            }
            self.read_digits(&mut num_str);
        }

        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| TokenizeError::new(format!("Invalid number: {}", num_str), start_pos))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize an expression string
pub fn tokenize(expression: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(expression).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Number(42.0)]);
        assert_eq!(tokenize("3.567").unwrap(), vec![Token::Number(3.567)]);
        assert_eq!(tokenize(".5").unwrap(), vec![Token::Number(0.5)]);
        assert_eq!(tokenize("1.5e10").unwrap(), vec![Token::Number(1.5e10)]);
        assert_eq!(tokenize("2E-5").unwrap(), vec![Token::Number(2e-5)]);
    }

    #[test]
    fn test_tokenize_identifier_with_underscore() {
        let tokens = tokenize("dias_capitalizacion").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Identifier("dias_capitalizacion".to_string())]
        );
    }

    #[test]
    fn test_tokenize_all_operators() {
        let tokens = tokenize("+ - * / ^").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Operator("+".to_string()),
                Token::Operator("-".to_string()),
                Token::Operator("*".to_string()),
                Token::Operator("/".to_string()),
                Token::Operator("^".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_rate_expression() {
        let tokens = tokenize("(1 + j/m)^-n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Number(1.0),
                Token::Operator("+".to_string()),
                Token::Identifier("j".to_string()),
                Token::Operator("/".to_string()),
                Token::Identifier("m".to_string()),
                Token::CloseParen,
                Token::Operator("^".to_string()),
                Token::Operator("-".to_string()),
                Token::Identifier("n".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_function_call_with_comma() {
        let tokens = tokenize("log(x, 10)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("log".to_string()),
                Token::OpenParen,
                Token::Identifier("x".to_string()),
                Token::Comma,
                Token::Number(10.0),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn test_tokenize_rejects_assignment_and_strings() {
        let err = tokenize("x = 1").unwrap_err();
        assert!(err.message.contains("Unexpected"));
        assert_eq!(err.position, 2);

        assert!(tokenize("\"rm -rf\"").is_err());
        assert!(tokenize("a; b").is_err());
    }

    #[test]
    fn test_tokenize_lone_dot_is_invalid_number() {
        let err = tokenize(".").unwrap_err();
        assert!(err.message.contains("Invalid number"));
    }
}
