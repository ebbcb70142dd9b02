//! Model source lexer.
//!
//! Tokenizes the procedural model language: identifiers, numbers (with
//! optional sign and exponent), punctuation, and `//` line comments.

use crate::error::{Position, ScriptError};

/// A token in model source.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword (`let`, `box`, user names).
    Ident(String),
    /// Numeric literal.
    Number(f64),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Equals,
}

/// A token with the position where it starts.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: Position,
}

/// Lexer over model source bytes.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, ScriptError> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<SpannedToken>, ScriptError> {
        self.skip_whitespace_and_comments();
        if self.pos >= self.input.len() {
            return Ok(None);
        }

        let pos = Position {
            line: self.line,
            col: self.col,
        };
        let c = self.input[self.pos];

        let token = match c {
            b'(' => {
                self.advance();
                Token::LParen
            }
            b')' => {
                self.advance();
                Token::RParen
            }
            b',' => {
                self.advance();
                Token::Comma
            }
            b';' => {
                self.advance();
                Token::Semicolon
            }
            b'=' => {
                self.advance();
                Token::Equals
            }
            b'-' | b'+' | b'0'..=b'9' | b'.' => self.lex_number(pos)?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.lex_ident(),
            other => {
                return Err(ScriptError::Syntax {
                    pos,
                    message: format!("unexpected character `{}`", other as char),
                });
            }
        };

        Ok(Some(SpannedToken { token, pos }))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .unwrap_or_default()
            .to_string();
        Token::Ident(text)
    }

    fn lex_number(&mut self, pos: Position) -> Result<Token, ScriptError> {
        let start = self.pos;
        if matches!(self.input[self.pos], b'-' | b'+') {
            self.advance();
        }
        let mut saw_digit = false;
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            match c {
                b'0'..=b'9' => {
                    saw_digit = true;
                    self.advance();
                }
                b'.' => self.advance(),
                b'e' | b'E' => {
                    self.advance();
                    if self.pos < self.input.len() && matches!(self.input[self.pos], b'-' | b'+') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or_default();
        if !saw_digit {
            return Err(ScriptError::Syntax {
                pos,
                message: format!("malformed number `{text}`"),
            });
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ScriptError::Syntax {
                pos,
                message: format!("malformed number `{text}`"),
            })
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
                self.advance();
            }
            // `//` comment runs to end of line.
            if self.pos + 1 < self.input.len()
                && self.input[self.pos] == b'/'
                && self.input[self.pos + 1] == b'/'
            {
                while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn lexes_call_expression() {
        assert_eq!(
            tokens("box(1, 2.5, 3)"),
            vec![
                Token::Ident("box".to_string()),
                Token::LParen,
                Token::Number(1.0),
                Token::Comma,
                Token::Number(2.5),
                Token::Comma,
                Token::Number(3.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn lexes_let_statement() {
        assert_eq!(
            tokens("let a = sphere(2);"),
            vec![
                Token::Ident("let".to_string()),
                Token::Ident("a".to_string()),
                Token::Equals,
                Token::Ident("sphere".to_string()),
                Token::LParen,
                Token::Number(2.0),
                Token::RParen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn negative_and_exponent_numbers() {
        assert_eq!(
            tokens("-1.5 +2 3e-2"),
            vec![
                Token::Number(-1.5),
                Token::Number(2.0),
                Token::Number(0.03),
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            tokens("// a plate\nbox(1, 1, 1) // trailing"),
            tokens("box(1, 1, 1)")
        );
    }

    #[test]
    fn tracks_line_numbers() {
        let toks = Lexer::new("box(1,1,1);\nsphere(2)").tokenize().unwrap();
        let sphere = toks
            .iter()
            .find(|t| t.token == Token::Ident("sphere".to_string()))
            .unwrap();
        assert_eq!(sphere.pos.line, 2);
        assert_eq!(sphere.pos.col, 1);
    }

    #[test]
    fn rejects_unexpected_characters() {
        assert!(matches!(
            Lexer::new("box{1}").tokenize(),
            Err(ScriptError::Syntax { .. })
        ));
    }

    #[test]
    fn rejects_bare_sign() {
        assert!(matches!(
            Lexer::new("-").tokenize(),
            Err(ScriptError::Syntax { .. })
        ));
    }
}
