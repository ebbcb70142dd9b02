//! Recursive-descent parser for the model language.
//!
//! Grammar:
//! ```text
//! program   := statement* ;
//! statement := "let" IDENT "=" expr ";" | expr ";"?
//! expr      := IDENT "(" (expr ("," expr)*)? ")" | IDENT | NUMBER
//! ```
//! The parser builds a plain AST without interpreting builtins; the
//! evaluator owns name resolution and arity checking.

use crate::error::{Position, ScriptError};
use crate::lexer::{Lexer, SpannedToken, Token};

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { value: f64, pos: Position },
    Name { name: String, pos: Position },
    Call {
        name: String,
        args: Vec<Expr>,
        pos: Position,
    },
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Number { pos, .. } | Expr::Name { pos, .. } | Expr::Call { pos, .. } => *pos,
        }
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, value: Expr },
    Expr(Expr),
}

/// A parsed model program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Parse model source into a program.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser { tokens, pos: 0 }.parse_program()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn parse_program(mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ScriptError> {
        if self.peek_ident("let") {
            self.next();
            let (name, pos) = self.expect_ident()?;
            if name == "let" {
                return Err(ScriptError::Syntax {
                    pos,
                    message: "`let` is a keyword".to_string(),
                });
            }
            self.expect(Token::Equals, "`=`")?;
            let value = self.parse_expr()?;
            self.expect(Token::Semicolon, "`;`")?;
            Ok(Statement::Let { name, value })
        } else {
            let expr = self.parse_expr()?;
            // A trailing semicolon is optional on the final expression.
            if matches!(self.peek(), Some(Token::Semicolon)) {
                self.next();
            }
            Ok(Statement::Expr(expr))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        match self.next() {
            Some(SpannedToken {
                token: Token::Number(value),
                pos,
            }) => Ok(Expr::Number { value, pos }),
            Some(SpannedToken {
                token: Token::Ident(name),
                pos,
            }) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.next();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Token::RParen)) {
                        loop {
                            args.push(self.parse_expr()?);
                            match self.peek() {
                                Some(Token::Comma) => {
                                    self.next();
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(Token::RParen, "`)`")?;
                    Ok(Expr::Call { name, args, pos })
                } else {
                    Ok(Expr::Name { name, pos })
                }
            }
            Some(other) => Err(ScriptError::Syntax {
                pos: other.pos,
                message: format!("expected an expression, found {:?}", other.token),
            }),
            None => Err(ScriptError::Syntax {
                pos: self.end_pos(),
                message: "unexpected end of input".to_string(),
            }),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ScriptError> {
        match self.next() {
            Some(t) if t.token == token => Ok(()),
            Some(t) => Err(ScriptError::Syntax {
                pos: t.pos,
                message: format!("expected {what}, found {:?}", t.token),
            }),
            None => Err(ScriptError::Syntax {
                pos: self.end_pos(),
                message: format!("expected {what}, found end of input"),
            }),
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Position), ScriptError> {
        match self.next() {
            Some(SpannedToken {
                token: Token::Ident(name),
                pos,
            }) => Ok((name, pos)),
            Some(t) => Err(ScriptError::Syntax {
                pos: t.pos,
                message: format!("expected a name, found {:?}", t.token),
            }),
            None => Err(ScriptError::Syntax {
                pos: self.end_pos(),
                message: "expected a name, found end of input".to_string(),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == name)
    }

    fn next(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn end_pos(&self) -> Position {
        self.tokens.last().map(|t| t.pos).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_call() {
        let program = parse("box(1, 2, 3)").unwrap();
        assert_eq!(program.statements.len(), 1);
        let Statement::Expr(Expr::Call { name, args, .. }) = &program.statements[0] else {
            panic!("expected a call expression");
        };
        assert_eq!(name, "box");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn parses_let_then_expression() {
        let program = parse("let b = box(1, 1, 1);\nb").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(&program.statements[0], Statement::Let { name, .. } if name == "b"));
        assert!(matches!(
            &program.statements[1],
            Statement::Expr(Expr::Name { name, .. }) if name == "b"
        ));
    }

    #[test]
    fn parses_nested_calls() {
        let program = parse("difference(box(2, 2, 2), translate(sphere(1), 1, 1, 1))").unwrap();
        let Statement::Expr(Expr::Call { name, args, .. }) = &program.statements[0] else {
            panic!("expected a call");
        };
        assert_eq!(name, "difference");
        assert!(matches!(&args[1], Expr::Call { name, .. } if name == "translate"));
    }

    #[test]
    fn missing_semicolon_after_let_is_an_error() {
        let err = parse("let a = box(1, 1, 1)").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }

    #[test]
    fn unclosed_call_is_an_error() {
        assert!(parse("box(1, 2").is_err());
    }

    #[test]
    fn empty_argument_list_parses() {
        let program = parse("foo()").unwrap();
        let Statement::Expr(Expr::Call { args, .. }) = &program.statements[0] else {
            panic!("expected a call");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn reports_error_position() {
        let err = parse("box(1, 1, 1);\n@").unwrap_err();
        let ScriptError::Syntax { pos, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(pos.line, 2);
    }
}
