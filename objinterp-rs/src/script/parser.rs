//! Expression AST and precedence-climbing parser.
//!
//! The language has no infix operators: every operation is call syntax and
//! the comma only separates arguments. No token carries a left binding
//! power, so [`Parser::expression`] always yields a single primary; the
//! right binding power it receives selects between the top-level rules
//! (where almost everything is literal text) and the argument rules (where
//! bare words are identifiers and stray punctuation is an error).

use super::error::ExprError;
use super::lexer::{Token, TokenKind};

/// Binding power of the outermost expression sequence.
const TOP_BP: u8 = 0;
/// Binding power inside an argument list; stops at `,` and `)`.
const ARG_BP: u8 = 2;

/// Deepest nesting of calls and groups accepted. Evaluation and drop both
/// recurse over the tree, so the bound protects the caller's stack.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal text outside call syntax, passed through unchanged.
    Text(String),
    Number(String),
    /// Single-quoted literal, quotes still attached.
    Str(String),
    /// Bare word inside an argument list, resolved against the variables.
    Ident(String),
    Call { name: String, args: Vec<Expr> },
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    /// Calls and groups currently open.
    depth: usize,
}

impl<'src> Parser<'src> {
    fn new(tokens: Vec<Token<'src>>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::End)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Token<'src> {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token {
            kind: TokenKind::End,
            text: "",
            offset: self.offset(),
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.eat(&TokenKind::Space) {}
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_sequence(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut nodes = Vec::new();
        while self.peek() != &TokenKind::End {
            nodes.push(self.expression(TOP_BP)?);
        }
        Ok(nodes)
    }

    fn expression(&mut self, rbp: u8) -> Result<Expr, ExprError> {
        let tok = self.advance();
        self.nud(tok, rbp)
    }

    /// Null denotation: the rule for a token in prefix position.
    fn nud(&mut self, tok: Token<'src>, rbp: u8) -> Result<Expr, ExprError> {
        let in_args = rbp >= ARG_BP;
        match tok.kind {
            TokenKind::Number => Ok(Expr::Number(tok.text.to_owned())),
            TokenKind::Quoted => Ok(Expr::Str(tok.text.to_owned())),
            TokenKind::Call(name) if self.peek() == &TokenKind::LParen => self.call(name, tok.offset),
            TokenKind::Text | TokenKind::Call(_) if in_args => Ok(Expr::Ident(tok.text.to_owned())),
            TokenKind::LParen if in_args => self.group(tok.offset),
            TokenKind::RParen | TokenKind::Comma | TokenKind::Space if in_args => Err(ExprError::syntax(
                format!("unexpected '{}'", tok.text),
                tok.offset,
            )),
            TokenKind::End => Err(ExprError::syntax("unexpected end of input", tok.offset)),
            _ => Ok(Expr::Text(tok.text.to_owned())),
        }
    }

    /// Run `rule` one nesting level deeper.
    fn nested<T>(&mut self, at: usize, rule: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::syntax(
                format!("nesting too deep (more than {MAX_DEPTH} levels)"),
                at,
            ));
        }
        self.depth += 1;
        let out = rule(self);
        self.depth -= 1;
        out
    }

    /// `( expr )` inside an argument list.
    fn group(&mut self, open: usize) -> Result<Expr, ExprError> {
        self.nested(open, |p| p.group_body(open))
    }

    fn group_body(&mut self, open: usize) -> Result<Expr, ExprError> {
        self.skip_spaces();
        let inner = self.expression(ARG_BP)?;
        self.skip_spaces();
        if !self.eat(&TokenKind::RParen) {
            return Err(ExprError::syntax(
                format!("expected ')' to close '(' at offset {open}"),
                self.offset(),
            ));
        }
        Ok(inner)
    }

    /// Argument list of `@name(`; the current token is the `(`.
    fn call(&mut self, name: String, at: usize) -> Result<Expr, ExprError> {
        self.nested(at, |p| p.call_args(name, at))
    }

    fn call_args(&mut self, name: String, at: usize) -> Result<Expr, ExprError> {
        self.advance();
        let mut args = Vec::new();
        self.skip_spaces();
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Call { name, args });
        }
        loop {
            self.skip_spaces();
            args.push(self.expression(ARG_BP)?);
            self.skip_spaces();
            match self.peek() {
                TokenKind::Comma => {
                    self.pos += 1;
                }
                TokenKind::RParen => {
                    self.pos += 1;
                    return Ok(Expr::Call { name, args });
                }
                TokenKind::End => {
                    return Err(ExprError::syntax(
                        format!("expected ')' to close call to @{name} at offset {at}"),
                        self.offset(),
                    ))
                }
                _ => {
                    let found = self.tokens.get(self.pos).map(|t| t.text).unwrap_or("");
                    return Err(ExprError::syntax(
                        format!("expected ',' or ')' in arguments to @{name}, found '{found}'"),
                        self.offset(),
                    ));
                }
            }
        }
    }
}

/// Parse a token stream into the sequence of top-level expression nodes.
pub fn parse(tokens: Vec<Token<'_>>) -> Result<Vec<Expr>, ExprError> {
    Parser::new(tokens).parse_sequence()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
