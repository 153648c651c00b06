//! Tokenizer.
//!
//! Splits raw text into literal runs and call syntax without a grammar over
//! the whole input. The one rule that makes anything special is island
//! recognition: a run beginning with `@` whose name is registered becomes a
//! [`TokenKind::Call`]. Everything else, including a bare `@` or an unknown
//! `@name`, is carried through byte for byte.
//!
//! | Input                 | Token                      |
//! |-----------------------|----------------------------|
//! | `(` `)` `,`           | structural, one per char   |
//! | ` `                   | `Space`, one per char      |
//! | `[0-9]+(\.[0-9]+)?`   | `Number`                   |
//! | `'...'`               | `Quoted`, quotes included  |
//! | `@name` (registered)  | `Call`                     |
//! | anything else         | `Text`, up to the next `@` |

use super::error::ExprError;
use super::registry::FunctionRegistry;

/// Leading character marking a call island.
pub const SIGIL: char = '@';

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Space,
    Text,
    Number,
    Quoted,
    /// A registered function; holds the lowercase name without the sigil.
    Call(String),
    LParen,
    RParen,
    Comma,
    End,
}

/// A token borrowing its text from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte offset of the first character.
    pub offset: usize,
}

struct Lexer<'src, 'r> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    registry: &'r FunctionRegistry,
    /// Open parentheses inside a call's argument list. Zero means top level.
    depth: usize,
    tokens: Vec<Token<'src>>,
}

impl<'src, 'r> Lexer<'src, 'r> {
    fn new(src: &'src str, registry: &'r FunctionRegistry) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            registry,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.src[start..self.pos],
            offset: start,
        });
    }

    fn last_is_call(&self) -> bool {
        matches!(self.tokens.last(), Some(Token { kind: TokenKind::Call(_), .. }))
    }

    fn read_number(&mut self, start: usize) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(b'0'..=b'9')) {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        self.push(TokenKind::Number, start);
    }

    /// Scan a single-quoted literal. `pos` sits on the opening quote.
    fn read_quoted(&mut self, start: usize) -> Result<(), ExprError> {
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    if self.depth > 0 {
                        return Err(ExprError::Lex {
                            message: "unterminated string literal".into(),
                            offset: start,
                        });
                    }
                    // Top-level prose with a stray apostrophe stays literal.
                    self.push(TokenKind::Text, start);
                    return Ok(());
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.pos += 1;
                    }
                }
                Some(b'\'') => {
                    self.pos += 1;
                    self.push(TokenKind::Quoted, start);
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Scan a literal run, then decide whether it names a registered call.
    fn read_run(&mut self, start: usize) {
        // The first byte may be the sigil; later ones stop the run.
        self.pos += 1;
        while let Some(b) = self.peek() {
            if matches!(b, b'(' | b')' | b',' | b' ' | b'@') {
                break;
            }
            self.pos += 1;
        }
        let run = &self.src[start..self.pos];
        let kind = match run.strip_prefix(SIGIL) {
            Some(name) if !name.is_empty() && self.registry.contains(name) => {
                TokenKind::Call(name.to_lowercase())
            }
            _ => TokenKind::Text,
        };
        self.push(kind, start);
    }

    fn tokenize(mut self) -> Result<Vec<Token<'src>>, ExprError> {
        while let Some(b) = self.peek() {
            let start = self.pos;
            match b {
                b' ' => {
                    self.pos += 1;
                    self.push(TokenKind::Space, start);
                }
                b'(' => {
                    if self.depth > 0 || self.last_is_call() {
                        self.depth += 1;
                    }
                    self.pos += 1;
                    self.push(TokenKind::LParen, start);
                }
                b')' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.pos += 1;
                    self.push(TokenKind::RParen, start);
                }
                b',' => {
                    self.pos += 1;
                    self.push(TokenKind::Comma, start);
                }
                b'0'..=b'9' => self.read_number(start),
                b'\'' => self.read_quoted(start)?,
                _ => self.read_run(start),
            }
        }
        let end = self.pos;
        self.push(TokenKind::End, end);
        Ok(self.tokens)
    }
}

/// Tokenize `src` against `registry`.
///
/// Only fails on a quoted string left open inside a call's argument list.
pub fn tokenize<'src>(src: &'src str, registry: &FunctionRegistry) -> Result<Vec<Token<'src>>, ExprError> {
    let tokens = Lexer::new(src, registry).tokenize()?;
    tracing::trace!(tokens = tokens.len(), "tokenized");
    Ok(tokens)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
