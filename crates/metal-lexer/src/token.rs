//! Token types for the metaL lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the notation and
//! [`Token`], which pairs a kind with a source [`Span`].

use metal_types::Span;
use std::fmt;

/// The six structural operator glyphs, in the order the lexer tries them.
pub const OPERATOR_GLYPHS: &[&str] = &["`", "=", "//", "<<", ">>", ":"];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the metaL lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the metaL notation.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Anything symbol-like that no more specific rule claimed: `x`, `dup`, `+`
    Symbol(String),
    /// Quoted text with escapes resolved: `'hello'`
    Str(String),
    /// Floating point: `3.14`, `-2e10`
    Number(f64),
    /// Signed decimal: `42`, `-7`
    Integer(i64),
    /// `0x1F`
    Hex(i64),
    /// `0b101`
    Bin(i64),
    /// `http://...`, `https://...`
    Url(String),
    /// `user@host`
    Email(String),
    /// Dotted quad: `127.0.0.1`
    Ip(String),

    // ── Operators ────────────────────────────────────────────

    /// `` ` `` (quote)
    Tick,
    /// `=`
    Eq,
    /// `//`
    Push,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `:`
    Colon,

    // ── Statement separators ─────────────────────────────────

    /// `;` (clear the VM stack)
    Semicolon,
    /// Line break
    Newline,
    /// `.end`
    End,
    /// `?`
    Question,
    /// `??`
    QuestionQuestion,

    // ── Delimiters ───────────────────────────────────────────

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// The glyph of an operator token.
    pub fn operator_glyph(&self) -> Option<&'static str> {
        match self {
            TokenKind::Tick => Some("`"),
            TokenKind::Eq => Some("="),
            TokenKind::Push => Some("//"),
            TokenKind::LShift => Some("<<"),
            TokenKind::RShift => Some(">>"),
            TokenKind::Colon => Some(":"),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Symbol(_)
                | TokenKind::Str(_)
                | TokenKind::Number(_)
                | TokenKind::Integer(_)
                | TokenKind::Hex(_)
                | TokenKind::Bin(_)
                | TokenKind::Url(_)
                | TokenKind::Email(_)
                | TokenKind::Ip(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(glyph) = self.operator_glyph() {
            return f.write_str(glyph);
        }
        match self {
            TokenKind::Symbol(s) | TokenKind::Url(s) | TokenKind::Email(s) | TokenKind::Ip(s) => {
                f.write_str(s)
            }
            TokenKind::Str(s) => write!(f, "'{s}'"),
            TokenKind::Number(x) => write!(f, "{}", metal_types::node::format_float(*x)),
            TokenKind::Integer(n) => write!(f, "{n}"),
            TokenKind::Hex(n) => write!(f, "0x{n:x}"),
            TokenKind::Bin(n) => write!(f, "0b{n:b}"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::End => f.write_str(".end"),
            TokenKind::Question => f.write_str("?"),
            TokenKind::QuestionQuestion => f.write_str("??"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Eof => f.write_str("end of input"),
            _ => Ok(()),
        }
    }
}
