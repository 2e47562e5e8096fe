//! Tokenizer for the formula language.
//!
//! Keywords are recognized here, before parsing, so `and` is always the
//! conjunction. A double-quoted string is the way to write a term or
//! caseframe whose name collides with a keyword.

use std::fmt;

use miette::SourceSpan;

use crate::node::store::is_generated_name;

use super::error::ParseError;

/// Byte-level source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// Reserved words of the formula language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Not,
    Nor,
    Thnot,
    Thnor,
    Nand,
    Xor,
    DoubImpl,
    Impl,
    OrImpl,
    AndImpl,
    AndOr,
    Thresh,
    Every,
    Some,
    Close,
    SetOf,
    None,
}

impl Keyword {
    /// Recognize a keyword in CamelCase or lower case.
    pub fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "And" | "and" => Self::And,
            "Or" | "or" => Self::Or,
            "Not" | "not" => Self::Not,
            "Nor" | "nor" => Self::Nor,
            "Thnot" | "thnot" => Self::Thnot,
            "Thnor" | "thnor" => Self::Thnor,
            "Nand" | "nand" => Self::Nand,
            "Xor" | "xor" => Self::Xor,
            "DoubImpl" | "doubimpl" | "Iff" | "iff" => Self::DoubImpl,
            "Impl" | "impl" | "If" | "if" => Self::Impl,
            "OrImpl" | "orimpl" => Self::OrImpl,
            "AndImpl" | "andimpl" => Self::AndImpl,
            "AndOr" | "andor" => Self::AndOr,
            "Thresh" | "thresh" => Self::Thresh,
            "Every" | "every" => Self::Every,
            "Some" | "some" => Self::Some,
            "Close" | "close" => Self::Close,
            "SetOf" | "setof" => Self::SetOf,
            "None" | "none" => Self::None,
            _ => return Option::None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
            Self::Nor => "Nor",
            Self::Thnot => "Thnot",
            Self::Thnor => "Thnor",
            Self::Nand => "Nand",
            Self::Xor => "Xor",
            Self::DoubImpl => "DoubImpl",
            Self::Impl => "Impl",
            Self::OrImpl => "OrImpl",
            Self::AndImpl => "AndImpl",
            Self::AndOr => "AndOr",
            Self::Thresh => "Thresh",
            Self::Every => "Every",
            Self::Some => "Some",
            Self::Close => "Close",
            Self::SetOf => "SetOf",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// `?x`
    QueryVar(String),
    /// `wft3`, `arb1`, `ind2`
    NodeRef(String),
    Str(String),
    /// Digits as written; `007` and `7` are different terms.
    Int(String),
    Keyword(Keyword),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "identifier `{s}`"),
            Self::QueryVar(s) => write!(f, "query variable `{s}`"),
            Self::NodeRef(s) => write!(f, "node reference `{s}`"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Int(n) => write!(f, "integer {n}"),
            Self::Keyword(k) => write!(f, "keyword `{}`", k.as_str()),
            Self::LParen => write!(f, "`(`"),
            Self::RParen => write!(f, "`)`"),
            Self::LBrace => write!(f, "`{{`"),
            Self::RBrace => write!(f, "`}}`"),
            Self::Comma => write!(f, "`,`"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Split a formula into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let punct = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = punct {
            chars.next();
            tokens.push(Token {
                kind,
                span: Span::new(start, start + 1),
            });
            continue;
        }

        if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = None;
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '"' => {
                        closed = Some(i + 1);
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    _ => text.push(ch),
                }
            }
            let Some(end) = closed else {
                return Err(ParseError::UnterminatedString {
                    src: src.to_string(),
                    span: Span::new(start, start + 1).into(),
                });
            };
            tokens.push(Token {
                kind: TokenKind::Str(text),
                span: Span::new(start, end),
            });
            continue;
        }

        if c.is_ascii_digit() {
            let end = scan(&mut chars, start, |ch| ch.is_ascii_digit());
            tokens.push(Token {
                kind: TokenKind::Int(src[start..end].to_string()),
                span: Span::new(start, end),
            });
            continue;
        }

        if c == '?' {
            chars.next();
            let end = scan(&mut chars, start + 1, is_word_char);
            if end == start + 1 {
                return Err(ParseError::InvalidCharacter {
                    ch: '?',
                    src: src.to_string(),
                    span: Span::new(start, end).into(),
                });
            }
            tokens.push(Token {
                kind: TokenKind::QueryVar(src[start..end].to_string()),
                span: Span::new(start, end),
            });
            continue;
        }

        if is_word_start(c) {
            let end = scan(&mut chars, start, is_word_char);
            let word = &src[start..end];
            let kind = if let Some(keyword) = Keyword::from_word(word) {
                TokenKind::Keyword(keyword)
            } else if is_generated_name(word) {
                TokenKind::NodeRef(word.to_string())
            } else {
                TokenKind::Ident(word.to_string())
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, end),
            });
            continue;
        }

        return Err(ParseError::InvalidCharacter {
            ch: c,
            src: src.to_string(),
            span: Span::new(start, start + c.len_utf8()).into(),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(src.len(), src.len()),
    });
    Ok(tokens)
}

/// Consume characters while `accept` holds; returns the end offset.
fn scan(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
    accept: impl Fn(char) -> bool,
) -> usize {
    let mut end = start;
    while let Some(&(i, ch)) = chars.peek() {
        if !accept(ch) {
            break;
        }
        end = i + ch.len_utf8();
        chars.next();
    }
    end
}
