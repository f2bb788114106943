//! Regex-driven tokenizer for Hacknet XML
//!
//! Produces a flat stream of positioned tokens. Every character of the input
//! belongs to exactly one token; characters no rule accepts become
//! [`TokenKind::Invalid`] tokens and are rejected later by the parser.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `<?xml ... ?>` and other processing instructions
    ProcessingInstruction,
    /// `</Name>` or `/>`
    TagClose,
    /// `<Name`
    TagOpen,
    /// `<!-- ... -->`
    Comment,
    /// `"..."` or `'...'`
    AttributeValue,
    /// Identifier; an attribute name inside a tag, a word inside content
    AttributeName,
    Whitespace,
    Equals,
    /// Any run of text not containing `<` or `>`
    Content,
    /// `>` closing a start tag
    TagEnd,
    /// A character no other rule accepts
    Invalid,
}

impl TokenKind {
    /// Tokens whose text may appear as element content
    pub fn is_content(self) -> bool {
        matches!(
            self,
            TokenKind::AttributeName
                | TokenKind::AttributeValue
                | TokenKind::Whitespace
                | TokenKind::Content
                | TokenKind::Equals
        )
    }
}

/// A positioned token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text
    pub text: String,
    /// Semantic value: tag name for `TagOpen`, unquoted text for `AttributeValue`
    pub value: String,
    /// Byte offset of the first character
    pub offset: usize,
    /// 1-based line
    pub line: u32,
    /// 1-based column, counted in characters
    pub col: u32,
}

impl Token {
    /// Byte offset one past the last character
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Whether `offset` falls inside this token (half-open)
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }

    /// Line and column (1-based) just past the last character
    pub fn end_position(&self) -> (u32, u32) {
        let mut line = self.line;
        let mut col = self.col;
        for ch in self.text.chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

static RULES: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    [
        (TokenKind::ProcessingInstruction, r"\A<\?[\s\S]*?\?>"),
        (TokenKind::TagClose, r"\A(?:</[a-zA-Z_][\w\-]*\s*>|/>)"),
        (TokenKind::TagOpen, r"\A<[a-zA-Z_][\w\-]*"),
        (TokenKind::Comment, r"\A<!--[\s\S]*?-->"),
        (TokenKind::AttributeValue, r#"\A(?:"[^"]*"|'[^']*')"#),
        (TokenKind::AttributeName, r"\A[a-zA-Z_][\w\-]*"),
        (TokenKind::Whitespace, r"\A[ \t\r\n]+"),
        (TokenKind::Equals, r"\A="),
        (TokenKind::Content, r"\A[^<>]+"),
        (TokenKind::TagEnd, r"\A>"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

/// Split `text` into tokens
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1u32;
    let mut col = 1u32;

    while pos < text.len() {
        let rest = &text[pos..];
        let (kind, len) = RULES
            .iter()
            .find_map(|(kind, re)| re.find(rest).map(|m| (*kind, m.end())))
            .filter(|(_, len)| *len > 0)
            .unwrap_or_else(|| {
                let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                (TokenKind::Invalid, width)
            });

        let raw = &rest[..len];
        tokens.push(Token {
            kind,
            text: raw.to_string(),
            value: token_value(kind, raw),
            offset: pos,
            line,
            col,
        });

        for ch in raw.chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        pos += len;
    }

    tokens
}

fn token_value(kind: TokenKind, raw: &str) -> String {
    match kind {
        TokenKind::TagOpen => raw[1..].to_string(),
        TokenKind::AttributeValue => raw[1..raw.len() - 1].to_string(),
        _ => raw.to_string(),
    }
}
