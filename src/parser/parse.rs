//! Tolerant recursive-descent parser
//!
//! Builds a [`Document`] from the token stream. When a target offset is set,
//! the parser stops at the token containing it and reports the innermost open
//! element as an [`ActiveNode`]. The stop is an ordinary [`Flow::Abort`] value
//! returned up through every recursive call.

use super::node::{Attribute, Document, Node, NodeId};
use super::token::{tokenize, Token, TokenKind};
use thiserror::Error;

/// Structural error in the document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("document has no root element")]
    Empty,

    #[error("expected {expected} at line {line}, column {col}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: String,
        offset: usize,
        line: u32,
        col: u32,
    },

    #[error("unexpected end of document, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

/// Where the cursor sits relative to the active element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorContext {
    /// Inside the start tag: `<Computer |`
    Attribute,
    /// Between the start and end tag: `<Computer>|</Computer>`
    Content,
}

/// The element under the cursor in a possibly incomplete document
#[derive(Debug, Clone)]
pub struct ActiveNode {
    /// Everything parsed up to the cursor
    pub document: Document,
    pub id: NodeId,
    pub context: CursorContext,
    /// Attribute name under the cursor (attribute context only)
    pub attribute_name: Option<Token>,
    /// Attribute value under the cursor (attribute context only)
    pub attribute_value: Option<Token>,
}

impl ActiveNode {
    pub fn node(&self) -> &Node {
        self.document.node(self.id)
    }

    pub fn path(&self) -> &str {
        &self.node().node_path
    }

    pub fn depth(&self) -> usize {
        self.node().depth
    }

    /// Name of the attribute under the cursor
    pub fn attribute(&self) -> Option<&str> {
        self.attribute_name.as_ref().map(|t| t.text.as_str())
    }
}

/// Result of a parse run
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Complete(Document),
    Aborted(ActiveNode),
}

enum Flow {
    Continue,
    Abort(Stop),
}

struct Stop {
    node: NodeId,
    context: CursorContext,
    name: Option<Token>,
    value: Option<Token>,
}

impl Stop {
    fn attribute(node: NodeId) -> Self {
        Self {
            node,
            context: CursorContext::Attribute,
            name: None,
            value: None,
        }
    }
}

/// Parser over a tokenized document
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    target: Option<usize>,
    doc: Document,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
            pos: 0,
            target: None,
            doc: Document::new(),
        }
    }

    /// Stop at the token containing this byte offset
    pub fn with_target(mut self, offset: usize) -> Self {
        self.target = Some(offset);
        self
    }

    pub fn run(mut self) -> Result<ParseOutcome, ParseError> {
        self.skip_prolog();
        match self.peek() {
            Some(t) if t.kind == TokenKind::TagOpen => {}
            Some(t) => return Err(unexpected("root element", t)),
            None => return Err(ParseError::Empty),
        }

        match self.parse_element(None)? {
            Flow::Continue => Ok(ParseOutcome::Complete(self.doc)),
            Flow::Abort(stop) => Ok(ParseOutcome::Aborted(ActiveNode {
                document: self.doc,
                id: stop.node,
                context: stop.context,
                attribute_name: stop.name,
                attribute_value: stop.value,
            })),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn hits(&self, token: &Token) -> bool {
        self.target.is_some_and(|offset| token.contains(offset))
    }

    fn skip_prolog(&mut self) {
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::ProcessingInstruction => {
                    self.pos += 1
                }
                _ => break,
            }
        }
    }

    /// Skip whitespace and comments inside a start tag
    fn skip_tag_space(&mut self, node: NodeId) -> Flow {
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Whitespace => {
                    if self.hits(t) {
                        return Flow::Abort(Stop::attribute(node));
                    }
                    self.pos += 1;
                }
                TokenKind::Comment => self.pos += 1,
                _ => break,
            }
        }
        Flow::Continue
    }

    fn parse_element(&mut self, parent: Option<NodeId>) -> Result<Flow, ParseError> {
        let open = self
            .bump()
            .ok_or(ParseError::UnexpectedEof { expected: "element" })?;
        let id = self.doc.add_node(parent, open);

        let mut has_body = false;
        loop {
            if let Flow::Abort(stop) = self.skip_tag_space(id) {
                return Ok(Flow::Abort(stop));
            }
            let token = self.peek().ok_or(ParseError::UnexpectedEof {
                expected: "`>` or `/>`",
            })?;
            match token.kind {
                TokenKind::AttributeName => {
                    if let Flow::Abort(stop) = self.parse_attribute(id)? {
                        return Ok(Flow::Abort(stop));
                    }
                }
                TokenKind::TagEnd => {
                    if self.hits(token) {
                        return Ok(Flow::Abort(Stop::attribute(id)));
                    }
                    self.pos += 1;
                    has_body = true;
                    break;
                }
                TokenKind::TagClose => break,
                _ => return Err(unexpected("attribute, `>` or `/>`", token)),
            }
        }

        if has_body {
            if let Flow::Abort(stop) = self.parse_content(id)? {
                return Ok(Flow::Abort(stop));
            }
        }

        let close = self.peek().ok_or(ParseError::UnexpectedEof {
            expected: "closing tag",
        })?;
        if close.kind != TokenKind::TagClose {
            return Err(unexpected("closing tag", close));
        }
        if self.hits(close) {
            let context = if has_body {
                CursorContext::Content
            } else {
                CursorContext::Attribute
            };
            return Ok(Flow::Abort(Stop {
                node: id,
                context,
                name: None,
                value: None,
            }));
        }
        self.pos += 1;
        Ok(Flow::Continue)
    }

    fn parse_attribute(&mut self, id: NodeId) -> Result<Flow, ParseError> {
        let name = self
            .bump()
            .ok_or(ParseError::UnexpectedEof { expected: "attribute" })?;
        if self.hits(&name) {
            return Ok(Flow::Abort(Stop {
                name: Some(name),
                ..Stop::attribute(id)
            }));
        }

        if let Flow::Abort(stop) = self.skip_tag_space(id) {
            return Ok(Flow::Abort(stop));
        }
        let equals = self.peek().ok_or(ParseError::UnexpectedEof { expected: "`=`" })?;
        if equals.kind != TokenKind::Equals {
            return Err(unexpected("`=`", equals));
        }
        if self.hits(equals) {
            return Ok(Flow::Abort(Stop {
                name: Some(name),
                ..Stop::attribute(id)
            }));
        }
        self.pos += 1;

        if let Flow::Abort(stop) = self.skip_tag_space(id) {
            return Ok(Flow::Abort(stop));
        }
        let value = self.peek().ok_or(ParseError::UnexpectedEof {
            expected: "attribute value",
        })?;
        if value.kind != TokenKind::AttributeValue {
            return Err(unexpected("attribute value", value));
        }
        let value = value.clone();
        self.pos += 1;

        // A value still being typed is not part of the node
        if self.hits(&value) {
            return Ok(Flow::Abort(Stop {
                node: id,
                context: CursorContext::Attribute,
                name: Some(name),
                value: Some(value),
            }));
        }

        self.doc.node_mut(id).attributes.insert(
            name.text.clone(),
            Attribute {
                name: name.text.clone(),
                value: value.value.clone(),
                name_token: name,
                value_token: Some(value),
            },
        );
        Ok(Flow::Continue)
    }

    fn parse_content(&mut self, id: NodeId) -> Result<Flow, ParseError> {
        loop {
            let token = self.peek().ok_or(ParseError::UnexpectedEof {
                expected: "closing tag",
            })?;
            match token.kind {
                TokenKind::TagClose => return Ok(Flow::Continue),
                TokenKind::Comment | TokenKind::ProcessingInstruction => self.pos += 1,
                TokenKind::TagOpen => {
                    if let Flow::Abort(stop) = self.parse_element(Some(id))? {
                        return Ok(Flow::Abort(stop));
                    }
                }
                kind if kind.is_content() || kind == TokenKind::TagEnd => {
                    let hit = self.hits(token);
                    let token = token.clone();
                    let node = self.doc.node_mut(id);
                    node.content.push_str(&token.text);
                    if node.content_token.is_none() {
                        node.content_token = Some(token);
                    }
                    if hit {
                        return Ok(Flow::Abort(Stop {
                            node: id,
                            context: CursorContext::Content,
                            name: None,
                            value: None,
                        }));
                    }
                    self.pos += 1;
                }
                _ => return Err(unexpected("content or closing tag", token)),
            }
        }
    }
}

fn unexpected(expected: &'static str, token: &Token) -> ParseError {
    ParseError::Unexpected {
        expected,
        found: token.text.clone(),
        offset: token.offset,
        line: token.line,
        col: token.col,
    }
}

/// Parse a complete document
pub fn parse(text: &str) -> Result<Document, ParseError> {
    match Parser::new(text).run()? {
        ParseOutcome::Complete(doc) => Ok(doc),
        // Unreachable without a target offset
        ParseOutcome::Aborted(active) => Ok(active.document),
    }
}

/// Find the element under the cursor
///
/// Returns `None` when the offset is outside every abort point or the
/// document is malformed before reaching it.
pub fn parse_at_offset(text: &str, offset: usize) -> Option<ActiveNode> {
    match Parser::new(text).with_target(offset).run() {
        Ok(ParseOutcome::Aborted(active)) => Some(active),
        Ok(ParseOutcome::Complete(_)) => None,
        Err(e) => {
            tracing::debug!("no active node at offset {}: {}", offset, e);
            None
        }
    }
}
