//! Fault-tolerant XML tokenizer and parser

mod node;
mod parse;
mod token;

pub use node::{Attribute, Document, Node, NodeId};
pub use parse::{parse, parse_at_offset, ActiveNode, CursorContext, ParseError, ParseOutcome, Parser};
pub use token::{tokenize, Token, TokenKind};
