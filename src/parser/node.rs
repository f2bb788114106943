//! Parsed element tree
//!
//! Nodes live in a [`Document`] arena and refer to each other by [`NodeId`].
//! The parent link is a plain index, so the tree has a single owner and no
//! reference cycles.

use super::token::Token;
use indexmap::IndexMap;

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An attribute with its source tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub name_token: Token,
    pub value_token: Option<Token>,
}

/// An element
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Attributes in source order
    pub attributes: IndexMap<String, Attribute>,
    pub children: Vec<NodeId>,
    /// Concatenated text of every content run, including whitespace between children
    pub content: String,
    pub parent: Option<NodeId>,
    /// Dot-joined names from the root down to this node
    pub node_path: String,
    /// 1 for the root element
    pub depth: usize,
    pub name_token: Token,
    /// First token of the content
    pub content_token: Option<Token>,
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Arena holding a parsed element tree
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent`; path and depth are derived from the parent
    pub fn add_node(&mut self, parent: Option<NodeId>, name_token: Token) -> NodeId {
        let name = name_token.value.clone();
        let (node_path, depth) = match parent {
            Some(p) => {
                let parent = &self.nodes[p.0];
                (format!("{}.{}", parent.node_path, name), parent.depth + 1)
            }
            None => (name.clone(), 1),
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            attributes: IndexMap::new(),
            children: Vec::new(),
            content: String::new(),
            parent,
            node_path,
            depth,
            name_token,
            content_token: None,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The first element, if any
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn root_id(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.nodes[id.0].parent.map(|p| &self.nodes[p.0])
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes[id.0].children.iter().map(|c| &self.nodes[c.0])
    }

    /// All nodes in document order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
