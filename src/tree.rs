// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Field-selection tree for a single incoming query.
//!
//! The tree is an arena: every node lives in one `Vec` and refers to its
//! children by index. Node 0 is a synthetic root whose children are the
//! operation's root-level selections; the root itself is never a field.
//!
//! Trees are built once per request (by the external parser, or decoded from
//! the JSON document it emits, see [`crate::document`]) and are read-only
//! afterwards.

use serde_json::{Map, Value};

/// Index of a node inside its [`SelectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One field occurrence in a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Map<String, Value>,
    children: Vec<NodeId>,
}

impl SelectionNode {
    fn new(name: String, alias: Option<String>) -> Self {
        Self {
            name,
            alias,
            arguments: Map::new(),
            children: Vec::new(),
        }
    }

    /// Child selections in declaration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True when the field is requested under a response key other than its name.
    pub fn is_aliased(&self) -> bool {
        matches!(&self.alias, Some(alias) if *alias != self.name)
    }
}

/// Arena-backed selection tree with a synthetic root at index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTree {
    nodes: Vec<SelectionNode>,
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTree {
    const ROOT: NodeId = NodeId(0);

    /// Create a tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SelectionNode::new(String::new(), None)],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &SelectionNode {
        &self.nodes[id.0]
    }

    /// Number of field occurrences, excluding the synthetic root.
    pub fn field_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Root-level selections in declaration order.
    pub fn root_fields(&self) -> &[NodeId] {
        self.nodes[0].children()
    }

    /// Append a field under `parent` and return its id.
    pub fn add_field(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push(parent, SelectionNode::new(name.into(), None))
    }

    /// Append a field requested under `alias` and return its id.
    pub fn add_aliased_field(
        &mut self,
        parent: NodeId,
        alias: impl Into<String>,
        name: impl Into<String>,
    ) -> NodeId {
        self.push(parent, SelectionNode::new(name.into(), Some(alias.into())))
    }

    /// Attach an argument value to an existing field.
    pub fn set_argument(&mut self, id: NodeId, name: impl Into<String>, value: Value) {
        self.nodes[id.0].arguments.insert(name.into(), value);
    }

    /// Append an unnamed field under `parent`; the decoder names it later.
    pub(crate) fn open_field(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, SelectionNode::new(String::new(), None))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SelectionNode {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, parent: NodeId, node: SelectionNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Iterate every field (never the root) together with its depth.
    ///
    /// Root-level fields are at depth 1. Traversal is pre-order with an
    /// explicit stack, so arbitrarily deep trees cannot overflow the call stack.
    pub fn walk(&self) -> Walk<'_> {
        let stack = self.root_fields().iter().rev().map(|&id| (id, 1)).collect();
        Walk { tree: self, stack }
    }
}

/// Pre-order iterator over `(node, depth)` pairs. See [`SelectionTree::walk`].
pub struct Walk<'a> {
    tree: &'a SelectionTree,
    stack: Vec<(NodeId, u32)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a SelectionNode, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack
            .extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
        Some((node, depth))
    }
}
