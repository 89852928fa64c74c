//! Tree operations: insert, navigate, walk.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId};

/// Structural links of one node. All fields are non-owning.
#[derive(Debug, Clone, Copy, Default)]
struct Links {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// The document tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent, child and sibling links are
/// stored in a secondary map so that every navigation step is O(1), which the
/// reverse subtree walk used by `:has()` relies on.
pub struct Dom {
    nodes: SlotMap<NodeId, NodeData>,
    links: SecondaryMap<NodeId, Links>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            links: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a root-level node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.links.insert(id, Links::default());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Append a node as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `parent` does not exist in the tree.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        debug_assert!(
            self.nodes.contains_key(parent),
            "parent node does not exist"
        );
        let id = self.nodes.insert(data);
        let previous_last = self.links.get(parent).and_then(|links| links.last_child);
        self.links.insert(
            id,
            Links {
                parent: Some(parent),
                prev_sibling: previous_last,
                ..Links::default()
            },
        );
        if let Some(previous_last) = previous_last {
            if let Some(links) = self.links.get_mut(previous_last) {
                links.next_sibling = Some(id);
            }
        }
        if let Some(links) = self.links.get_mut(parent) {
            if links.first_child.is_none() {
                links.first_child = Some(id);
            }
            links.last_child = Some(id);
        }
        id
    }

    fn link(&self, id: NodeId) -> Links {
        self.links.get(id).copied().unwrap_or_default()
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).parent
    }

    /// First child node (of any kind).
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).first_child
    }

    /// Last child node (of any kind).
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).last_child
    }

    /// Following sibling node (of any kind).
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).next_sibling
    }

    /// Preceding sibling node (of any kind).
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).prev_sibling
    }

    /// Iterate over the children of a node in tree order. Empty if the node
    /// has no children or does not exist.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(id), move |&child| {
            self.next_sibling(child)
        })
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).collect()
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the DOM.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the DOM is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the DOM contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start` (inclusive).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children from the back so the first child is visited first.
            let mut child = self.last_child(current);
            while let Some(c) = child {
                stack.push(c);
                child = self.previous_sibling(c);
            }
        }
        result
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
