//! Element traversal: navigation that only ever lands on element nodes.
//!
//! Text nodes sit in the same sibling chains as elements but are invisible to
//! selectors, so everything selector-related navigates through these helpers.

use super::node::NodeId;
use super::tree::Dom;

impl Dom {
    /// Whether `id` exists and is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|data| data.is_element())
    }

    fn first_element_from(
        &self,
        start: Option<NodeId>,
        step: impl Fn(&Self, NodeId) -> Option<NodeId>,
    ) -> Option<NodeId> {
        let mut node = start;
        while let Some(n) = node {
            if self.is_element(n) {
                return Some(n);
            }
            node = step(self, n);
        }
        None
    }

    /// First child that is an element.
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.first_element_from(self.first_child(id), Self::next_sibling)
    }

    /// Last child that is an element.
    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.first_element_from(self.last_child(id), Self::previous_sibling)
    }

    /// Next sibling that is an element.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.first_element_from(self.next_sibling(id), Self::next_sibling)
    }

    /// Previous sibling that is an element.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.first_element_from(self.previous_sibling(id), Self::previous_sibling)
    }

    /// Parent, if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Element children in tree order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_element_child(id), move |&child| {
            self.next_element_sibling(child)
        })
    }
}
