//! DOM queries: selector matching over the subtree of a scoping root.

use super::node::NodeId;
use super::tree::Dom;
use crate::css::matching::matches_any;
use crate::css::model::Selector;
use crate::css::parser::{parse_selector_list, ParseError};

impl Dom {
    /// All elements below `root` matching any of `selectors`, in tree order.
    ///
    /// `root` itself is never part of the result; it is what `:scope` refers
    /// to.
    pub fn query_selector_all(&self, root: NodeId, selectors: &[Selector]) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| matches_any(self, id, selectors, Some(root)))
            .collect()
    }

    /// First element below `root` matching any of `selectors`.
    pub fn query_selector(&self, root: NodeId, selectors: &[Selector]) -> Option<NodeId> {
        self.descendants(root)
            .find(|&id| matches_any(self, id, selectors, Some(root)))
    }

    /// Parse `selectors` and run [`Dom::query_selector_all`].
    pub fn select(&self, root: NodeId, selectors: &str) -> Result<Vec<NodeId>, ParseError> {
        let list = parse_selector_list(selectors)?;
        Ok(self.query_selector_all(root, &list))
    }

    /// Elements strictly below `root`, in tree order.
    fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_depth_first(root)
            .into_iter()
            .skip(1)
            .filter(|&id| self.is_element(id))
    }
}
