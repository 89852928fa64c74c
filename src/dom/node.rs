//! Node types: NodeId, NodeKind, NodeData.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What kind of node a [`NodeData`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element, visible to selectors.
    Element,
    /// A text run. Skipped by element traversal and never matched.
    Text,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Element or text.
    pub kind: NodeKind,
    /// Tag name (e.g. "div"). Empty for text nodes.
    pub local_name: String,
    /// Optional unique id (CSS #id selector).
    pub id: Option<String>,
    /// CSS classes (for .class selector).
    pub classes: Vec<String>,
    /// Character data of a text node.
    pub text: Option<String>,
}

impl NodeData {
    /// Create an element with the given tag name.
    pub fn element(local_name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element,
            local_name: local_name.into(),
            id: None,
            classes: Vec::new(),
            text: None,
        }
    }

    /// Create a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            local_name: String::new(),
            id: None,
            classes: Vec::new(),
            text: Some(content.into()),
        }
    }

    /// Set the CSS id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Add multiple CSS classes (builder).
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for class in classes {
            self = self.with_class(class);
        }
        self
    }

    /// Whether this node is an element.
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check whether this node has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_defaults() {
        let data = NodeData::element("div");
        assert_eq!(data.local_name, "div");
        assert!(data.is_element());
        assert!(data.id.is_none());
        assert!(data.classes.is_empty());
        assert!(data.text.is_none());
    }

    #[test]
    fn text_node() {
        let data = NodeData::text("hello");
        assert_eq!(data.kind, NodeKind::Text);
        assert!(!data.is_element());
        assert_eq!(data.text.as_deref(), Some("hello"));
    }

    #[test]
    fn with_class_deduplicates() {
        let data = NodeData::element("p").with_class("a").with_class("a");
        assert_eq!(data.classes, vec!["a".to_string()]);
    }

    #[test]
    fn with_classes_and_has_class() {
        let data = NodeData::element("p").with_classes(["x", "y", "x"]);
        assert_eq!(data.classes.len(), 2);
        assert!(data.has_class("x"));
        assert!(data.has_class("y"));
        assert!(!data.has_class("z"));
    }

    #[test]
    fn with_id() {
        let data = NodeData::element("section").with_id("main");
        assert_eq!(data.id.as_deref(), Some("main"));
    }
}
