//! # relcss
//!
//! Relative selector (`:has()`) matching over a slotmap DOM, on top of a
//! lookahead CSS token stream.
//!
//! A `:has()` argument such as `> a + b` can only ever match elements in a
//! small, fixed region around the subject. relcss derives that region from the
//! argument's combinators once and walks it in reverse document order instead
//! of scanning the whole subtree.
//!
//! ## Core Systems
//!
//! - **[`css::tokenizer`]**: logos-driven CSS tokenizer with block tracking
//! - **[`css::token_stream`]**: one-token lookahead cursor, block guards, raw and processed comment modes
//! - **[`css::parser`]**: selector list and relative selector list parser
//! - **[`css::has`]**: `:has()` argument match context and bounded reverse subtree iterator
//! - **[`css::matching`]**: right-to-left selector matcher
//! - **[`dom`]**: slotmap-backed node arena, element traversal, `query_selector_all`
//!
//! ## Example
//!
//! ```
//! use relcss::dom::{Dom, NodeData};
//!
//! let mut dom = Dom::new();
//! let root = dom.insert(NodeData::element("body"));
//! let card = dom.insert_child(root, NodeData::element("section"));
//! dom.insert_child(card, NodeData::element("h1"));
//! dom.insert_child(root, NodeData::element("section"));
//!
//! assert_eq!(dom.select(root, "section:has(> h1)").unwrap(), vec![card]);
//! ```

// Core systems
pub mod css;
pub mod dom;

pub use css::has::{HasArgumentMatchContext, HasArgumentSubtreeIterator, Limit};
pub use css::model::{RelationType, Selector, SelectorComponent, SimpleSelector};
pub use css::parser::{
    parse_relative_selector_list, parse_selector_list, parse_selector_list_with, ParseError,
    ParserConfig,
};
pub use css::token_stream::{Processed, Raw, RawTokenStream, TokenStream};
pub use css::tokenizer::{BlockType, Token, TokenKind, Tokenizer};
pub use dom::{Dom, NodeData, NodeId, NodeKind};
