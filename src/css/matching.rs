//! Selector matching against the DOM.
//!
//! Selectors are matched right to left: the rightmost compound against the
//! element itself, then each combinator moves to the related element and the
//! compound to its left is tried there. Descendant and indirect-adjacent
//! combinators backtrack over every candidate.

use tracing::trace;

use crate::css::has::{HasArgumentMatchContext, HasArgumentSubtreeIterator};
use crate::css::model::{RelationType, Selector, SelectorComponent};
use crate::dom::{Dom, NodeData, NodeId};

/// Whether `element` matches `selector`.
///
/// `scope` is what `:scope` refers to; without one it is the DOM root.
/// Text nodes never match.
pub fn matches(dom: &Dom, element: NodeId, selector: &Selector, scope: Option<NodeId>) -> bool {
    let matcher = Matcher {
        dom,
        scope: scope.or_else(|| dom.root()),
        anchor: None,
    };
    dom.is_element(element) && matcher.matches_from(selector, 0, element)
}

/// Whether `element` matches any selector of a list.
pub fn matches_any(
    dom: &Dom,
    element: NodeId,
    selectors: &[Selector],
    scope: Option<NodeId>,
) -> bool {
    selectors
        .iter()
        .any(|selector| matches(dom, element, selector, scope))
}

#[derive(Clone, Copy)]
struct Matcher<'d> {
    dom: &'d Dom,
    scope: Option<NodeId>,
    /// Subject of the `:has()` whose argument is being matched.
    anchor: Option<NodeId>,
}

impl Matcher<'_> {
    /// Match the compound starting at `index`, then everything to its left.
    fn matches_from(&self, selector: &Selector, index: usize, element: NodeId) -> bool {
        let Some(data) = self.dom.get(element) else {
            return false;
        };
        let simple = selector.simple_selectors();

        let mut index = index;
        loop {
            let Some(entry) = simple.get(index) else {
                return false;
            };
            if !self.matches_component(&entry.component, element, data) {
                return false;
            }
            if entry.relation != RelationType::SubSelector {
                break;
            }
            match selector.tag_history(index) {
                Some(next) => index = next,
                // Leftmost compound matched.
                None => return true,
            }
        }

        let Some(next) = selector.tag_history(index) else {
            return false;
        };
        let dom = self.dom;
        match simple[index].relation {
            RelationType::Descendant | RelationType::RelativeDescendant => {
                std::iter::successors(dom.parent_element(element), |&p| dom.parent_element(p))
                    .any(|ancestor| self.matches_from(selector, next, ancestor))
            }
            RelationType::Child | RelationType::RelativeChild => dom
                .parent_element(element)
                .is_some_and(|parent| self.matches_from(selector, next, parent)),
            RelationType::DirectAdjacent | RelationType::RelativeDirectAdjacent => dom
                .previous_element_sibling(element)
                .is_some_and(|sibling| self.matches_from(selector, next, sibling)),
            RelationType::IndirectAdjacent | RelationType::RelativeIndirectAdjacent => {
                std::iter::successors(dom.previous_element_sibling(element), |&s| {
                    dom.previous_element_sibling(s)
                })
                .any(|sibling| self.matches_from(selector, next, sibling))
            }
            RelationType::SubSelector => unreachable!("compound ended without a combinator"),
        }
    }

    fn matches_component(
        &self,
        component: &SelectorComponent,
        element: NodeId,
        data: &NodeData,
    ) -> bool {
        match component {
            SelectorComponent::Type(name) => data.local_name.eq_ignore_ascii_case(name),
            SelectorComponent::Universal => true,
            SelectorComponent::Class(name) => data.has_class(name),
            SelectorComponent::Id(name) => data.id.as_deref() == Some(name.as_str()),
            // Dynamic state is not tracked.
            SelectorComponent::PseudoClass(_) => false,
            SelectorComponent::Scope => self.scope == Some(element),
            SelectorComponent::RelativeAnchor => self.anchor == Some(element),
            SelectorComponent::Has(arguments) => self.matches_has(arguments, element),
        }
    }

    /// `:has()` holds if some element in the reach of one argument matches
    /// that argument anchored at `element`.
    fn matches_has(&self, arguments: &[Selector], element: NodeId) -> bool {
        let anchored = Matcher {
            anchor: Some(element),
            ..*self
        };
        arguments.iter().any(|argument| {
            let context = HasArgumentMatchContext::new(argument);
            let matched = HasArgumentSubtreeIterator::new(self.dom, element, &context)
                .any(|candidate| anchored.matches_from(argument, 0, candidate));
            trace!(?element, %argument, matched, "has argument");
            matched
        })
    }
}
