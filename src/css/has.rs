//! `:has()` argument scoping.
//!
//! Matching `:has(<relative selector>)` on an element means finding some
//! element that matches the argument with the subject as its anchor. The
//! argument's combinators bound where such an element can be:
//! `:has(> a)` only looks at children, `:has(+ a > b)` only at the next
//! sibling and its children, `:has(~ a)` at all following siblings.
//!
//! [`HasArgumentMatchContext`] derives those bounds (a depth limit and an
//! adjacent distance limit) from the argument once. [`HasArgumentSubtreeIterator`]
//! then walks the bounded region of one subject in reverse document order.

use std::iter::FusedIterator;

use tracing::trace;

use crate::css::model::{RelationType, Selector};
use crate::dom::{Dom, NodeId};

/// A non-negative bound that may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    Fixed(usize),
    Infinite,
}

impl Limit {
    pub fn is_fixed(self) -> bool {
        matches!(self, Limit::Fixed(_))
    }

    /// Whether a counter at `value` has hit this limit. Never true for
    /// [`Limit::Infinite`].
    pub fn is_reached_at(self, value: usize) -> bool {
        self == Limit::Fixed(value)
    }

    /// One more, if fixed. Infinite stays infinite.
    fn incremented(self) -> Self {
        match self {
            Limit::Fixed(n) => Limit::Fixed(n + 1),
            Limit::Infinite => Limit::Infinite,
        }
    }
}

/// Traversal bounds of one `:has()` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasArgumentMatchContext {
    depth_limit: Limit,
    adjacent_distance_limit: Limit,
    leftmost_relation: RelationType,
}

impl HasArgumentMatchContext {
    /// Derive the bounds of a relative selector.
    ///
    /// Relations are visited from the rightmost compound leftwards. `:scope`
    /// inside the argument does not affect the bounds.
    ///
    /// # Panics
    ///
    /// Panics if a compound boundary carries [`RelationType::SubSelector`],
    /// which a well-formed chain never does.
    pub fn new(selector: &Selector) -> Self {
        let mut context = Self {
            depth_limit: Limit::Fixed(0),
            adjacent_distance_limit: Limit::Fixed(0),
            leftmost_relation: RelationType::SubSelector,
        };

        let mut next = next_compound(selector, 0);
        while let Some((relation, next_index)) = next {
            if relation.is_relative() {
                context.leftmost_relation = relation;
            }
            match relation {
                RelationType::RelativeDescendant | RelationType::Descendant => {
                    context.depth_limit = Limit::Infinite;
                    context.adjacent_distance_limit = Limit::Fixed(0);
                }
                RelationType::RelativeChild | RelationType::Child => {
                    context.depth_limit = context.depth_limit.incremented();
                    context.adjacent_distance_limit = Limit::Fixed(0);
                }
                RelationType::RelativeDirectAdjacent | RelationType::DirectAdjacent => {
                    context.adjacent_distance_limit =
                        context.adjacent_distance_limit.incremented();
                }
                RelationType::RelativeIndirectAdjacent | RelationType::IndirectAdjacent => {
                    context.adjacent_distance_limit = Limit::Infinite;
                }
                RelationType::SubSelector => {
                    unreachable!("compound boundary without a combinator")
                }
            }
            next = next_compound(selector, next_index);
        }

        trace!(
            depth_limit = ?context.depth_limit,
            adjacent_distance_limit = ?context.adjacent_distance_limit,
            leftmost_relation = ?context.leftmost_relation,
            "has argument match context"
        );
        context
    }

    pub fn depth_limit(&self) -> Limit {
        self.depth_limit
    }

    pub fn adjacent_distance_limit(&self) -> Limit {
        self.adjacent_distance_limit
    }

    /// The `Relative*` combinator of the argument, or
    /// [`RelationType::SubSelector`] if the chain has none.
    pub fn leftmost_relation(&self) -> RelationType {
        self.leftmost_relation
    }

    pub fn depth_fixed(&self) -> bool {
        self.depth_limit.is_fixed()
    }

    pub fn adjacent_distance_fixed(&self) -> bool {
        self.adjacent_distance_limit.is_fixed()
    }
}

/// Starting at `start`, skip entries of the current compound and return its
/// combinator together with the index where the next compound begins.
fn next_compound(selector: &Selector, start: usize) -> Option<(RelationType, usize)> {
    let simple = selector.simple_selectors();
    let (offset, boundary) = simple
        .get(start..)?
        .iter()
        .enumerate()
        .find(|(_, s)| s.relation != RelationType::SubSelector)?;
    let next = selector.tag_history(start + offset)?;
    Some((boundary.relation, next))
}

/// Reverse document order walk over the elements a `:has()` argument can
/// reach from one subject.
///
/// The walk starts at the last reachable element and ends at the
/// `traversal_end` element, inclusive: the subject's first child when only
/// descendants are reachable, otherwise a following sibling. It never yields
/// the subject itself. Single pass; the tree must not change while walking.
pub struct HasArgumentSubtreeIterator<'d> {
    dom: &'d Dom,
    scope: NodeId,
    context: HasArgumentMatchContext,
    current: Option<NodeId>,
    traversal_end: Option<NodeId>,
    depth: usize,
}

impl<'d> HasArgumentSubtreeIterator<'d> {
    pub fn new(dom: &'d Dom, scope: NodeId, context: &HasArgumentMatchContext) -> Self {
        let mut iterator = Self {
            dom,
            scope,
            context: *context,
            current: None,
            traversal_end: None,
            depth: 0,
        };
        iterator.start();
        trace!(
            current = ?iterator.current,
            traversal_end = ?iterator.traversal_end,
            depth = iterator.depth,
            "has argument subtree walk"
        );
        iterator
    }

    fn start(&mut self) {
        let dom = self.dom;
        match self.context.adjacent_distance_limit {
            Limit::Infinite => {
                // Everything after the subject under its parent: end at the
                // next sibling, start at the deepest last element under the
                // last sibling.
                self.traversal_end = dom.next_element_sibling(self.scope);
                if self.traversal_end.is_none() {
                    return;
                }
                let Some(last_sibling) = dom
                    .parent(self.scope)
                    .and_then(|parent| dom.last_element_child(parent))
                else {
                    self.traversal_end = None;
                    return;
                };
                self.current = self.last_within(last_sibling).or(Some(last_sibling));
            }
            Limit::Fixed(0) => {
                debug_assert!(
                    !self.context.depth_limit.is_reached_at(0),
                    "descendant walk with a zero depth limit"
                );
                self.traversal_end = dom.first_element_child(self.scope);
                if self.traversal_end.is_none() {
                    return;
                }
                self.current = self.last_within(self.scope);
                debug_assert!(self.current.is_some());
            }
            Limit::Fixed(distance_limit) => {
                let mut distance = 1;
                self.traversal_end = dom.next_element_sibling(self.scope);
                while distance < distance_limit {
                    let Some(end) = self.traversal_end else {
                        break;
                    };
                    self.traversal_end = dom.next_element_sibling(end);
                    distance += 1;
                }
                let Some(end) = self.traversal_end else {
                    return;
                };
                self.current = self.last_within(end).or(Some(end));
            }
        }
    }

    /// The last element in preorder below `element` that stays within the
    /// depth limit, updating the depth counter on the way down. `None` if the
    /// limit is already reached or `element` has no element children.
    fn last_within(&mut self, element: NodeId) -> Option<NodeId> {
        if self.context.depth_limit.is_reached_at(self.depth) {
            return None;
        }
        let mut last_descendant = None;
        let mut descendant = self.dom.last_element_child(element);
        while let Some(d) = descendant {
            last_descendant = Some(d);
            self.depth += 1;
            if self.context.depth_limit.is_reached_at(self.depth) {
                break;
            }
            descendant = self.dom.last_element_child(d);
        }
        last_descendant
    }

    /// Step to the previous element in document order within the bounds.
    fn advance(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        debug_assert_ne!(current, self.scope);
        if Some(current) == self.traversal_end {
            self.current = None;
            return;
        }
        if let Some(previous) = self.dom.previous_element_sibling(current) {
            self.current = self.last_within(previous).or(Some(previous));
        } else {
            debug_assert!(self.depth > 0);
            self.depth = self.depth.saturating_sub(1);
            self.current = self.dom.parent_element(current);
        }
        debug_assert!(self.current.is_some());
    }

    /// The element the next call to `next` yields.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Depth of the current element: from the subject for descendant walks,
    /// from the sibling level otherwise.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn at_end(&self) -> bool {
        self.current.is_none()
    }
}

impl Iterator for HasArgumentSubtreeIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        self.advance();
        Some(current)
    }
}

impl FusedIterator for HasArgumentSubtreeIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::model::SelectorComponent;
    use crate::css::parser::{parse_relative_selector_list, ParserConfig};
    use crate::dom::NodeData;
    use pretty_assertions::assert_eq;

    fn context(argument: &str) -> HasArgumentMatchContext {
        let selectors = parse_relative_selector_list(argument, &ParserConfig::default())
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        HasArgumentMatchContext::new(&selectors[0])
    }

    fn limits(argument: &str) -> (Limit, Limit, RelationType) {
        let c = context(argument);
        (c.depth_limit(), c.adjacent_distance_limit(), c.leftmost_relation())
    }

    // ── Context limits ───────────────────────────────────────────────

    #[test]
    fn descendant_argument() {
        assert_eq!(
            limits("a"),
            (Limit::Infinite, Limit::Fixed(0), RelationType::RelativeDescendant)
        );
    }

    #[test]
    fn child_argument() {
        assert_eq!(
            limits("> a"),
            (Limit::Fixed(1), Limit::Fixed(0), RelationType::RelativeChild)
        );
        assert_eq!(
            limits("> a > b > c"),
            (Limit::Fixed(3), Limit::Fixed(0), RelationType::RelativeChild)
        );
    }

    #[test]
    fn direct_adjacent_argument() {
        assert_eq!(
            limits("+ b"),
            (Limit::Fixed(0), Limit::Fixed(1), RelationType::RelativeDirectAdjacent)
        );
        assert_eq!(
            limits("+ a + b + c"),
            (Limit::Fixed(0), Limit::Fixed(3), RelationType::RelativeDirectAdjacent)
        );
    }

    #[test]
    fn indirect_adjacent_argument() {
        assert_eq!(
            limits("~ a + b"),
            (Limit::Fixed(0), Limit::Infinite, RelationType::RelativeIndirectAdjacent)
        );
    }

    #[test]
    fn child_after_descendant_stays_infinite() {
        assert_eq!(
            limits("> b c"),
            (Limit::Infinite, Limit::Fixed(0), RelationType::RelativeChild)
        );
    }

    #[test]
    fn non_relative_chain() {
        // `a > b c`: descendant, then child.
        let selector = Selector::from_compounds(vec![
            (vec![SelectorComponent::Type("a".into())], RelationType::SubSelector),
            (vec![SelectorComponent::Type("b".into())], RelationType::Child),
            (vec![SelectorComponent::Type("c".into())], RelationType::Descendant),
        ]);
        let c = HasArgumentMatchContext::new(&selector);
        assert_eq!(c.depth_limit(), Limit::Infinite);
        assert_eq!(c.adjacent_distance_limit(), Limit::Fixed(0));
        assert_eq!(c.leftmost_relation(), RelationType::SubSelector);
    }

    #[test]
    fn sibling_then_child() {
        assert_eq!(
            limits("+ a > b"),
            (Limit::Fixed(1), Limit::Fixed(1), RelationType::RelativeDirectAdjacent)
        );
        assert_eq!(
            limits("~ a > b > c"),
            (Limit::Fixed(2), Limit::Infinite, RelationType::RelativeIndirectAdjacent)
        );
    }

    #[test]
    fn child_resets_adjacency_even_when_depth_is_infinite() {
        // `c` lies below the subject, so siblings of the subject never matter.
        assert_eq!(
            limits("> a + b c"),
            (Limit::Infinite, Limit::Fixed(0), RelationType::RelativeChild)
        );
    }

    #[test]
    fn compound_entries_are_skipped() {
        assert_eq!(
            limits("> a.x#y + b.z"),
            (Limit::Fixed(1), Limit::Fixed(0), RelationType::RelativeChild)
        );
    }

    #[test]
    fn empty_chain_has_zero_limits() {
        let selector = Selector::from_compounds(vec![(
            vec![SelectorComponent::Universal],
            RelationType::SubSelector,
        )]);
        let c = HasArgumentMatchContext::new(&selector);
        assert_eq!(c.depth_limit(), Limit::Fixed(0));
        assert_eq!(c.adjacent_distance_limit(), Limit::Fixed(0));
    }

    /// A chain of universal compounds joined by `relations`, listed
    /// rightmost first (the order the context visits them).
    fn chain(relations: &[RelationType]) -> Selector {
        let mut compounds = vec![(vec![SelectorComponent::Universal], RelationType::SubSelector)];
        for &relation in relations.iter().rev() {
            compounds.push((vec![SelectorComponent::Universal], relation));
        }
        Selector::from_compounds(compounds)
    }

    #[test]
    fn limits_never_become_finite_again() {
        use RelationType::*;
        let sequences: [&[RelationType]; 5] = [
            &[Descendant, Child, DirectAdjacent, Child],
            &[IndirectAdjacent, DirectAdjacent, Child, DirectAdjacent],
            &[Child, IndirectAdjacent, Descendant, DirectAdjacent, Child],
            &[DirectAdjacent, Descendant, IndirectAdjacent, Child],
            &[Child, Child, DirectAdjacent, DirectAdjacent, Descendant],
        ];
        for sequence in sequences {
            let mut depth_infinite = false;
            for len in 1..=sequence.len() {
                let c = HasArgumentMatchContext::new(&chain(&sequence[..len]));
                if depth_infinite {
                    assert_eq!(c.depth_limit(), Limit::Infinite, "{sequence:?}[..{len}]");
                }
                depth_infinite = !c.depth_fixed();
            }
        }
    }

    #[test]
    fn adjacency_stays_infinite_until_a_vertical_combinator() {
        use RelationType::*;
        let c = HasArgumentMatchContext::new(&chain(&[IndirectAdjacent, DirectAdjacent]));
        assert_eq!(c.adjacent_distance_limit(), Limit::Infinite);
        let c = HasArgumentMatchContext::new(&chain(&[IndirectAdjacent, DirectAdjacent, Child]));
        assert_eq!(c.adjacent_distance_limit(), Limit::Fixed(0));
        assert_eq!(c.depth_limit(), Limit::Fixed(1));
    }

    // ── Iteration ────────────────────────────────────────────────────

    /// ```text
    /// root
    ///  ├─ s1
    ///  ├─ scope
    ///  │   ├─ c1
    ///  │   │   └─ g1
    ///  │   └─ c2
    ///  │       ├─ g2
    ///  │       └─ g3
    ///  │           └─ gg
    ///  ├─ n1
    ///  │   └─ n1c
    ///  └─ n2
    ///      └─ n2c
    /// ```
    struct Fixture {
        dom: Dom,
        scope: NodeId,
        ids: Vec<(NodeId, &'static str)>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut dom = Dom::new();
            let mut ids = Vec::new();
            let mut add = |dom: &mut Dom, parent: Option<NodeId>, name: &'static str| {
                let data = NodeData::element("div").with_id(name);
                let id = match parent {
                    Some(p) => dom.insert_child(p, data),
                    None => dom.insert(data),
                };
                ids.push((id, name));
                id
            };
            let root = add(&mut dom, None, "root");
            add(&mut dom, Some(root), "s1");
            let scope = add(&mut dom, Some(root), "scope");
            let c1 = add(&mut dom, Some(scope), "c1");
            add(&mut dom, Some(c1), "g1");
            let c2 = add(&mut dom, Some(scope), "c2");
            add(&mut dom, Some(c2), "g2");
            let g3 = add(&mut dom, Some(c2), "g3");
            add(&mut dom, Some(g3), "gg");
            let n1 = add(&mut dom, Some(root), "n1");
            add(&mut dom, Some(n1), "n1c");
            let n2 = add(&mut dom, Some(root), "n2");
            add(&mut dom, Some(n2), "n2c");
            Self { dom, scope, ids }
        }

        fn walk(&self, argument: &str) -> Vec<&'static str> {
            let c = context(argument);
            HasArgumentSubtreeIterator::new(&self.dom, self.scope, &c)
                .map(|id| self.name(id))
                .collect()
        }

        fn name(&self, id: NodeId) -> &'static str {
            self.ids
                .iter()
                .find(|(node, _)| *node == id)
                .map(|(_, name)| *name)
                .unwrap_or("?")
        }
    }

    #[test]
    fn walk_children() {
        let f = Fixture::new();
        assert_eq!(f.walk("> a"), vec!["c2", "c1"]);
    }

    #[test]
    fn walk_descendants() {
        let f = Fixture::new();
        assert_eq!(f.walk("a"), vec!["gg", "g3", "g2", "c2", "g1", "c1"]);
    }

    #[test]
    fn walk_grandchildren_bound() {
        let f = Fixture::new();
        assert_eq!(f.walk("> a > b"), vec!["g3", "g2", "c2", "g1", "c1"]);
    }

    #[test]
    fn walk_next_sibling() {
        let f = Fixture::new();
        assert_eq!(f.walk("+ a"), vec!["n1"]);
        assert_eq!(f.walk("+ a > b"), vec!["n1c", "n1"]);
    }

    #[test]
    fn walk_second_sibling() {
        let f = Fixture::new();
        assert_eq!(f.walk("+ a + b"), vec!["n2"]);
        assert_eq!(f.walk("+ a + b c"), vec!["n2c", "n2"]);
    }

    #[test]
    fn walk_past_last_sibling_is_empty() {
        let f = Fixture::new();
        assert!(f.walk("+ a + b + c").is_empty());
    }

    #[test]
    fn walk_following_siblings() {
        let f = Fixture::new();
        assert_eq!(f.walk("~ a"), vec!["n2", "n1"]);
        assert_eq!(f.walk("~ a b"), vec!["n2c", "n2", "n1c", "n1"]);
    }

    #[test]
    fn walk_without_next_sibling_is_empty() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let _before = dom.insert_child(root, NodeData::element("p"));
        let scope = dom.insert_child(root, NodeData::element("p"));
        let _child = dom.insert_child(scope, NodeData::element("span"));
        let c = context("~ a");
        let mut walk = HasArgumentSubtreeIterator::new(&dom, scope, &c);
        assert!(walk.at_end());
        assert_eq!(walk.next(), None);
    }

    #[test]
    fn walk_without_children_is_empty() {
        let mut dom = Dom::new();
        let scope = dom.insert(NodeData::element("div"));
        let _text = dom.insert_child(scope, NodeData::text("only text"));
        let c = context("> a");
        assert_eq!(HasArgumentSubtreeIterator::new(&dom, scope, &c).count(), 0);
    }

    #[test]
    fn walk_skips_text_nodes() {
        let mut dom = Dom::new();
        let scope = dom.insert(NodeData::element("div"));
        let a = dom.insert_child(scope, NodeData::element("a"));
        let _t1 = dom.insert_child(scope, NodeData::text("x"));
        let b = dom.insert_child(scope, NodeData::element("b"));
        let _t2 = dom.insert_child(scope, NodeData::text("y"));
        let c = context("> a");
        let walked: Vec<_> = HasArgumentSubtreeIterator::new(&dom, scope, &c).collect();
        assert_eq!(walked, vec![b, a]);
    }

    #[test]
    fn iterator_is_fused() {
        let f = Fixture::new();
        let c = context("+ a");
        let mut walk = HasArgumentSubtreeIterator::new(&f.dom, f.scope, &c);
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());
        assert!(walk.at_end());
    }

    #[test]
    fn depth_tracks_position() {
        let f = Fixture::new();
        let c = context("a");
        let mut walk = HasArgumentSubtreeIterator::new(&f.dom, f.scope, &c);
        // Starts at `gg`, three levels below the subject.
        assert_eq!(walk.depth(), 3);
        let depths: Vec<usize> = std::iter::from_fn(|| {
            let depth = walk.depth();
            walk.next().map(|_| depth)
        })
        .collect();
        assert_eq!(depths, vec![3, 2, 2, 1, 2, 1]);
    }

    // ── Brute force comparison ───────────────────────────────────────

    /// Small deterministic generator so the trees vary without a rand
    /// dependency.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }
    }

    fn random_tree(seed: u64, size: usize) -> (Dom, Vec<NodeId>) {
        let mut rng = Lcg(seed);
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("root"));
        let mut elements = vec![root];
        for _ in 0..size {
            let parent = elements[rng.next(elements.len())];
            if rng.next(5) == 0 {
                dom.insert_child(parent, NodeData::text("t"));
            } else {
                elements.push(dom.insert_child(parent, NodeData::element("e")));
            }
        }
        (dom, elements)
    }

    fn preorder(dom: &Dom, node: NodeId, depth: usize, limit: Limit, out: &mut Vec<NodeId>) {
        out.push(node);
        if limit.is_reached_at(depth) {
            return;
        }
        for child in dom.element_children(node) {
            preorder(dom, child, depth + 1, limit, out);
        }
    }

    /// The bounded region computed directly, in reverse document order.
    fn expected(dom: &Dom, scope: NodeId, c: &HasArgumentMatchContext) -> Vec<NodeId> {
        let mut out = Vec::new();
        match c.adjacent_distance_limit() {
            Limit::Infinite => {
                let siblings =
                    std::iter::successors(dom.next_element_sibling(scope), |&s| {
                        dom.next_element_sibling(s)
                    });
                for sibling in siblings {
                    preorder(dom, sibling, 0, c.depth_limit(), &mut out);
                }
            }
            Limit::Fixed(0) => {
                for child in dom.element_children(scope) {
                    preorder(dom, child, 1, c.depth_limit(), &mut out);
                }
            }
            Limit::Fixed(distance) => {
                let target = std::iter::successors(dom.next_element_sibling(scope), |&s| {
                    dom.next_element_sibling(s)
                })
                .nth(distance - 1);
                if let Some(target) = target {
                    preorder(dom, target, 0, c.depth_limit(), &mut out);
                }
            }
        }
        out.reverse();
        out
    }

    #[test]
    fn matches_brute_force_on_random_trees() {
        let arguments = [
            "a", "> a", "> a > b", "> a > b > c", "+ a", "+ a + b", "+ a > b", "+ a b",
            "~ a", "~ a > b", "~ a b", "+ a + b > c > d", "> a + b c",
        ];
        let contexts: Vec<_> = arguments.iter().map(|a| context(a)).collect();
        for seed in 1..=12u64 {
            let (dom, elements) = random_tree(seed, 40);
            for &scope in &elements {
                for (argument, c) in arguments.iter().zip(&contexts) {
                    let walked: Vec<_> = HasArgumentSubtreeIterator::new(&dom, scope, c).collect();
                    assert_eq!(
                        walked,
                        expected(&dom, scope, c),
                        "seed {seed}, argument {argument:?}"
                    );
                    assert!(!walked.contains(&scope));
                }
            }
        }
    }
}
