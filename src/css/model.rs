//! Selector model: simple selectors linked into a rightmost-first chain.
//!
//! A complex selector such as `div > p.note` is stored as one flat list of
//! simple selectors, starting at the rightmost compound:
//!
//! ```text
//! [p (SubSelector), .note (Child), div (SubSelector)]
//! ```
//!
//! Each entry carries the relation to the entry after it. Inside a compound
//! that relation is [`RelationType::SubSelector`]; the last entry of a compound
//! carries the combinator to the compound on its left. The entry after a given
//! one is its *tag history*.
//!
//! Relative selectors (the arguments of `:has()`) end in a compound holding
//! only [`SelectorComponent::RelativeAnchor`], joined by one of the
//! `Relative*` relations. `:has(> a b)` stores its argument as:
//!
//! ```text
//! [b (Descendant), a (RelativeChild), <anchor> (SubSelector)]
//! ```

use std::fmt;

/// How a simple selector relates to the next entry in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// Next entry is in the same compound.
    SubSelector,
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    DirectAdjacent,
    /// `A ~ B`
    IndirectAdjacent,
    /// `:has(B)`, leftmost combinator of a relative selector.
    RelativeDescendant,
    /// `:has(> B)`
    RelativeChild,
    /// `:has(+ B)`
    RelativeDirectAdjacent,
    /// `:has(~ B)`
    RelativeIndirectAdjacent,
}

impl RelationType {
    /// Whether this is one of the `Relative*` variants.
    pub fn is_relative(self) -> bool {
        matches!(
            self,
            RelationType::RelativeDescendant
                | RelationType::RelativeChild
                | RelationType::RelativeDirectAdjacent
                | RelationType::RelativeIndirectAdjacent
        )
    }

    /// The `Relative*` flavour of a combinator. Relative relations map to
    /// themselves; `SubSelector` has none.
    pub fn to_relative(self) -> Option<RelationType> {
        match self {
            RelationType::Descendant | RelationType::RelativeDescendant => {
                Some(RelationType::RelativeDescendant)
            }
            RelationType::Child | RelationType::RelativeChild => Some(RelationType::RelativeChild),
            RelationType::DirectAdjacent | RelationType::RelativeDirectAdjacent => {
                Some(RelationType::RelativeDirectAdjacent)
            }
            RelationType::IndirectAdjacent | RelationType::RelativeIndirectAdjacent => {
                Some(RelationType::RelativeIndirectAdjacent)
            }
            RelationType::SubSelector => None,
        }
    }

    /// CSS spelling of the combinator (`" "`, `">"`, `"+"`, `"~"`).
    fn combinator_str(self) -> &'static str {
        match self {
            RelationType::SubSelector => "",
            RelationType::Descendant | RelationType::RelativeDescendant => " ",
            RelationType::Child | RelationType::RelativeChild => ">",
            RelationType::DirectAdjacent | RelationType::RelativeDirectAdjacent => "+",
            RelationType::IndirectAdjacent | RelationType::RelativeIndirectAdjacent => "~",
        }
    }
}

/// A single simple selector.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Type selector: matches the element's tag name (e.g. `div`).
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// Class selector: `.classname`.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Pseudo-class without runtime support: `:hover`, `:focus`, etc.
    PseudoClass(String),
    /// `:scope`.
    Scope,
    /// `:has(<relative selector list>)`.
    Has(Vec<Selector>),
    /// Implicit anchor of a relative selector: the `:has()` subject.
    RelativeAnchor,
}

/// A simple selector plus its relation to the next entry of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSelector {
    pub component: SelectorComponent,
    pub relation: RelationType,
}

impl SimpleSelector {
    pub fn new(component: SelectorComponent, relation: RelationType) -> Self {
        Self {
            component,
            relation,
        }
    }
}

/// A complex or relative selector, rightmost compound first.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    simple: Vec<SimpleSelector>,
}

impl Selector {
    /// Build a selector from compounds listed left to right.
    ///
    /// `compounds[i].1` is the combinator between compound `i - 1` and
    /// compound `i`; it is ignored for the first compound.
    ///
    /// # Panics
    ///
    /// Panics (debug) if any compound is empty.
    pub fn from_compounds(compounds: Vec<(Vec<SelectorComponent>, RelationType)>) -> Self {
        let mut simple = Vec::new();
        for (index, (components, combinator)) in compounds.into_iter().enumerate().rev() {
            debug_assert!(!components.is_empty(), "empty compound selector");
            let last = components.len() - 1;
            for (position, component) in components.into_iter().enumerate() {
                let relation = if position == last && index > 0 {
                    combinator
                } else {
                    RelationType::SubSelector
                };
                simple.push(SimpleSelector::new(component, relation));
            }
        }
        Self { simple }
    }

    /// Build a relative selector (a `:has()` argument) from compounds listed
    /// left to right. `leading` is the combinator before the first compound.
    pub fn relative(
        leading: RelationType,
        compounds: Vec<(Vec<SelectorComponent>, RelationType)>,
    ) -> Self {
        let leading = leading.to_relative().unwrap_or(RelationType::RelativeDescendant);
        let mut with_anchor = Vec::with_capacity(compounds.len() + 1);
        with_anchor.push((
            vec![SelectorComponent::RelativeAnchor],
            RelationType::SubSelector,
        ));
        for (index, (components, combinator)) in compounds.into_iter().enumerate() {
            let combinator = if index == 0 { leading } else { combinator };
            with_anchor.push((components, combinator));
        }
        Self::from_compounds(with_anchor)
    }

    /// All simple selectors, rightmost first.
    pub fn simple_selectors(&self) -> &[SimpleSelector] {
        &self.simple
    }

    /// Index of the entry after `index`, if any.
    pub fn tag_history(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.simple.len()).then_some(next)
    }

    /// Whether this is a relative selector.
    pub fn is_relative(&self) -> bool {
        self.simple.iter().any(|s| s.relation.is_relative())
    }

    /// Number of compound selectors, anchor included.
    pub fn compound_count(&self) -> usize {
        if self.simple.is_empty() {
            return 0;
        }
        1 + self
            .simple
            .iter()
            .filter(|s| s.relation != RelationType::SubSelector)
            .count()
    }

    /// Compounds left to right, each with the relation joining it to the
    /// compound on its left (`SubSelector` for the leftmost).
    fn compounds_left_to_right(&self) -> Vec<(&[SimpleSelector], RelationType)> {
        let mut compounds = Vec::new();
        let mut start = 0;
        for (index, simple) in self.simple.iter().enumerate() {
            let is_last_entry = index + 1 == self.simple.len();
            if simple.relation != RelationType::SubSelector || is_last_entry {
                compounds.push(&self.simple[start..=index]);
                start = index + 1;
            }
        }
        compounds.reverse();
        compounds
            .into_iter()
            .enumerate()
            .map(|(i, compound)| {
                let relation = if i == 0 {
                    RelationType::SubSelector
                } else {
                    compound.last().map_or(RelationType::SubSelector, |s| s.relation)
                };
                (compound, relation)
            })
            .collect()
    }
}

impl fmt::Display for SelectorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorComponent::Type(name) => write!(f, "{name}"),
            SelectorComponent::Universal => write!(f, "*"),
            SelectorComponent::Class(name) => write!(f, ".{name}"),
            SelectorComponent::Id(name) => write!(f, "#{name}"),
            SelectorComponent::PseudoClass(name) => write!(f, ":{name}"),
            SelectorComponent::Scope => write!(f, ":scope"),
            SelectorComponent::Has(arguments) => {
                write!(f, ":has(")?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            SelectorComponent::RelativeAnchor => Ok(()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (compound, relation)) in self.compounds_left_to_right().into_iter().enumerate() {
            let is_anchor = matches!(
                compound,
                [SimpleSelector {
                    component: SelectorComponent::RelativeAnchor,
                    ..
                }]
            );
            if is_anchor {
                continue;
            }
            match relation.combinator_str() {
                "" => {}
                " " if relation.is_relative() => {}
                " " => write!(f, " ")?,
                symbol if relation.is_relative() => write!(f, "{symbol} ")?,
                symbol => write!(f, " {symbol} ")?,
            }
            debug_assert!(index > 0 || relation == RelationType::SubSelector);
            // Compounds are stored rightmost-first within the chain, but the
            // entries of one compound keep their source order.
            for simple in compound {
                write!(f, "{}", simple.component)?;
            }
        }
        Ok(())
    }
}

/// Write selectors separated by `", "`.
pub fn write_list(f: &mut fmt::Formatter<'_>, selectors: &[Selector]) -> fmt::Result {
    for (index, selector) in selectors.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{selector}")?;
    }
    Ok(())
}
