//! Transitive closure of the carrying set.
//!
//! A class can be referenced before it is known to carry a managed pointer,
//! so one walk is not enough. The fixed-point strategy repeats the walk until
//! nothing grows; every non-final walk adds at least one element to a finite
//! set, so it terminates. The two-pass strategy stops after the second walk
//! and misses chains that need more.

use gcw_core::{ClosureStrategy, InstrumentOptions, SyntaxNode};
use tracing::debug;

use crate::walker::{Classification, GraphWalker};

/// Runs the walker as many times as the configured strategy asks.
#[derive(Debug, Clone, Copy)]
pub struct ClosureResolver<'a> {
    walker: GraphWalker<'a>,
    strategy: ClosureStrategy,
}

impl<'a> ClosureResolver<'a> {
    #[must_use]
    pub const fn new(options: &'a InstrumentOptions) -> Self {
        Self {
            walker: GraphWalker::new(options),
            strategy: options.closure,
        }
    }

    #[must_use]
    pub fn resolve(&self, root: &SyntaxNode) -> Classification {
        let mut state = Classification::default();
        loop {
            let grew = self.walker.walk(root, &mut state);
            state.passes += 1;
            debug!(
                pass = state.passes,
                carriers = state.carriers.len(),
                pointer_fields = state.uses_pointer.len(),
                class_fields = state.uses_class_that_uses_pointer.len(),
                bases = state.inherits_from_user.len(),
                grew,
                "closure pass finished"
            );
            let done = match self.strategy {
                ClosureStrategy::FixedPoint => !grew,
                ClosureStrategy::TwoPass => state.passes >= 2,
            };
            if done {
                return state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gcw_core::{ClassKey, Extent, Location, ScopePath, TypeDescriptor};
    use rstest::rstest;

    use super::*;

    fn class(name: &str, line: u32) -> SyntaxNode {
        let extent = Extent::new("a.hpp", Location::new(line, 1), Location::new(line + 2, 2))
            .expect("valid extent");
        SyntaxNode::class(name, extent)
    }

    fn holds(name: &str, line: u32, held: &str) -> SyntaxNode {
        class(name, line).with_child(SyntaxNode::field("held", TypeDescriptor::record(held)))
    }

    /// `Top` holds `Mid` holds `Low` holds a managed pointer, declared
    /// top-down so every reference points forward.
    fn reversed_chain() -> SyntaxNode {
        SyntaxNode::translation_unit()
            .with_child(holds("Top", 1, "Mid"))
            .with_child(holds("Mid", 5, "Low"))
            .with_child(class("Low", 9).with_child(SyntaxNode::field(
                "ptr_",
                TypeDescriptor::record("memory::gc_ptr<Node>"),
            )))
    }

    fn is_carrier(state: &Classification, name: &str) -> bool {
        state.is_carrier(&ClassKey::new(name, ScopePath::root()))
    }

    #[test]
    fn fixed_point_reaches_every_forward_reference() {
        let options = InstrumentOptions::default();
        let state = ClosureResolver::new(&options).resolve(&reversed_chain());
        assert!(is_carrier(&state, "Top"));
        assert!(is_carrier(&state, "Mid"));
        assert!(is_carrier(&state, "Low"));
        assert_eq!(state.passes, 4);
    }

    #[test]
    fn two_pass_misses_three_link_forward_chain() {
        let options = InstrumentOptions {
            closure: ClosureStrategy::TwoPass,
            ..InstrumentOptions::default()
        };
        let state = ClosureResolver::new(&options).resolve(&reversed_chain());
        assert_eq!(state.passes, 2);
        assert!(is_carrier(&state, "Mid"));
        assert!(!is_carrier(&state, "Top"));
    }

    #[rstest]
    #[case(ClosureStrategy::FixedPoint)]
    #[case(ClosureStrategy::TwoPass)]
    fn declaration_order_does_not_matter_for_one_link(#[case] closure: ClosureStrategy) {
        let options = InstrumentOptions {
            closure,
            ..InstrumentOptions::default()
        };
        let leaf = class("Leaf", 1).with_child(SyntaxNode::field(
            "ptr_",
            TypeDescriptor::record("memory::gc_ptr<Node>"),
        ));
        let forward = SyntaxNode::translation_unit()
            .with_child(holds("Mid", 5, "Leaf"))
            .with_child(leaf.clone());
        let backward = SyntaxNode::translation_unit()
            .with_child(leaf)
            .with_child(holds("Mid", 5, "Leaf"));

        let resolver = ClosureResolver::new(&options);
        let a = resolver.resolve(&forward);
        let b = resolver.resolve(&backward);
        assert_eq!(a.carriers, b.carriers);
        assert!(is_carrier(&a, "Mid"));
    }

    #[test]
    fn unit_without_pointers_stops_after_one_pass() {
        let options = InstrumentOptions::default();
        let root = SyntaxNode::translation_unit().with_child(holds("A", 1, "B"));
        let state = ClosureResolver::new(&options).resolve(&root);
        assert_eq!(state.passes, 1);
        assert!(state.carriers.is_empty());
    }
}
