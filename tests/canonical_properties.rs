use std::cmp::Ordering;

use chemstruct::{
    canonicalize, compare_structures, BondOrder, ComparisonLevel, ComparisonOptions, Connector,
    Element, Node, Structure,
};
use proptest::prelude::*;
use proptest::sample::Index;

const ELEMENTS: [Element; 5] = [Element::C, Element::N, Element::O, Element::S, Element::Cl];

/// A random tree: node `i > 0` hangs off an earlier node.
fn arb_tree() -> impl Strategy<Value = Structure> {
    (2usize..12)
        .prop_flat_map(|n| {
            (
                proptest::collection::vec(0..ELEMENTS.len(), n),
                proptest::collection::vec(any::<Index>(), n - 1),
            )
        })
        .prop_map(|(elements, parents)| {
            let nodes = elements.iter().map(|&e| Node::atom(ELEMENTS[e])).collect();
            let connectors = parents
                .iter()
                .enumerate()
                .map(|(i, parent)| (parent.index(i + 1), i + 1, Connector::new(BondOrder::Single)))
                .collect();
            Structure::from_parts(nodes, connectors).unwrap()
        })
}

/// A tree with up to two extra connectors closing rings.
fn arb_cyclic() -> impl Strategy<Value = Structure> {
    (arb_tree(), proptest::collection::vec((any::<Index>(), any::<Index>()), 0..3)).prop_map(
        |(mut s, closures)| {
            let n = s.node_count();
            for (a, b) in closures {
                let (a, b) = (
                    petgraph::graph::NodeIndex::new(a.index(n)),
                    petgraph::graph::NodeIndex::new(b.index(n)),
                );
                if a != b && s.connector_between(a, b).is_none() {
                    s.add_connector(a, b, Connector::single()).unwrap();
                }
            }
            s
        },
    )
}

fn with_permutation(s: Structure) -> impl Strategy<Value = (Structure, Vec<usize>, Vec<usize>)> {
    let nodes: Vec<usize> = (0..s.node_count()).collect();
    let connectors: Vec<usize> = (0..s.connector_count()).collect();
    (
        Just(s),
        Just(nodes).prop_shuffle(),
        Just(connectors).prop_shuffle(),
    )
}

fn ranks(s: &Structure) -> Vec<Option<usize>> {
    s.graph().node_weights().map(|n| n.canonical_rank).collect()
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(s in arb_cyclic()) {
        let mut once = s.clone();
        canonicalize(&mut once, None).unwrap();
        let mut twice = once.clone();
        canonicalize(&mut twice, None).unwrap();
        prop_assert_eq!(ranks(&once), ranks(&twice));
    }

    #[test]
    fn ranks_do_not_depend_on_input_order(
        (s, node_order, connector_order) in arb_tree().prop_flat_map(with_permutation)
    ) {
        let mut original = s.clone();
        canonicalize(&mut original, None).unwrap();
        let mut permuted = s.permuted(&node_order, &connector_order).unwrap();
        canonicalize(&mut permuted, None).unwrap();

        let a = original.canonical_node_order();
        let b = permuted.canonical_node_order();
        for (&x, &y) in a.iter().zip(&b) {
            let (x, y) = (original.node(x), permuted.node(y));
            prop_assert_eq!(x.identity_code(), y.identity_code());
            prop_assert_eq!(x.symmetry_class, y.symmetry_class);
        }
        let exact = ComparisonOptions::with_level(ComparisonLevel::Exact);
        prop_assert_eq!(compare_structures(&s, &permuted, &exact).unwrap(), Ordering::Equal);
    }

    #[test]
    fn ring_structures_compare_equal_in_any_order(
        (s, node_order, connector_order) in arb_cyclic().prop_flat_map(with_permutation)
    ) {
        let permuted = s.permuted(&node_order, &connector_order).unwrap();
        let exact = ComparisonOptions::with_level(ComparisonLevel::Exact);
        prop_assert_eq!(compare_structures(&s, &permuted, &exact).unwrap(), Ordering::Equal);
    }

    #[test]
    fn comparison_is_reflexive(s in arb_cyclic()) {
        for level in [ComparisonLevel::Skeletal, ComparisonLevel::Constitution, ComparisonLevel::Exact] {
            let options = ComparisonOptions::with_level(level);
            prop_assert_eq!(compare_structures(&s, &s, &options).unwrap(), Ordering::Equal);
        }
    }

    #[test]
    fn comparison_is_antisymmetric(a in arb_tree(), b in arb_tree()) {
        let options = ComparisonOptions::default();
        let ab = compare_structures(&a, &b, &options).unwrap();
        let ba = compare_structures(&b, &a, &options).unwrap();
        prop_assert_eq!(ab, ba.reverse());
    }
}
