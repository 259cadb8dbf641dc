use crate::*;
use petgraph::graph::{EdgeIndex, NodeIndex};

fn ethanol() -> Structure {
    let mut b = StructureBuilder::new();
    let c1 = b.add_atom("C").unwrap();
    let c2 = b.add_atom("C").unwrap();
    let o = b.add_atom("O").unwrap();
    b.bond(c1, c2, BondOrder::Single);
    b.bond(c2, o, BondOrder::Single);
    b.build().unwrap()
}

#[test]
fn structure_add_nodes_and_connectors() {
    let mut s = Structure::new();
    let c = s.add_node(Node::atom(Element::C));
    let o = s.add_node(Node::atom(Element::O));
    let e = s.add_connector(c, o, Connector::double()).unwrap();

    assert_eq!(s.node_count(), 2);
    assert_eq!(s.connector_count(), 1);
    assert_eq!(s.connector(e).order, BondOrder::Double);
    assert_eq!(s.connector_between(o, c), Some(e));
    assert_eq!(s.hydrogen_count(c, false), 2);
    assert_eq!(s.hydrogen_count(o, false), 0);
}

#[test]
fn trait_accessors_mirror_fields() {
    let mut node = Node::atom(Element::N);
    node.set_canonical_rank(Some(3));
    node.set_parity(StereoParity::Odd);
    assert_eq!(node.canonical_rank, Some(3));
    assert_eq!(HasParity::parity(&node), StereoParity::Odd);

    let mut connector = Connector::single();
    connector.set_parity(StereoParity::Even);
    assert_eq!(connector.parity, StereoParity::Even);
    assert_eq!(HasCanonicalRank::canonical_rank(&connector), None);
}

#[test]
fn canonical_order_puts_heavier_keys_last() {
    let mut s = ethanol();
    canonicalize(&mut s, None).unwrap();
    let order = s.canonical_node_order();
    assert_eq!(order.len(), 3);
    assert_eq!(order.last(), Some(&NodeIndex::new(2)));
    assert!(s.graph().edge_weights().all(|c| c.canonical_rank.is_some()));
}

#[test]
fn pipeline_on_a_chiral_alcohol() {
    // butan-2-ol with a wedge on the hydroxyl
    let mut b = StructureBuilder::new();
    let c1 = b.add_atom_at("C", -1.0, 0.0).unwrap();
    let c2 = b.add_atom_at("C", 0.0, 0.0).unwrap();
    let c3 = b.add_atom_at("C", 0.5, -0.866).unwrap();
    let c4 = b.add_atom_at("C", 1.5, -0.866).unwrap();
    let o = b.add_atom_at("O", 0.5, 0.866).unwrap();
    b.bond(c1, c2, BondOrder::Single);
    b.bond(c2, c3, BondOrder::Single);
    b.bond(c3, c4, BondOrder::Single);
    b.wedge(c2, o, BondStereo::Up);
    let mut s = b.build().unwrap();

    let report = standardize(&mut s, &StandardizeOptions::default(), &Canonicalizer::default()).unwrap();
    assert_eq!(report.stereo.nodes, vec![NodePath::top(NodeIndex::new(c2))]);
    assert!(report.stereo.connectors.is_empty());
    assert!(report.aromatic_rings.is_empty());
    assert!(s.node(NodeIndex::new(c2)).parity.is_determined());
}

#[test]
fn ring_queries_through_ring_info() {
    let mut b = StructureBuilder::new();
    let atoms: Vec<usize> = (0..5).map(|_| b.add_atom("C").unwrap()).collect();
    b.ring(&atoms);
    let tail = b.add_atom("O").unwrap();
    b.bond(atoms[0], tail, BondOrder::Single);
    let s = b.build().unwrap();

    let info = RingInfo::sssr(&s);
    assert_eq!(info.num_rings(), 1);
    assert_eq!(expected_ring_count(&s), 1);
    assert!(info.is_ring_node(NodeIndex::new(atoms[0])));
    assert!(!info.is_ring_node(NodeIndex::new(tail)));
    assert!(!info.is_ring_connector(EdgeIndex::new(5)));
    assert_eq!(info.smallest_ring_size_of_node(NodeIndex::new(atoms[2])), Some(5));
}

#[test]
fn same_structure_regardless_of_input_numbering() {
    let a = ethanol();
    let b = {
        let mut b = StructureBuilder::new();
        let o = b.add_atom("O").unwrap();
        let c2 = b.add_atom("C").unwrap();
        let c1 = b.add_atom("C").unwrap();
        b.bond(o, c2, BondOrder::Single);
        b.bond(c1, c2, BondOrder::Single);
        b.build().unwrap()
    };
    assert!(is_same_structure(&a, &b, &ComparisonOptions::default()).unwrap());
    assert!(contains_sub_structure(&a, &b, &SearchOptions::default()).unwrap());
}

#[test]
fn error_messages_name_the_problem() {
    let err = StructureBuilder::new().add_atom("Xx").unwrap_err();
    assert!(err.to_string().contains("Xx"));
    assert_eq!(
        StructureError::SearchLimitExceeded { limit: 10 }.to_string(),
        "sub-structure search exceeded the limit of 10 steps"
    );
}
