mod common;

use chemstruct::{
    canonicalize, is_same_structure, perceive_stereos, BondStereo, ComparisonLevel, ComparisonOptions,
    ConnectorPath, StereoOptions, StereoParity,
};
use petgraph::graph::{EdgeIndex, NodeIndex};

#[test]
fn but_2_ene_round_trip() {
    for (cis, expected) in [(false, StereoParity::Even), (true, StereoParity::Odd)] {
        let mut s = common::butene(cis);
        let found = perceive_stereos(&mut s, &StereoOptions::default()).unwrap();
        assert_eq!(found.connectors, vec![ConnectorPath::top(EdgeIndex::new(1))]);
        assert!(found.nodes.is_empty());
        assert_eq!(s.connector(EdgeIndex::new(1)).parity, expected, "cis = {cis}");
    }
}

#[test]
fn ring_substituents_are_stereo_centers() {
    let mut s = common::cis_dimethyl_cyclohexane();
    canonicalize(&mut s, None).unwrap();
    let found = perceive_stereos(&mut s, &StereoOptions::default()).unwrap();
    let mut centers: Vec<NodeIndex> = found.nodes.iter().map(|p| p.node).collect();
    centers.sort();
    assert_eq!(centers, vec![NodeIndex::new(0), NodeIndex::new(1)]);
    assert!(centers.iter().all(|&c| s.node(c).parity.is_determined()));
    assert!(found.connectors.is_empty());
}

#[test]
fn unsubstituted_ring_has_no_stereo() {
    let mut s = common::cyclohexane();
    let found = perceive_stereos(&mut s, &StereoOptions::default()).unwrap();
    assert!(found.nodes.is_empty());
    assert!(found.connectors.is_empty());
}

#[test]
fn trans_enantiomers_differ_only_in_configuration() {
    let [a, b] = common::trans_diethyl_cyclohexanes();
    let constitution = ComparisonOptions::with_level(ComparisonLevel::Constitution);
    let configuration = ComparisonOptions::with_level(ComparisonLevel::Configuration);
    assert!(is_same_structure(&a, &b, &constitution).unwrap());
    assert!(!is_same_structure(&a, &b, &configuration).unwrap());
    assert!(!is_same_structure(&common::cis_diethyl_cyclohexane(), &a, &configuration).unwrap());
}

#[test]
fn cis_mirror_drawing_is_the_same_meso_compound() {
    let up = common::disubstituted_cyclohexane(1, BondStereo::Up, BondStereo::Up);
    let down = common::disubstituted_cyclohexane(1, BondStereo::Down, BondStereo::Down);
    let configuration = ComparisonOptions::with_level(ComparisonLevel::Configuration);
    assert!(is_same_structure(&up, &down, &configuration).unwrap());
}

#[test]
fn parity_calculation_can_be_skipped() {
    let mut s = common::butene(true);
    let options = StereoOptions {
        calc_parity: false,
        ..StereoOptions::default()
    };
    let found = perceive_stereos(&mut s, &options).unwrap();
    assert_eq!(found.connectors.len(), 1);
    assert_eq!(s.connector(EdgeIndex::new(1)).parity, StereoParity::None);
}
