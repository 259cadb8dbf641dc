use std::cmp::Ordering;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::canonical::{rank_graph, Canonicalizer};
use crate::element::Element;
use crate::error::Result;
use crate::standardize::{standardize, StandardizeOptions};
use crate::structure::Structure;

/// How much of a structure takes part in a comparison, from bare
/// connectivity up to every recorded attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonLevel {
    /// Connectivity and node category only.
    Skeletal,
    /// Adds elements, isotopes, charges, hydrogens and bond orders.
    Constitution,
    /// Adds stereo parities.
    Configuration,
    /// Adds lone pairs and radicals.
    #[default]
    Exact,
}

/// A comparison level with optional per-attribute overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
    pub level: ComparisonLevel,
    pub atom: Option<bool>,
    pub mass: Option<bool>,
    pub charge: Option<bool>,
    pub stereo: Option<bool>,
    pub hydrogen_count: Option<bool>,
    pub lone_pair: Option<bool>,
    pub radical: Option<bool>,
    pub linked_connector_count: Option<bool>,
    pub bond_order: Option<bool>,
    pub bond_type: Option<bool>,
}

/// The attributes a comparison looks at, after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonFlags {
    pub atom: bool,
    pub mass: bool,
    pub charge: bool,
    pub stereo: bool,
    pub hydrogen_count: bool,
    pub lone_pair: bool,
    pub radical: bool,
    pub linked_connector_count: bool,
    pub bond_order: bool,
    pub bond_type: bool,
}

impl ComparisonFlags {
    pub fn for_level(level: ComparisonLevel) -> Self {
        let constitution = level >= ComparisonLevel::Constitution;
        let configuration = level >= ComparisonLevel::Configuration;
        let exact = level >= ComparisonLevel::Exact;
        Self {
            atom: constitution,
            mass: constitution,
            charge: constitution,
            stereo: configuration,
            hydrogen_count: constitution,
            lone_pair: exact,
            radical: exact,
            linked_connector_count: true,
            bond_order: constitution,
            bond_type: constitution,
        }
    }
}

impl ComparisonOptions {
    pub fn with_level(level: ComparisonLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn flags(&self) -> ComparisonFlags {
        let base = ComparisonFlags::for_level(self.level);
        ComparisonFlags {
            atom: self.atom.unwrap_or(base.atom),
            mass: self.mass.unwrap_or(base.mass),
            charge: self.charge.unwrap_or(base.charge),
            stereo: self.stereo.unwrap_or(base.stereo),
            hydrogen_count: self.hydrogen_count.unwrap_or(base.hydrogen_count),
            lone_pair: self.lone_pair.unwrap_or(base.lone_pair),
            radical: self.radical.unwrap_or(base.radical),
            linked_connector_count: self
                .linked_connector_count
                .unwrap_or(base.linked_connector_count),
            bond_order: self.bond_order.unwrap_or(base.bond_order),
            bond_type: self.bond_type.unwrap_or(base.bond_type),
        }
    }
}

/// Comparable summary of a node. Attributes switched off by the flags are
/// zeroed, so two nodes are equivalent exactly when their values are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeCompareValue {
    pub class: u8,
    pub identity: u16,
    pub label: String,
    pub mass: u16,
    pub linked_connectors: usize,
    pub charge: i8,
    pub parity: u8,
    pub hydrogens: u8,
    pub lone_pairs: u8,
    pub radical: u8,
}

/// Comparable summary of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorCompareValue {
    pub bond_type: u8,
    pub parity: u8,
    /// Bonding electrons, 3 for aromatic connectors.
    pub electrons: u8,
}

pub fn node_compare_value(
    structure: &Structure,
    node: NodeIndex,
    flags: &ComparisonFlags,
) -> NodeCompareValue {
    let n = structure.node(node);
    let linked = structure
        .neighbors(node)
        .filter(|&m| !structure.node(m).is_element(Element::H))
        .count();
    NodeCompareValue {
        class: n.class_code(),
        identity: if flags.atom { n.identity_code() } else { 0 },
        label: if flags.atom {
            n.identity_label()
        } else {
            String::new()
        },
        mass: if flags.mass {
            n.mass_number().unwrap_or(0)
        } else {
            0
        },
        linked_connectors: if flags.linked_connector_count { linked } else { 0 },
        charge: if flags.charge { n.charge } else { 0 },
        parity: if flags.stereo { n.parity.code() } else { 0 },
        hydrogens: if flags.hydrogen_count {
            structure.hydrogen_count(node, true)
        } else {
            0
        },
        lone_pairs: if flags.lone_pair { n.lone_pairs } else { 0 },
        radical: if flags.radical { n.radical as u8 } else { 0 },
    }
}

pub fn connector_compare_value(
    structure: &Structure,
    connector: EdgeIndex,
    flags: &ComparisonFlags,
) -> ConnectorCompareValue {
    let c = structure.connector(connector);
    ConnectorCompareValue {
        bond_type: if flags.bond_type { c.bond_type.code() } else { 0 },
        parity: if flags.stereo { c.parity.code() } else { 0 },
        electrons: match (flags.bond_order, c.is_aromatic) {
            (false, _) => 0,
            (true, true) => 3,
            (true, false) => c.order.electron_count(),
        },
    }
}

/// Node values in an order derived from the compared attributes alone, and
/// connectors as `(lower end position, upper end position, value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CanonicalForm {
    nodes: Vec<NodeCompareValue>,
    connectors: Vec<(usize, usize, ConnectorCompareValue)>,
}

impl CanonicalForm {
    fn of(structure: &Structure, flags: &ComparisonFlags) -> Self {
        let keys: Vec<NodeCompareValue> = structure
            .nodes()
            .map(|n| node_compare_value(structure, n, flags))
            .collect();
        let adj: Vec<Vec<(usize, ConnectorCompareValue)>> = structure
            .nodes()
            .map(|n| {
                structure
                    .links(n)
                    .map(|(e, other)| (other.index(), connector_compare_value(structure, e, flags)))
                    .collect()
            })
            .collect();
        let ranks = rank_graph(&keys, &adj).ranks;

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by_key(|&i| ranks[i]);
        let nodes = order.iter().map(|&i| keys[i].clone()).collect();
        let mut connectors: Vec<(usize, usize, ConnectorCompareValue)> = structure
            .connectors()
            .filter_map(|e| {
                let (a, b) = structure.connector_ends(e)?;
                let (ra, rb) = (ranks[a.index()], ranks[b.index()]);
                Some((ra.min(rb), ra.max(rb), connector_compare_value(structure, e, flags)))
            })
            .collect();
        connectors.sort_unstable();
        Self { nodes, connectors }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        self.nodes
            .len()
            .cmp(&other.nodes.len())
            .then_with(|| self.nodes.cmp(&other.nodes))
            .then_with(|| self.connectors.len().cmp(&other.connectors.len()))
            .then_with(|| self.connectors.cmp(&other.connectors))
    }
}

/// Compares two structures already standardized.
pub fn compare_standardized(a: &Structure, b: &Structure, options: &ComparisonOptions) -> Ordering {
    let flags = options.flags();
    CanonicalForm::of(a, &flags).cmp(&CanonicalForm::of(b, &flags))
}

/// Compares copies of two structures after standardizing them, so the
/// input order of nodes and connectors never matters. `Equal` means the
/// structures are the same under `options`; the other results give a
/// consistent total order.
pub fn compare_structures(a: &Structure, b: &Structure, options: &ComparisonOptions) -> Result<Ordering> {
    compare_structures_with(a, b, options, &Canonicalizer::default())
}

pub fn compare_structures_with(
    a: &Structure,
    b: &Structure,
    options: &ComparisonOptions,
    canonicalizer: &Canonicalizer,
) -> Result<Ordering> {
    let standardize_options = StandardizeOptions {
        do_stereo_perception: options.flags().stereo,
        ..StandardizeOptions::default()
    };
    let mut a = a.clone();
    let mut b = b.clone();
    standardize(&mut a, &standardize_options, canonicalizer)?;
    standardize(&mut b, &standardize_options, canonicalizer)?;
    let ordering = compare_standardized(&a, &b, options);
    log::debug!("compared structures at {:?}: {:?}", options.level, ordering);
    Ok(ordering)
}

pub fn is_same_structure(a: &Structure, b: &Structure, options: &ComparisonOptions) -> Result<bool> {
    Ok(compare_structures(a, b, options)? == Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StructureBuilder;
    use crate::connector::{BondOrder, Connector};
    use crate::node::{Node, Radical};

    fn chain(symbols: &[&str]) -> Structure {
        let mut b = StructureBuilder::new();
        let atoms: Vec<usize> = symbols.iter().map(|s| b.add_atom(s).unwrap()).collect();
        for w in atoms.windows(2) {
            b.bond(w[0], w[1], BondOrder::Single);
        }
        b.build().unwrap()
    }

    fn butene(cis: bool) -> Structure {
        let mut b = StructureBuilder::new();
        let c1 = b.add_atom_at("C", -0.5, 0.866).unwrap();
        let c2 = b.add_atom_at("C", 0.0, 0.0).unwrap();
        let c3 = b.add_atom_at("C", 1.0, 0.0).unwrap();
        let c4 = b.add_atom_at("C", 1.5, if cis { 0.866 } else { -0.866 }).unwrap();
        b.bond(c1, c2, BondOrder::Single);
        b.bond(c2, c3, BondOrder::Double);
        b.bond(c3, c4, BondOrder::Single);
        b.build().unwrap()
    }

    fn level(level: ComparisonLevel) -> ComparisonOptions {
        ComparisonOptions::with_level(level)
    }

    #[test]
    fn level_flags() {
        let skeletal = ComparisonFlags::for_level(ComparisonLevel::Skeletal);
        assert!(!skeletal.atom && !skeletal.bond_order && skeletal.linked_connector_count);
        let constitution = ComparisonFlags::for_level(ComparisonLevel::Constitution);
        assert!(constitution.atom && constitution.charge && !constitution.stereo);
        assert!(ComparisonFlags::for_level(ComparisonLevel::Configuration).stereo);
        assert!(ComparisonFlags::for_level(ComparisonLevel::Exact).lone_pair);

        let options = ComparisonOptions {
            charge: Some(false),
            ..level(ComparisonLevel::Constitution)
        };
        assert!(!options.flags().charge);
    }

    #[test]
    fn reflexive() {
        let s = chain(&["C", "C", "O"]);
        for l in [
            ComparisonLevel::Skeletal,
            ComparisonLevel::Constitution,
            ComparisonLevel::Configuration,
            ComparisonLevel::Exact,
        ] {
            assert_eq!(compare_structures(&s, &s, &level(l)).unwrap(), Ordering::Equal);
        }
    }

    #[test]
    fn skeleton_ignores_elements() {
        let ethanol = chain(&["C", "C", "O"]);
        let ether = chain(&["C", "O", "C"]);
        let propane = chain(&["C", "C", "C"]);
        assert!(is_same_structure(&ethanol, &propane, &level(ComparisonLevel::Skeletal)).unwrap());
        assert!(is_same_structure(&ether, &ethanol, &level(ComparisonLevel::Skeletal)).unwrap());
        assert!(!is_same_structure(&ether, &ethanol, &level(ComparisonLevel::Constitution)).unwrap());
    }

    #[test]
    fn antisymmetric() {
        let ethanol = chain(&["C", "C", "O"]);
        let ether = chain(&["C", "O", "C"]);
        let options = level(ComparisonLevel::Constitution);
        let ab = compare_structures(&ethanol, &ether, &options).unwrap();
        let ba = compare_structures(&ether, &ethanol, &options).unwrap();
        assert_ne!(ab, Ordering::Equal);
        assert_eq!(ab, ba.reverse());
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = chain(&["C", "C", "O", "N"]);
        let backward = chain(&["N", "O", "C", "C"]);
        assert!(is_same_structure(&forward, &backward, &ComparisonOptions::default()).unwrap());
    }

    #[test]
    fn explicit_hydrogens_fold_away() {
        let plain = chain(&["C", "O"]);
        let mut explicit = chain(&["C", "O"]);
        let h = explicit.add_node(Node::atom(Element::H));
        explicit
            .add_connector(NodeIndex::new(1), h, Connector::single())
            .unwrap();
        assert!(is_same_structure(&plain, &explicit, &ComparisonOptions::default()).unwrap());
    }

    #[test]
    fn charge_and_radical_levels() {
        let neutral = chain(&["C", "O"]);
        let mut anion = chain(&["C", "O"]);
        anion.node_mut(NodeIndex::new(1)).charge = -1;
        assert!(!is_same_structure(&neutral, &anion, &level(ComparisonLevel::Constitution)).unwrap());
        assert!(is_same_structure(&neutral, &anion, &level(ComparisonLevel::Skeletal)).unwrap());

        let mut radical = chain(&["C", "O"]);
        let o = radical.node_mut(NodeIndex::new(1));
        o.radical = Radical::Doublet;
        o.explicit_hydrogen_count = Some(1);
        assert!(is_same_structure(&neutral, &radical, &level(ComparisonLevel::Configuration)).unwrap());
        assert!(!is_same_structure(&neutral, &radical, &level(ComparisonLevel::Exact)).unwrap());
    }

    #[test]
    fn stereo_counts_from_configuration() {
        let cis = butene(true);
        let trans = butene(false);
        assert!(is_same_structure(&cis, &trans, &level(ComparisonLevel::Constitution)).unwrap());
        assert!(!is_same_structure(&cis, &trans, &level(ComparisonLevel::Configuration)).unwrap());
        assert!(is_same_structure(&cis, &butene(true), &level(ComparisonLevel::Configuration)).unwrap());
    }

    #[test]
    fn aromatic_and_kekule_rings_agree() {
        let kekule = {
            let mut b = StructureBuilder::new();
            let atoms: Vec<usize> = (0..6).map(|_| b.add_atom("C").unwrap()).collect();
            for i in 0..6 {
                let order = if i % 2 == 0 { BondOrder::Double } else { BondOrder::Single };
                b.bond(atoms[i], atoms[(i + 1) % 6], order);
            }
            b.build().unwrap()
        };
        let aromatic = {
            let mut b = StructureBuilder::new();
            let atoms: Vec<usize> = (0..6).map(|_| b.add_atom("C").unwrap()).collect();
            for i in 0..6 {
                b.bond(atoms[i], atoms[(i + 1) % 6], BondOrder::Aromatic);
            }
            b.build().unwrap()
        };
        assert!(is_same_structure(&kekule, &aromatic, &ComparisonOptions::default()).unwrap());
    }
}
