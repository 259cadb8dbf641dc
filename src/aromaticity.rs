use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::connector::BondOrder;
use crate::element::Element;
use crate::node::{NodeKind, Radical};
use crate::rings::{find_sssr, Ring};
use crate::structure::Structure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AromaticType {
    NonAromatic,
    Aromatic,
    AntiAromatic,
    /// Some ring node has several possible pi electron counts and they do
    /// not agree on aromaticity.
    Uncertain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AromaticityOptions {
    /// Also report rings whose type is `Uncertain`.
    pub allow_uncertain_rings: bool,
}

// negative markers: any of them makes the ring non-aromatic
const SATURATED_CARBON: i8 = -1;
const ESTER_CARBON: i8 = -16;
const SULFONE_OR_SULFOXIDE_SULFUR: i8 = -32;

/// Perceives aromatic rings among the SSSR and flags their connectors.
pub fn perceive_aromatic_rings(structure: &mut Structure, options: &AromaticityOptions) -> Vec<Ring> {
    let candidates = find_sssr(structure);
    perceive_aromatic_rings_in(structure, &candidates, options)
}

/// Perceives aromatic rings among `candidates`. Every connector's
/// `is_aromatic` flag is rewritten: set on members of the returned rings,
/// cleared elsewhere.
pub fn perceive_aromatic_rings_in(
    structure: &mut Structure,
    candidates: &[Ring],
    options: &AromaticityOptions,
) -> Vec<Ring> {
    let ring_connectors = connector_union(candidates.iter());
    let aromatic: Vec<Ring> = candidates
        .iter()
        .filter(|ring| {
            match classify(structure, ring, &ring_connectors) {
                AromaticType::Aromatic => true,
                AromaticType::Uncertain => options.allow_uncertain_rings,
                _ => false,
            }
        })
        .cloned()
        .collect();

    let flagged = connector_union(aromatic.iter());
    let all: Vec<EdgeIndex> = structure.connectors().collect();
    for e in all {
        structure.connector_mut(e).is_aromatic = flagged.contains(&e);
    }
    log::debug!(
        "{} of {} candidate rings are aromatic",
        aromatic.len(),
        candidates.len()
    );
    aromatic
}

/// Aromatic type of a single ring. `reference_rings` decide which multiple
/// bonds count as ring bonds for fused systems; the SSSR is used when none
/// are given.
pub fn ring_aromatic_type(
    structure: &Structure,
    ring: &Ring,
    reference_rings: Option<&[Ring]>,
) -> AromaticType {
    let sssr;
    let reference = match reference_rings {
        Some(rings) => rings,
        None => {
            sssr = find_sssr(structure);
            &sssr
        }
    };
    let ring_connectors = connector_union(reference.iter().chain(std::iter::once(ring)));
    classify(structure, ring, &ring_connectors)
}

fn connector_union<'a>(rings: impl Iterator<Item = &'a Ring>) -> HashSet<EdgeIndex> {
    rings.flat_map(|r| r.connectors.iter().copied()).collect()
}

fn classify(structure: &Structure, ring: &Ring, ring_connectors: &HashSet<EdgeIndex>) -> AromaticType {
    if ring.size() < 3 {
        return AromaticType::NonAromatic;
    }
    if ring
        .connectors
        .iter()
        .all(|&e| structure.connector(e).order == BondOrder::Aromatic)
    {
        return AromaticType::Aromatic;
    }
    let counts: Vec<Vec<i8>> = ring
        .nodes
        .iter()
        .map(|&n| pi_electron_counts(structure, n, ring_connectors))
        .collect();
    huckel_type(&counts)
}

/// Tries every combination of the per-node counts. The first combination
/// decides the type unless a later one disagrees about aromaticity.
fn huckel_type(counts: &[Vec<i8>]) -> AromaticType {
    if counts.iter().any(Vec::is_empty) {
        return AromaticType::NonAromatic;
    }
    let mut indexes = vec![0usize; counts.len()];
    let mut first: Option<AromaticType> = None;
    loop {
        let picked = indexes.iter().zip(counts).map(|(&i, c)| c[i]);
        let current = if picked.clone().any(|e| e < 0) {
            AromaticType::NonAromatic
        } else {
            let sum: u32 = picked.map(|e| e as u32).sum();
            let (times, rem) = (sum / 4, sum % 4);
            match rem {
                _ if times > 5 || times == 2 => AromaticType::NonAromatic,
                2 => AromaticType::Aromatic,
                0 => AromaticType::AntiAromatic,
                _ => AromaticType::NonAromatic,
            }
        };
        match first {
            None => first = Some(current),
            Some(f) if f != current && (f == AromaticType::Aromatic || current == AromaticType::Aromatic) => {
                return AromaticType::Uncertain;
            }
            Some(_) => {}
        }
        // odometer over the choice indexes
        let mut pos = 0;
        loop {
            if pos == indexes.len() {
                return first.unwrap_or(AromaticType::NonAromatic);
            }
            indexes[pos] += 1;
            if indexes[pos] < counts[pos].len() {
                break;
            }
            indexes[pos] = 0;
            pos += 1;
        }
    }
}

/// Possible pi electron contributions of a ring node.
fn pi_electron_counts(structure: &Structure, node: NodeIndex, ring_connectors: &HashSet<EdgeIndex>) -> Vec<i8> {
    match &structure.node(node).kind {
        NodeKind::Atom { element, .. } => element_pi_electrons(structure, node, *element, ring_connectors),
        NodeKind::Variable { allowed, .. } if !allowed.is_empty() => {
            let mut counts = Vec::new();
            for id in allowed {
                for c in element_pi_electrons(structure, node, id.element, ring_connectors) {
                    if !counts.contains(&c) {
                        counts.push(c);
                    }
                }
            }
            counts
        }
        _ => vec![0, 1, 2],
    }
}

fn element_pi_electrons(
    structure: &Structure,
    node: NodeIndex,
    element: Element,
    ring_connectors: &HashSet<EdgeIndex>,
) -> Vec<i8> {
    let n = structure.node(node);
    let multiple: Vec<(EdgeIndex, NodeIndex)> = structure
        .links(node)
        .filter(|&(e, _)| {
            let c = structure.connector(e);
            c.is_covalent() && c.order.is_multiple()
        })
        .collect();

    if multiple.is_empty() {
        return vec![if n.radical == Radical::Doublet {
            1
        } else if element.is_hetero() {
            2
        } else if element == Element::C {
            match n.charge {
                c if c > 0 => 0,
                c if c < 0 => 2,
                _ => SATURATED_CARBON,
            }
        } else {
            0
        }];
    }

    if element == Element::S
        && multiple
            .iter()
            .any(|&(_, other)| structure.node(other).is_element(Element::O))
    {
        return vec![SULFONE_OR_SULFOXIDE_SULFUR];
    }
    if element == Element::C && is_ester_carbon(structure, node) {
        return vec![ESTER_CARBON];
    }

    let on_ring: Vec<BondOrder> = multiple
        .iter()
        .filter(|(e, _)| ring_connectors.contains(e))
        .map(|&(e, _)| structure.connector(e).order)
        .collect();
    match on_ring.as_slice() {
        [BondOrder::Aromatic, BondOrder::Aromatic] if element.is_hetero() => vec![1, 2],
        [BondOrder::Aromatic, BondOrder::Aromatic] => vec![1],
        [BondOrder::Double] => vec![1],
        [_, ..] => vec![0],
        // exocyclic multiple bond
        [] if element == Element::C => {
            let to_hetero = multiple.iter().any(|&(_, other)| {
                structure
                    .node(other)
                    .element()
                    .is_some_and(Element::is_hetero)
            });
            vec![if to_hetero { 0 } else { 1 }]
        }
        [] => vec![1],
    }
}

/// Carbon with both a single and a double covalent bond to oxygen.
fn is_ester_carbon(structure: &Structure, node: NodeIndex) -> bool {
    let mut single_o = false;
    let mut double_o = false;
    for (e, other) in structure.links(node) {
        let c = structure.connector(e);
        if !c.is_covalent() || !structure.node(other).is_element(Element::O) {
            continue;
        }
        match c.order {
            BondOrder::Single => single_o = true,
            BondOrder::Double => double_o = true,
            _ => {}
        }
    }
    single_o && double_o
}
