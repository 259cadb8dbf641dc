use petgraph::graph::NodeIndex;

use crate::node::NodeKind;
use crate::structure::Structure;

/// Sum of connector valences of a node in half units (aromatic counts 3).
pub fn bond_valence_halves(structure: &Structure, node: NodeIndex) -> u16 {
    structure
        .connectors_of(node)
        .map(|e| structure.connector(e).order.valence_halves())
        .sum()
}

/// Hydrogens needed to bring an atom up to its smallest default valence
/// that can hold its bonds, after charge and radical adjustments.
///
/// Pseudo atoms, variable atoms, sub-groups and atoms without default
/// valences never carry implicit hydrogens.
pub fn implicit_hydrogen_count(structure: &Structure, node: NodeIndex) -> u8 {
    let n = structure.node(node);
    let element = match &n.kind {
        NodeKind::Atom { element, .. } => *element,
        _ => return 0,
    };
    let valences = element.charged_valences(n.charge);
    // round aromatic half valences up
    let used = (bond_valence_halves(structure, node) + 1) / 2 + n.radical.valence_loss() as u16;
    valences
        .iter()
        .map(|&v| v as u16)
        .find(|&v| v >= used)
        .map(|v| (v - used) as u8)
        .unwrap_or(0)
}
