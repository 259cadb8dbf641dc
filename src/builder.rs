use petgraph::graph::NodeIndex;

use crate::connector::{BondOrder, BondStereo, Connector};
use crate::element::Element;
use crate::error::{Result, StructureError};
use crate::node::Node;
use crate::structure::Structure;

/// Incremental construction of a [`Structure`] from element symbols.
///
/// Connector ends are only checked by [`build`](Self::build), so atoms and
/// bonds may be declared in any order.
#[derive(Debug, Default, Clone)]
pub struct StructureBuilder {
    nodes: Vec<Node>,
    connectors: Vec<(usize, usize, Connector)>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, symbol: &str) -> Result<usize> {
        let element = Element::from_symbol(symbol)
            .ok_or_else(|| StructureError::UnknownElement(symbol.to_string()))?;
        Ok(self.add_node(Node::atom(element)))
    }

    /// Adds an atom placed at a 2D coordinate.
    pub fn add_atom_at(&mut self, symbol: &str, x: f64, y: f64) -> Result<usize> {
        let idx = self.add_atom(symbol)?;
        self.nodes[idx].coord_2d = Some([x, y]);
        Ok(idx)
    }

    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.nodes.get_mut(idx)
    }

    pub fn bond(&mut self, a: usize, b: usize, order: BondOrder) -> usize {
        self.add_connector(a, b, Connector::new(order))
    }

    /// Single bond drawn as a wedge from `a` (narrow end) to `b`.
    pub fn wedge(&mut self, a: usize, b: usize, stereo: BondStereo) -> usize {
        self.add_connector(a, b, Connector::single().with_stereo(stereo))
    }

    pub fn add_connector(&mut self, a: usize, b: usize, connector: Connector) -> usize {
        self.connectors.push((a, b, connector));
        self.connectors.len() - 1
    }

    /// Closes a chain `path[0] - path[1] - ... - path[0]` with single bonds.
    pub fn ring(&mut self, path: &[usize]) {
        for (i, &a) in path.iter().enumerate() {
            let b = path[(i + 1) % path.len()];
            self.bond(a, b, BondOrder::Single);
        }
    }

    pub fn build(self) -> Result<Structure> {
        Structure::from_parts(self.nodes, self.connectors)
    }

    pub fn node_index(idx: usize) -> NodeIndex {
        NodeIndex::new(idx)
    }
}
