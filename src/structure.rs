use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::connector::{BondOrder, Connector};
use crate::element::Element;
use crate::error::{Result, StructureError};
use crate::node::{Node, NodeKind};
use crate::valence::implicit_hydrogen_count;

/// Location of a node inside a possibly nested structure: the chain of
/// sub-group nodes to descend through, then the node itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    pub groups: Vec<NodeIndex>,
    pub node: NodeIndex,
}

impl NodePath {
    pub fn top(node: NodeIndex) -> Self {
        Self {
            groups: Vec::new(),
            node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorPath {
    pub groups: Vec<NodeIndex>,
    pub connector: EdgeIndex,
}

impl ConnectorPath {
    pub fn top(connector: EdgeIndex) -> Self {
        Self {
            groups: Vec::new(),
            connector,
        }
    }
}

/// Origin of every node and connector of a derived structure, indexed by
/// the derived structure's indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenMap {
    pub nodes: Vec<NodePath>,
    pub connectors: Vec<ConnectorPath>,
}

impl FlattenMap {
    pub fn identity(structure: &Structure) -> Self {
        Self {
            nodes: structure.nodes().map(NodePath::top).collect(),
            connectors: structure.connectors().map(ConnectorPath::top).collect(),
        }
    }

    /// Restricts the map to the objects kept by a later filtering step.
    pub(crate) fn retain(&self, kept_nodes: &[NodeIndex], kept_connectors: &[EdgeIndex]) -> Self {
        Self {
            nodes: kept_nodes
                .iter()
                .filter_map(|n| self.nodes.get(n.index()).cloned())
                .collect(),
            connectors: kept_connectors
                .iter()
                .filter_map(|e| self.connectors.get(e.index()).cloned())
                .collect(),
        }
    }
}

/// A chemical structure fragment: nodes joined by connectors.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    graph: UnGraph<Node, Connector>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a structure from a node list and `(begin, end, connector)`
    /// triples, rejecting references to missing nodes.
    pub fn from_parts(nodes: Vec<Node>, connectors: Vec<(usize, usize, Connector)>) -> Result<Self> {
        let mut structure = Self::new();
        for node in nodes {
            structure.add_node(node);
        }
        for (a, b, connector) in connectors {
            structure.add_connector(NodeIndex::new(a), NodeIndex::new(b), connector)?;
        }
        Ok(structure)
    }

    pub fn graph(&self) -> &UnGraph<Node, Connector> {
        &self.graph
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_connector(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        connector: Connector,
    ) -> Result<EdgeIndex> {
        let id = self.graph.edge_count();
        for end in [a, b] {
            if end.index() >= self.graph.node_count() {
                return Err(StructureError::DanglingConnector {
                    connector: id,
                    node: end.index(),
                });
            }
        }
        if a == b {
            return Err(StructureError::DegenerateConnector {
                connector: id,
                node: a.index(),
            });
        }
        Ok(self.graph.add_edge(a, b, connector))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connector_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.graph[idx]
    }

    pub fn connector(&self, idx: EdgeIndex) -> &Connector {
        &self.graph[idx]
    }

    pub fn connector_mut(&mut self, idx: EdgeIndex) -> &mut Connector {
        &mut self.graph[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn connectors(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// Connected nodes of a connector in their significant order.
    pub fn connector_ends(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn connectors_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    /// Incident connectors paired with the node at their far end.
    pub fn links(&self, idx: NodeIndex) -> impl Iterator<Item = (EdgeIndex, NodeIndex)> + '_ {
        self.graph.edges(idx).map(move |e| {
            let other = if e.source() == idx {
                e.target()
            } else {
                e.source()
            };
            (e.id(), other)
        })
    }

    pub fn connector_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    /// Hydrogens carried by a node: the explicit count when given, the
    /// valence-derived count otherwise, plus hydrogen atoms bonded to it
    /// when `include_bonded` is set.
    pub fn hydrogen_count(&self, idx: NodeIndex, include_bonded: bool) -> u8 {
        let own = self.graph[idx]
            .explicit_hydrogen_count
            .unwrap_or_else(|| implicit_hydrogen_count(self, idx));
        if !include_bonded {
            return own;
        }
        let bonded = self
            .neighbors(idx)
            .filter(|&n| self.graph[n].is_element(Element::H))
            .count();
        own.saturating_add(bonded as u8)
    }

    /// A plain hydrogen atom hanging off a heavy atom by a single covalent
    /// bond. Isotopes, ions and H2 are kept as ordinary atoms.
    pub fn is_explicit_hydrogen(&self, idx: NodeIndex) -> bool {
        let node = &self.graph[idx];
        if !matches!(
            node.kind,
            NodeKind::Atom {
                element: Element::H,
                mass_number: None
            }
        ) || node.charge != 0
        {
            return false;
        }
        let mut links = self.links(idx);
        match (links.next(), links.next()) {
            (Some((edge, other)), None) => {
                let connector = &self.graph[edge];
                connector.is_covalent()
                    && connector.order == BondOrder::Single
                    && !self.graph[other].is_element(Element::H)
            }
            _ => false,
        }
    }

    pub fn has_sub_groups(&self) -> bool {
        self.graph
            .node_weights()
            .any(|n| matches!(n.kind, NodeKind::SubGroup(_)))
    }

    /// Clears ranks, parities and aromatic flags, sub-groups included.
    pub fn clear_derived(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.clear_derived();
            if let NodeKind::SubGroup(group) = &mut node.kind {
                group.fragment.clear_derived();
            }
        }
        for connector in self.graph.edge_weights_mut() {
            connector.clear_derived();
        }
    }

    /// Nodes sorted by canonical rank; unranked nodes follow in index order.
    pub fn canonical_node_order(&self) -> Vec<NodeIndex> {
        let mut order: Vec<NodeIndex> = self.nodes().collect();
        order.sort_by_key(|&n| (self.graph[n].canonical_rank.is_none(), self.graph[n].canonical_rank));
        order
    }

    pub fn canonical_connector_order(&self) -> Vec<EdgeIndex> {
        let mut order: Vec<EdgeIndex> = self.connectors().collect();
        order.sort_by_key(|&e| (self.graph[e].canonical_rank.is_none(), self.graph[e].canonical_rank));
        order
    }

    /// Copy with node `i` taken from `node_order[i]` and connector `j` from
    /// `connector_order[j]`. Returns `None` unless both are permutations.
    pub fn permuted(&self, node_order: &[usize], connector_order: &[usize]) -> Option<Structure> {
        if !is_permutation(node_order, self.node_count())
            || !is_permutation(connector_order, self.connector_count())
        {
            return None;
        }
        let mut new_index = vec![NodeIndex::end(); self.node_count()];
        let mut out = Structure::new();
        for &old in node_order {
            new_index[old] = out.add_node(self.graph[NodeIndex::new(old)].clone());
        }
        for &old in connector_order {
            let edge = EdgeIndex::new(old);
            let (a, b) = self.graph.edge_endpoints(edge)?;
            out.add_connector(new_index[a.index()], new_index[b.index()], self.graph[edge].clone())
                .ok()?;
        }
        Some(out)
    }

    /// Replaces every sub-group node by its fragment. With `cascade` nested
    /// sub-groups are expanded too, otherwise only the outermost level.
    /// Returns where each resulting node and connector came from.
    pub fn unmarshal_all_sub_fragments(&mut self, cascade: bool) -> Result<FlattenMap> {
        let (flat, map) = self.flattened(cascade)?;
        *self = flat;
        Ok(map)
    }

    /// Flattened copy of this structure; `self` is left untouched.
    pub fn flattened(&self, cascade: bool) -> Result<(Structure, FlattenMap)> {
        let mut out = Structure::new();
        let mut map = FlattenMap::default();
        let mut prefix = Vec::new();
        expand_into(self, &mut prefix, Offset::default(), cascade, &mut out, &mut map)?;
        log::debug!(
            "flattened structure: {} nodes, {} connectors",
            out.node_count(),
            out.connector_count()
        );
        Ok((out, map))
    }

    pub fn node_at_path(&self, path: &NodePath) -> Option<&Node> {
        self.fragment_at(&path.groups)?.graph.node_weight(path.node)
    }

    pub fn node_at_path_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        self.fragment_at_mut(&path.groups)?
            .graph
            .node_weight_mut(path.node)
    }

    pub fn connector_at_path_mut(&mut self, path: &ConnectorPath) -> Option<&mut Connector> {
        self.fragment_at_mut(&path.groups)?
            .graph
            .edge_weight_mut(path.connector)
    }

    fn fragment_at(&self, groups: &[NodeIndex]) -> Option<&Structure> {
        let mut current = self;
        for &g in groups {
            current = &current.graph.node_weight(g)?.as_sub_group()?.fragment;
        }
        Some(current)
    }

    fn fragment_at_mut(&mut self, groups: &[NodeIndex]) -> Option<&mut Structure> {
        let mut current = self;
        for &g in groups {
            current = match current.graph.node_weight_mut(g).map(|n| &mut n.kind) {
                Some(NodeKind::SubGroup(group)) => &mut group.fragment,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Drops explicit hydrogen atoms, folding each into the hydrogen count
    /// of the atom it was attached to. Returns the indices, in the old
    /// numbering, of the nodes and connectors that were kept.
    pub fn remove_explicit_hydrogens(&mut self) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
        let removed: Vec<bool> = self.nodes().map(|n| self.is_explicit_hydrogen(n)).collect();
        if !removed.contains(&true) {
            return (self.nodes().collect(), self.connectors().collect());
        }

        let totals: Vec<u8> = self.nodes().map(|n| self.hydrogen_count(n, true)).collect();
        let mut new_index = vec![None; self.node_count()];
        let mut out = Structure::new();
        let mut kept_nodes = Vec::new();
        for n in self.nodes() {
            if removed[n.index()] {
                continue;
            }
            let mut node = self.graph[n].clone();
            if self.neighbors(n).any(|nb| removed[nb.index()]) {
                node.explicit_hydrogen_count = Some(totals[n.index()]);
            }
            new_index[n.index()] = Some(out.graph.add_node(node));
            kept_nodes.push(n);
        }
        let mut kept_connectors = Vec::new();
        for e in self.graph.edge_references() {
            if let (Some(a), Some(b)) = (new_index[e.source().index()], new_index[e.target().index()]) {
                out.graph.add_edge(a, b, e.weight().clone());
                kept_connectors.push(e.id());
            }
        }
        log::debug!(
            "removed {} explicit hydrogens",
            self.node_count() - out.node_count()
        );
        *self = out;
        (kept_nodes, kept_connectors)
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

#[derive(Debug, Clone, Copy, Default)]
struct Offset {
    d2: [f64; 2],
    d3: [f64; 3],
}

impl Offset {
    fn shifted_by(self, node: &Node) -> Self {
        let mut next = self;
        if let Some(c) = node.coord_2d {
            next.d2 = [self.d2[0] + c[0], self.d2[1] + c[1]];
        }
        if let Some(c) = node.coord_3d {
            next.d3 = [self.d3[0] + c[0], self.d3[1] + c[1], self.d3[2] + c[2]];
        }
        next
    }

    fn apply(self, node: &mut Node) {
        if let Some(c) = node.coord_2d.as_mut() {
            c[0] += self.d2[0];
            c[1] += self.d2[1];
        }
        if let Some(c) = node.coord_3d.as_mut() {
            c[0] += self.d3[0];
            c[1] += self.d3[1];
            c[2] += self.d3[2];
        }
    }
}

enum Slot {
    Leaf(NodeIndex),
    Group {
        node: NodeIndex,
        anchors: Vec<NodeIndex>,
        used: usize,
    },
}

impl Slot {
    fn first_node(&self) -> Option<NodeIndex> {
        match self {
            Slot::Leaf(n) => Some(*n),
            Slot::Group { anchors, .. } => anchors.first().copied(),
        }
    }

    fn attach(&mut self) -> Result<NodeIndex> {
        match self {
            Slot::Leaf(n) => Ok(*n),
            Slot::Group {
                node,
                anchors,
                used,
            } => {
                let i = (*used).min(anchors.len().saturating_sub(1));
                let anchor = anchors
                    .get(i)
                    .copied()
                    .ok_or(StructureError::InvalidAnchor { node: node.index() })?;
                *used += 1;
                Ok(anchor)
            }
        }
    }
}

fn expand_into(
    src: &Structure,
    prefix: &mut Vec<NodeIndex>,
    offset: Offset,
    cascade: bool,
    out: &mut Structure,
    map: &mut FlattenMap,
) -> Result<Vec<Slot>> {
    let mut slots = Vec::with_capacity(src.node_count());
    for n in src.nodes() {
        let node = &src.graph[n];
        let group = match &node.kind {
            NodeKind::SubGroup(group) if cascade || prefix.is_empty() => group,
            _ => {
                let mut copy = node.clone();
                offset.apply(&mut copy);
                slots.push(Slot::Leaf(out.graph.add_node(copy)));
                map.nodes.push(NodePath {
                    groups: prefix.clone(),
                    node: n,
                });
                continue;
            }
        };

        prefix.push(n);
        let inner = expand_into(
            &group.fragment,
            prefix,
            offset.shifted_by(node),
            cascade,
            out,
            map,
        )?;
        prefix.pop();

        let anchors = group
            .anchors
            .iter()
            .map(|a| {
                inner
                    .get(a.index())
                    .and_then(Slot::first_node)
                    .ok_or(StructureError::InvalidAnchor { node: n.index() })
            })
            .collect::<Result<Vec<_>>>()?;
        slots.push(Slot::Group {
            node: n,
            anchors,
            used: 0,
        });
    }

    for e in src.graph.edge_references() {
        let a = slots[e.source().index()].attach()?;
        let b = slots[e.target().index()].attach()?;
        out.add_connector(a, b, e.weight().clone())?;
        map.connectors.push(ConnectorPath {
            groups: prefix.clone(),
            connector: e.id(),
        });
    }
    Ok(slots)
}
