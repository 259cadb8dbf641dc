use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::canonical::{connector_code, connector_order, kekule_ranks};
use crate::error::{Result, StructureError};
use crate::structure::Structure;

/// A closed walk of the structure graph.
///
/// `connectors[i]` joins `nodes[i]` and `nodes[(i + 1) % len]`. Rings are
/// normalized to start at their smallest node index and to run towards the
/// smaller of its two ring neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ring {
    pub nodes: Vec<NodeIndex>,
    pub connectors: Vec<EdgeIndex>,
}

impl Ring {
    fn normalized(nodes: Vec<NodeIndex>, connectors: Vec<EdgeIndex>) -> Self {
        let len = nodes.len();
        let start = nodes
            .iter()
            .enumerate()
            .min_by_key(|&(_, n)| *n)
            .map_or(0, |(i, _)| i);
        let mut nodes: Vec<NodeIndex> = (0..len).map(|i| nodes[(start + i) % len]).collect();
        let mut connectors: Vec<EdgeIndex> =
            (0..len).map(|i| connectors[(start + i) % len]).collect();
        if len > 2 && nodes[1] > nodes[len - 1] {
            nodes[1..].reverse();
            connectors.reverse();
        }
        Self { nodes, connectors }
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    pub fn contains_connector(&self, connector: EdgeIndex) -> bool {
        self.connectors.contains(&connector)
    }

    /// Sorted connector set; equal for the same ring in any direction or
    /// rotation.
    pub fn edge_key(&self) -> Vec<EdgeIndex> {
        let mut key = self.connectors.clone();
        key.sort_unstable();
        key
    }
}

/// A maximal 2-edge-connected part of the graph that holds at least one ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleBlock {
    pub nodes: Vec<NodeIndex>,
    pub connectors: Vec<EdgeIndex>,
}

/// Caps for all-rings enumeration. `None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSearchLimits {
    /// Rings larger than this are not reported.
    pub max_ring_size: Option<usize>,
    /// Maximum number of live partial paths before giving up.
    pub max_paths: Option<usize>,
}

/// Covalent adjacency; only covalent connectors close rings.
fn covalent_adjacency(structure: &Structure) -> Vec<Vec<(NodeIndex, EdgeIndex)>> {
    let mut adj = vec![Vec::new(); structure.node_count()];
    for e in structure.connectors() {
        if !structure.connector(e).is_covalent() {
            continue;
        }
        if let Some((a, b)) = structure.connector_ends(e) {
            adj[a.index()].push((b, e));
            adj[b.index()].push((a, e));
        }
    }
    adj
}

fn find_bridges(adj: &[Vec<(NodeIndex, EdgeIndex)>], edge_count: usize) -> Vec<bool> {
    let n = adj.len();
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![usize::MAX; n];
    let mut bridge = vec![false; edge_count];
    let mut time = 0;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = time;
        low[root] = time;
        time += 1;
        let mut stack: Vec<(usize, Option<EdgeIndex>, usize)> = vec![(root, None, 0)];
        while let Some(top) = stack.last_mut() {
            let (v, parent_edge) = (top.0, top.1);
            let next = adj[v].get(top.2).copied();
            top.2 += 1;
            if let Some((w, e)) = next {
                if Some(e) == parent_edge {
                    continue;
                }
                let w = w.index();
                if disc[w] == usize::MAX {
                    disc[w] = time;
                    low[w] = time;
                    time += 1;
                    stack.push((w, Some(e), 0));
                } else {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                stack.pop();
                if let (Some(&(u, _, _)), Some(e)) = (stack.last(), parent_edge) {
                    low[u] = low[u].min(low[v]);
                    if low[v] > disc[u] {
                        bridge[e.index()] = true;
                    }
                }
            }
        }
    }
    bridge
}

/// Splits the ring-bearing part of the graph into cycle blocks. Bridges and
/// tree-like parts belong to no block.
pub fn find_cycle_blocks(structure: &Structure) -> Vec<CycleBlock> {
    let adj = covalent_adjacency(structure);
    let bridges = find_bridges(&adj, structure.connector_count());

    let mut uf = UnionFind::<usize>::new(structure.node_count());
    let mut ring_edges = Vec::new();
    for e in structure.connectors() {
        if !structure.connector(e).is_covalent() || bridges[e.index()] {
            continue;
        }
        if let Some((a, b)) = structure.connector_ends(e) {
            uf.union(a.index(), b.index());
            ring_edges.push((e, a));
        }
    }

    let mut blocks: Vec<(usize, CycleBlock)> = Vec::new();
    for (e, a) in ring_edges {
        let root = uf.find(a.index());
        let pos = match blocks.iter().position(|(r, _)| *r == root) {
            Some(pos) => pos,
            None => {
                blocks.push((
                    root,
                    CycleBlock {
                        nodes: Vec::new(),
                        connectors: Vec::new(),
                    },
                ));
                blocks.len() - 1
            }
        };
        let block = &mut blocks[pos].1;
        block.connectors.push(e);
        if let Some((a, b)) = structure.connector_ends(e) {
            block.nodes.push(a);
            block.nodes.push(b);
        }
    }

    let mut blocks: Vec<CycleBlock> = blocks
        .into_iter()
        .map(|(_, mut block)| {
            block.nodes.sort_unstable();
            block.nodes.dedup();
            block.connectors.sort_unstable();
            block
        })
        .collect();
    blocks.sort_by_key(|b| b.nodes.first().copied());
    log::debug!("found {} cycle blocks", blocks.len());
    blocks
}

/// Every elementary ring of the structure, without limits.
pub fn find_all_rings(structure: &Structure) -> Result<Vec<Ring>> {
    find_all_rings_with(structure, &RingSearchLimits::default(), &CancelToken::new())
}

/// Every elementary ring of the structure, sorted by size and then node
/// list. Exceeding `limits.max_paths` or cancelling aborts with an error
/// instead of returning a partial set.
pub fn find_all_rings_with(
    structure: &Structure,
    limits: &RingSearchLimits,
    cancel: &CancelToken,
) -> Result<Vec<Ring>> {
    let mut rings = Vec::new();
    let mut seen = HashSet::new();
    for block in find_cycle_blocks(structure) {
        for ring in block_rings(structure, &block, limits, cancel)? {
            if seen.insert(ring.edge_key()) {
                rings.push(ring);
            }
        }
    }
    rings.sort_by(|a, b| a.size().cmp(&b.size()).then_with(|| a.nodes.cmp(&b.nodes)));
    log::debug!("found {} rings", rings.len());
    Ok(rings)
}

#[derive(Debug, Clone)]
struct PathEdge {
    nodes: Vec<NodeIndex>,
    connectors: Vec<EdgeIndex>,
}

impl PathEdge {
    fn first(&self) -> NodeIndex {
        self.nodes[0]
    }

    fn last(&self) -> NodeIndex {
        self.nodes[self.nodes.len() - 1]
    }

    fn other_end(&self, x: NodeIndex) -> NodeIndex {
        if self.first() == x {
            self.last()
        } else {
            self.first()
        }
    }

    /// Node sequence starting at `x`.
    fn from(&self, x: NodeIndex) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
        if self.first() == x {
            (self.nodes.clone(), self.connectors.clone())
        } else {
            let mut nodes = self.nodes.clone();
            let mut connectors = self.connectors.clone();
            nodes.reverse();
            connectors.reverse();
            (nodes, connectors)
        }
    }
}

/// Path-graph reduction: vertices are removed in ascending degree order and
/// the paths through each removed vertex are spliced pairwise. A splice
/// whose two ends coincide is a ring.
fn block_rings(
    structure: &Structure,
    block: &CycleBlock,
    limits: &RingSearchLimits,
    cancel: &CancelToken,
) -> Result<Vec<Ring>> {
    let mut paths: Vec<PathEdge> = block
        .connectors
        .iter()
        .filter_map(|&e| {
            let (a, b) = structure.connector_ends(e)?;
            Some(PathEdge {
                nodes: vec![a, b],
                connectors: vec![e],
            })
        })
        .collect();
    let mut remaining = block.nodes.clone();
    let mut rings = Vec::new();
    let mut marks = vec![false; structure.node_count()];

    while !remaining.is_empty() {
        cancel.check()?;
        let Some((_, pos, x)) = remaining
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let degree = paths
                    .iter()
                    .filter(|p| p.first() == x || p.last() == x)
                    .count();
                (degree, i, x)
            })
            .min()
        else {
            break;
        };
        remaining.swap_remove(pos);

        let (through, rest): (Vec<PathEdge>, Vec<PathEdge>) = paths
            .into_iter()
            .partition(|p| p.first() == x || p.last() == x);
        paths = rest;

        for i in 0..through.len() {
            for j in (i + 1)..through.len() {
                let (a_nodes, a_conns) = through[i].from(x);
                let (b_nodes, b_conns) = through[j].from(x);
                let a_end = through[i].other_end(x);
                let b_end = through[j].other_end(x);
                let closes = a_end == b_end;

                for &n in &a_nodes[1..] {
                    marks[n.index()] = true;
                }
                let clash = b_nodes[1..]
                    .iter()
                    .any(|&n| marks[n.index()] && !(closes && n == b_end));
                for &n in &a_nodes[1..] {
                    marks[n.index()] = false;
                }
                if clash {
                    continue;
                }

                let size = a_conns.len() + b_conns.len();
                if limits.max_ring_size.map_or(false, |max| size > max) {
                    continue;
                }

                // splice: reversed a (ends at x) then b without x
                let mut nodes: Vec<NodeIndex> = a_nodes.iter().rev().copied().collect();
                let mut connectors: Vec<EdgeIndex> = a_conns.iter().rev().copied().collect();
                nodes.extend_from_slice(&b_nodes[1..]);
                connectors.extend_from_slice(&b_conns);

                if closes {
                    if size >= 3 {
                        nodes.pop();
                        rings.push(Ring::normalized(nodes, connectors));
                    }
                } else {
                    paths.push(PathEdge { nodes, connectors });
                    if let Some(max) = limits.max_paths {
                        if paths.len() > max {
                            return Err(StructureError::RingLimitExceeded { limit: max });
                        }
                    }
                }
            }
        }
    }
    Ok(rings)
}

/// Smallest set of smallest rings over the covalent graph.
///
/// Candidates are Horton cycles ordered by size and then by normalized node
/// list; a candidate is kept when it is linearly independent (over GF(2)) of
/// the rings already kept. The result has exactly
/// `connectors - nodes + components` rings.
///
/// Rings are picked on a copy renumbered by canonical rank and mapped back,
/// so equal-size alternatives resolve the same way for any input numbering.
pub fn find_sssr(structure: &Structure) -> Vec<Ring> {
    let expected = expected_ring_count(structure);
    if expected == 0 {
        return Vec::new();
    }
    let ranks = kekule_ranks(structure);
    let mut node_order: Vec<usize> = (0..structure.node_count()).collect();
    node_order.sort_by_key(|&i| ranks[i]);
    let connector_order: Vec<usize> = connector_order(structure, &ranks, |s, e| connector_code(s, e, false))
        .into_iter()
        .map(EdgeIndex::index)
        .collect();
    let Some(renumbered) = structure.permuted(&node_order, &connector_order) else {
        log::warn!("could not renumber structure for ring search, using input order");
        return sssr_in_index_order(structure, expected);
    };
    sssr_in_index_order(&renumbered, expected)
        .into_iter()
        .map(|ring| {
            Ring::normalized(
                ring.nodes.iter().map(|n| NodeIndex::new(node_order[n.index()])).collect(),
                ring.connectors
                    .iter()
                    .map(|e| EdgeIndex::new(connector_order[e.index()]))
                    .collect(),
            )
        })
        .collect()
}

fn sssr_in_index_order(structure: &Structure, expected: usize) -> Vec<Ring> {
    let adj = covalent_adjacency(structure);
    let candidates = horton_candidates(&adj);
    select_independent_rings(&candidates, expected, structure.connector_count())
}

/// Cyclomatic number `E - V + C` of the covalent graph.
pub fn expected_ring_count(structure: &Structure) -> usize {
    let mut uf = UnionFind::<usize>::new(structure.node_count());
    let mut edges = 0;
    for e in structure.connectors() {
        if !structure.connector(e).is_covalent() {
            continue;
        }
        if let Some((a, b)) = structure.connector_ends(e) {
            uf.union(a.index(), b.index());
            edges += 1;
        }
    }
    let mut labels = uf.into_labeling();
    labels.sort_unstable();
    labels.dedup();
    (edges + labels.len()).saturating_sub(structure.node_count())
}

/// BFS tree from every node: distance plus the predecessor link used to
/// reach each node.
fn all_pairs_bfs(
    adj: &[Vec<(NodeIndex, EdgeIndex)>],
) -> (Vec<Vec<u32>>, Vec<Vec<Option<(NodeIndex, EdgeIndex)>>>) {
    let n = adj.len();
    let mut dist = vec![vec![u32::MAX; n]; n];
    let mut pred = vec![vec![None; n]; n];
    for src in 0..n {
        let row = &mut dist[src];
        row[src] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(src);
        while let Some(cur) = queue.pop_front() {
            let d = row[cur];
            for &(nb, e) in &adj[cur] {
                if row[nb.index()] == u32::MAX {
                    row[nb.index()] = d + 1;
                    pred[src][nb.index()] = Some((NodeIndex::new(cur), e));
                    queue.push_back(nb.index());
                }
            }
        }
    }
    (dist, pred)
}

fn reconstruct_path(
    pred: &[Vec<Option<(NodeIndex, EdgeIndex)>>],
    src: usize,
    dst: NodeIndex,
) -> Option<(Vec<NodeIndex>, Vec<EdgeIndex>)> {
    let mut nodes = vec![dst];
    let mut connectors = Vec::new();
    let mut cur = dst;
    while cur.index() != src {
        let (p, e) = pred[src][cur.index()]?;
        nodes.push(p);
        connectors.push(e);
        cur = p;
    }
    nodes.reverse();
    connectors.reverse();
    Some((nodes, connectors))
}

fn horton_candidates(adj: &[Vec<(NodeIndex, EdgeIndex)>]) -> Vec<Ring> {
    let n = adj.len();
    let (dist, pred) = all_pairs_bfs(adj);
    let mut candidates = Vec::new();
    let mut seen = HashSet::new();

    for (u_idx, links) in adj.iter().enumerate() {
        for &(v, edge) in links {
            let u = NodeIndex::new(u_idx);
            if u >= v {
                continue;
            }
            for w in 0..n {
                let du = dist[w][u.index()];
                let dv = dist[w][v.index()];
                if du == u32::MAX || dv == u32::MAX || du as usize + dv as usize + 1 < 3 {
                    continue;
                }
                let (Some((path_u, conn_u)), Some((path_v, conn_v))) =
                    (reconstruct_path(&pred, w, u), reconstruct_path(&pred, w, v))
                else {
                    continue;
                };
                if path_u[1..].iter().any(|x| path_v[1..].contains(x)) {
                    continue;
                }
                let mut nodes = path_u;
                nodes.extend(path_v[1..].iter().rev());
                let mut connectors = conn_u;
                connectors.push(edge);
                connectors.extend(conn_v.iter().rev());
                let ring = Ring::normalized(nodes, connectors);
                if seen.insert(ring.edge_key()) {
                    candidates.push(ring);
                }
            }
        }
    }

    candidates.sort_by(|a, b| a.size().cmp(&b.size()).then_with(|| a.nodes.cmp(&b.nodes)));
    candidates
}

fn ring_to_edge_bitvector(ring: &Ring, num_edges: usize) -> Vec<u64> {
    let mut bv = vec![0u64; num_edges.div_ceil(64)];
    for e in &ring.connectors {
        let idx = e.index();
        bv[idx / 64] |= 1u64 << (idx % 64);
    }
    bv
}

fn select_independent_rings(candidates: &[Ring], num_needed: usize, num_edges: usize) -> Vec<Ring> {
    let mut result = Vec::with_capacity(num_needed);
    let mut basis: Vec<Vec<u64>> = Vec::with_capacity(num_needed);

    for ring in candidates {
        if result.len() >= num_needed {
            break;
        }
        if try_add_to_basis(&mut basis, ring_to_edge_bitvector(ring, num_edges)) {
            result.push(ring.clone());
        }
    }
    result
}

fn try_add_to_basis(basis: &mut Vec<Vec<u64>>, candidate: Vec<u64>) -> bool {
    let mut v = candidate;
    for row in basis.iter() {
        if let Some(p) = leading_bit(row) {
            if v[p / 64] & (1u64 << (p % 64)) != 0 {
                xor_into(&mut v, row);
            }
        }
    }
    if v.iter().all(|&w| w == 0) {
        return false;
    }
    basis.push(v);
    true
}

fn leading_bit(bv: &[u64]) -> Option<usize> {
    bv.iter()
        .enumerate()
        .find(|(_, &word)| word != 0)
        .map(|(i, &word)| i * 64 + word.trailing_zeros() as usize)
}

fn xor_into(a: &mut [u64], b: &[u64]) {
    for (aw, bw) in a.iter_mut().zip(b.iter()) {
        *aw ^= *bw;
    }
}

/// Ring membership queries over a fixed ring set.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Ring>,
}

impl RingInfo {
    pub fn sssr(structure: &Structure) -> Self {
        Self::from_rings(find_sssr(structure))
    }

    pub fn from_rings(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn is_ring_node(&self, node: NodeIndex) -> bool {
        self.rings.iter().any(|r| r.contains_node(node))
    }

    pub fn is_ring_connector(&self, connector: EdgeIndex) -> bool {
        self.rings.iter().any(|r| r.contains_connector(connector))
    }

    pub fn smallest_ring_size_of_node(&self, node: NodeIndex) -> Option<usize> {
        self.node_rings(node).map(Ring::size).min()
    }

    pub fn smallest_ring_size_of_connector(&self, connector: EdgeIndex) -> Option<usize> {
        self.rings
            .iter()
            .filter(|r| r.contains_connector(connector))
            .map(Ring::size)
            .min()
    }

    pub fn node_rings(&self, node: NodeIndex) -> impl Iterator<Item = &Ring> + '_ {
        self.rings.iter().filter(move |r| r.contains_node(node))
    }

    /// Sorted nodes and connectors that belong to any ring.
    pub fn union(&self) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
        let mut nodes: Vec<NodeIndex> = self.rings.iter().flat_map(|r| r.nodes.iter().copied()).collect();
        let mut connectors: Vec<EdgeIndex> = self
            .rings
            .iter()
            .flat_map(|r| r.connectors.iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        connectors.sort_unstable();
        connectors.dedup();
        (nodes, connectors)
    }
}
