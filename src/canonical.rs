use std::cmp::Ordering;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::aromaticity::{perceive_aromatic_rings, AromaticityOptions};
use crate::error::{Result, StructureError};
use crate::node::{Radical, StereoParity};
use crate::stereo::{perceive_ranked, StereoOptions};
use crate::structure::Structure;
use crate::traits::{count_determined, HasParity};

/// A canonical ranking strategy, selected by id.
pub trait CanonicalizationExecutor: Send + Sync {
    fn id(&self) -> &str;

    /// Writes `canonical_rank` on every node and connector, and
    /// `symmetry_class` on every node.
    fn execute(&self, structure: &mut Structure) -> Result<()>;
}

/// Invariant refinement followed by deterministic tie breaking. Stereo
/// parities do not take part.
#[derive(Debug, Clone, Default)]
pub struct MorganExecutor;

impl CanonicalizationExecutor for MorganExecutor {
    fn id(&self) -> &str {
        "morgan"
    }

    fn execute(&self, structure: &mut Structure) -> Result<()> {
        prepare(structure);
        let ranking = morgan_ranking(structure, false);
        apply_ranking(structure, &ranking, false);
        Ok(())
    }
}

/// Morgan ranking repeated with perceived stereo parities as extra
/// invariants, as long as the number of determined stereo elements grows.
#[derive(Debug, Clone, Default)]
pub struct MorganExExecutor {
    pub stereo: StereoOptions,
}

impl CanonicalizationExecutor for MorganExExecutor {
    fn id(&self) -> &str {
        "morgan_ex"
    }

    fn execute(&self, structure: &mut Structure) -> Result<()> {
        prepare(structure);
        let ranking = morgan_ranking(structure, false);
        apply_ranking(structure, &ranking, false);

        let mut determined = 0;
        let mut rounds = 0;
        loop {
            perceive_ranked(structure, &self.stereo);
            let count = count_determined(structure.graph().node_weights())
                + count_determined(structure.graph().edge_weights());
            if count <= determined {
                break;
            }
            determined = count;
            rounds += 1;
            let ranking = morgan_ranking(structure, true);
            apply_ranking(structure, &ranking, true);
        }
        log::debug!("morgan_ex: {} stereo elements after {} rounds", determined, rounds);
        Ok(())
    }
}

/// Registry of canonicalization executors.
pub struct Canonicalizer {
    executors: Vec<Box<dyn CanonicalizationExecutor>>,
    default_id: Option<String>,
}

impl std::fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("executors", &self.ids())
            .field("default_id", &self.default_id)
            .finish()
    }
}

impl Default for Canonicalizer {
    /// Registers `morgan` and `morgan_ex`, the latter as default.
    fn default() -> Self {
        let mut c = Self::empty();
        c.register(Box::new(MorganExecutor), false);
        c.register(Box::new(MorganExExecutor::default()), true);
        c
    }
}

impl Canonicalizer {
    pub fn empty() -> Self {
        Self {
            executors: Vec::new(),
            default_id: None,
        }
    }

    /// Adds an executor, replacing any with the same id.
    pub fn register(&mut self, executor: Box<dyn CanonicalizationExecutor>, make_default: bool) {
        let id = executor.id().to_string();
        self.executors.retain(|e| e.id() != id);
        self.executors.push(executor);
        if make_default {
            self.default_id = Some(id);
        }
    }

    pub fn unregister(&mut self, id: &str) -> Option<Box<dyn CanonicalizationExecutor>> {
        let pos = self.executors.iter().position(|e| e.id() == id)?;
        if self.default_id.as_deref() == Some(id) {
            self.default_id = None;
        }
        Some(self.executors.remove(pos))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.executors.iter().map(|e| e.id()).collect()
    }

    /// The executor registered under `id`, or the default one. Without a
    /// default the first registered executor is used.
    pub fn executor(&self, id: Option<&str>) -> Result<&dyn CanonicalizationExecutor> {
        if self.executors.is_empty() {
            return Err(StructureError::NoExecutorRegistered);
        }
        let wanted = id.or(self.default_id.as_deref());
        let found = match wanted {
            Some(id) => self.executors.iter().find(|e| e.id() == id),
            None => self.executors.first(),
        };
        found
            .map(|e| e.as_ref())
            .ok_or_else(|| StructureError::ExecutorNotFound(wanted.unwrap_or_default().to_string()))
    }

    pub fn canonicalize<'a>(
        &self,
        structure: &'a mut Structure,
        executor_id: Option<&str>,
    ) -> Result<&'a mut Structure> {
        let executor = self.executor(executor_id)?;
        log::debug!("canonicalizing with `{}`", executor.id());
        executor.execute(structure)?;
        Ok(structure)
    }
}

/// Canonicalizes with the default registry.
pub fn canonicalize<'a>(
    structure: &'a mut Structure,
    executor_id: Option<&str>,
) -> Result<&'a mut Structure> {
    Canonicalizer::default().canonicalize(structure, executor_id)
}

fn prepare(structure: &mut Structure) {
    perceive_aromatic_rings(structure, &AromaticityOptions::default());
}

pub(crate) type EdgeCode = (u8, u8, u8);

/// Bond type, electron count (aromatic counts 3) and optionally parity.
pub(crate) fn connector_code(structure: &Structure, e: EdgeIndex, with_parity: bool) -> EdgeCode {
    let c = structure.connector(e);
    let electrons = if c.is_aromatic {
        3
    } else {
        c.order.electron_count()
    };
    let parity = if with_parity { c.parity.code() } else { 0 };
    (c.bond_type.code(), electrons, parity)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct NodeInvariant {
    class: u8,
    identity: u16,
    label: String,
    mass: u16,
    charge: i8,
    hydrogens: u8,
    degree: usize,
    radical: Radical,
    bonds: Vec<EdgeCode>,
    parity: u8,
}

/// Explicit hydrogen atoms are seen by their heavy atom only through its
/// hydrogen count, so that drawing hydrogens explicitly does not change
/// the ranks of heavy atoms.
pub(crate) fn ranking_adjacency(
    structure: &Structure,
    with_parity: bool,
) -> (Vec<bool>, Vec<Vec<(usize, EdgeCode)>>) {
    let explicit_h: Vec<bool> = structure
        .nodes()
        .map(|n| structure.is_explicit_hydrogen(n))
        .collect();
    let adj = structure
        .nodes()
        .map(|n| {
            structure
                .links(n)
                .filter(|&(_, other)| explicit_h[n.index()] || !explicit_h[other.index()])
                .map(|(e, other)| (other.index(), connector_code(structure, e, with_parity)))
                .collect()
        })
        .collect();
    (explicit_h, adj)
}

fn morgan_ranking(structure: &Structure, with_parity: bool) -> Ranking {
    let (_, adj) = ranking_adjacency(structure, with_parity);
    let keys: Vec<NodeInvariant> = structure
        .nodes()
        .map(|n| {
            let node = structure.node(n);
            let mut bonds: Vec<EdgeCode> = adj[n.index()].iter().map(|&(_, code)| code).collect();
            bonds.sort_unstable();
            NodeInvariant {
                class: node.class_code(),
                identity: node.identity_code(),
                label: node.identity_label(),
                mass: node.mass_number().unwrap_or(0),
                charge: node.charge,
                hydrogens: structure.hydrogen_count(n, true),
                degree: adj[n.index()].len(),
                radical: node.radical,
                bonds,
                parity: if with_parity { node.parity.code() } else { 0 },
            }
        })
        .collect();
    rank_graph(&keys, &adj)
}

/// Unique node ranks from bond orders alone, aromatic flags ignored. Rings
/// are chosen in this order before aromaticity is known.
pub(crate) fn kekule_ranks(structure: &Structure) -> Vec<usize> {
    let mut plain = structure.clone();
    for e in plain.connectors().collect::<Vec<EdgeIndex>>() {
        plain.connector_mut(e).is_aromatic = false;
    }
    morgan_ranking(&plain, false).ranks
}

fn apply_ranking(structure: &mut Structure, ranking: &Ranking, with_parity: bool) {
    for n in structure.nodes().collect::<Vec<NodeIndex>>() {
        let node = structure.node_mut(n);
        node.canonical_rank = Some(ranking.ranks[n.index()]);
        node.symmetry_class = Some(ranking.classes[n.index()]);
    }
    let order = connector_order(structure, &ranking.ranks, |s, e| {
        connector_code(s, e, with_parity)
    });
    for (rank, e) in order.into_iter().enumerate() {
        structure.connector_mut(e).canonical_rank = Some(rank);
    }
}

/// Connectors sorted by their end ranks, then by `code`.
pub(crate) fn connector_order<E: Ord>(
    structure: &Structure,
    node_ranks: &[usize],
    code: impl Fn(&Structure, EdgeIndex) -> E,
) -> Vec<EdgeIndex> {
    let mut keyed: Vec<((usize, usize), E, EdgeIndex)> = structure
        .connectors()
        .filter_map(|e| {
            let (a, b) = structure.connector_ends(e)?;
            let (ra, rb) = (node_ranks[a.index()], node_ranks[b.index()]);
            Some(((ra.min(rb), ra.max(rb)), code(structure, e), e))
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, _, e)| e).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ranking {
    /// Unique rank per node, `0..n`.
    pub ranks: Vec<usize>,
    /// Rank before tie breaking.
    pub classes: Vec<usize>,
}

/// Ranks the nodes of a graph given per-node keys and coded adjacency.
pub(crate) fn rank_graph<K: Ord, E: Ord + Copy>(keys: &[K], adj: &[Vec<(usize, E)>]) -> Ranking {
    let mut ranks = ranks_from_keys(keys);
    let rounds = morgan_refine(adj, &mut ranks);
    let classes = ranks.clone();
    break_ties(keys, adj, &mut ranks);
    log::debug!(
        "ranked {} nodes: {} classes after {} refinement rounds",
        ranks.len(),
        count_distinct(&classes),
        rounds
    );
    Ranking { ranks, classes }
}

/// Rank of each item: the number of items with a strictly smaller key.
fn ranks_from_keys<K: Ord>(keys: &[K]) -> Vec<usize> {
    let n = keys.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0usize; n];
    for i in 1..n {
        ranks[indices[i]] = if keys[indices[i]] == keys[indices[i - 1]] {
            ranks[indices[i - 1]]
        } else {
            i
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

fn neighborhood<E: Ord + Copy>(adj: &[Vec<(usize, E)>], ranks: &[usize], i: usize) -> Vec<(usize, E)> {
    let mut nb: Vec<(usize, E)> = adj[i].iter().map(|&(j, e)| (ranks[j], e)).collect();
    nb.sort_unstable();
    nb
}

/// Splits rank classes by their sorted neighbour ranks until the number of
/// classes stops growing. Returns the number of productive rounds.
fn morgan_refine<E: Ord + Copy>(adj: &[Vec<(usize, E)>], ranks: &mut Vec<usize>) -> usize {
    let mut prev_distinct = count_distinct(ranks);
    let mut rounds = 0;
    loop {
        let keys: Vec<(usize, Vec<(usize, E)>)> = (0..ranks.len())
            .map(|i| (ranks[i], neighborhood(adj, ranks, i)))
            .collect();
        let new_ranks = ranks_from_keys(&keys);
        let distinct = count_distinct(&new_ranks);
        if distinct <= prev_distinct {
            return rounds;
        }
        *ranks = new_ranks;
        prev_distinct = distinct;
        rounds += 1;
    }
}

fn smallest_tied_rank(ranks: &[usize]) -> Option<usize> {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}

/// Keys and neighbour ranks of every node, sorted by rank. Does not depend
/// on node numbering; once ranks are unique it describes the whole labelled
/// graph.
type Trace<'k, K, E> = Vec<(usize, &'k K, Vec<(usize, E)>)>;

fn trace<'k, K: Ord, E: Ord + Copy>(keys: &'k [K], adj: &[Vec<(usize, E)>], ranks: &[usize]) -> Trace<'k, K, E> {
    let mut trace: Trace<'k, K, E> = (0..ranks.len())
        .map(|i| (ranks[i], &keys[i], neighborhood(adj, ranks, i)))
        .collect();
    trace.sort();
    trace
}

/// Members of the class at rank `r` each tried as its lowest member, then
/// refined. Returns every trial whose trace is smallest, in node order.
fn best_trials<K: Ord, E: Ord + Copy>(
    keys: &[K],
    adj: &[Vec<(usize, E)>],
    ranks: &[usize],
    r: usize,
) -> Vec<Vec<usize>> {
    let tied: Vec<usize> = (0..ranks.len()).filter(|&i| ranks[i] == r).collect();
    let mut best: Option<Trace<'_, K, E>> = None;
    let mut leaders = Vec::new();
    for &candidate in &tied {
        let mut trial = ranks.to_vec();
        for &other in &tied {
            if other != candidate {
                trial[other] = r + 1;
            }
        }
        morgan_refine(adj, &mut trial);
        let t = trace(keys, adj, &trial);
        match best.as_ref().map(|b| t.cmp(b)) {
            Some(Ordering::Greater) => {}
            Some(Ordering::Equal) => leaders.push(trial),
            _ => {
                best = Some(t);
                leaders = vec![trial];
            }
        }
    }
    leaders
}

/// Splits tied classes smallest first, always following the first trial
/// with the smallest trace.
fn greedy_ties<K: Ord, E: Ord + Copy>(keys: &[K], adj: &[Vec<(usize, E)>], ranks: &mut Vec<usize>) {
    while let Some(r) = smallest_tied_rank(ranks) {
        match best_trials(keys, adj, ranks, r).into_iter().next() {
            Some(trial) => *ranks = trial,
            None => return,
        }
    }
}

/// Makes ranks unique. While one trial has the smallest trace it is taken
/// directly. At the first class where several trials share it, each is
/// completed greedily and the completion with the smallest full trace wins,
/// so non-equivalent nodes that refinement cannot tell apart are ordered by
/// the labelled graphs they lead to. Ties met again inside a completion are
/// followed greedily: graphs where refinement fails at several levels (some
/// strongly regular graphs) can still get a numbering dependent order.
fn break_ties<K: Ord, E: Ord + Copy>(keys: &[K], adj: &[Vec<(usize, E)>], ranks: &mut Vec<usize>) {
    while let Some(r) = smallest_tied_rank(ranks) {
        let mut leaders = best_trials(keys, adj, ranks, r);
        if leaders.len() > 1 {
            let best = leaders
                .into_iter()
                .map(|mut trial| {
                    greedy_ties(keys, adj, &mut trial);
                    (trace(keys, adj, &trial), trial)
                })
                .min_by(|a, b| a.0.cmp(&b.0));
            if let Some((_, trial)) = best {
                *ranks = trial;
            }
            return;
        }
        match leaders.pop() {
            Some(trial) => *ranks = trial,
            None => return,
        }
    }
}

/// Parities of nodes and connectors reset to `None`.
pub(crate) fn clear_stereo(structure: &mut Structure) {
    for n in structure.nodes().collect::<Vec<_>>() {
        structure.node_mut(n).set_parity(StereoParity::None);
    }
    for e in structure.connectors().collect::<Vec<_>>() {
        structure.connector_mut(e).set_parity(StereoParity::None);
    }
}
