use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::canonical::Canonicalizer;
use crate::compare::{
    connector_compare_value, node_compare_value, ComparisonFlags, ComparisonLevel,
    ComparisonOptions, ConnectorCompareValue, NodeCompareValue,
};
use crate::error::{Result, StructureError};
use crate::node::StereoParity;
use crate::standardize::{standardize, StandardizeOptions, StandardizeReport};
use crate::stereo::{bond_key_nodes, ordered_siblings, permutation_parity};
use crate::structure::{ConnectorPath, NodePath, Structure};

const CANCEL_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub comparison: ComparisonOptions,
    /// The pattern must cover the whole target.
    pub exact_match: bool,
    /// Give up with `SearchLimitExceeded` after this many search steps.
    pub max_steps: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::with_level(ComparisonLevel::Constitution)
    }
}

impl SearchOptions {
    /// Options for `level`, with hydrogen and neighbor counts ignored so a
    /// pattern atom can match a more substituted target atom.
    pub fn with_level(level: ComparisonLevel) -> Self {
        Self {
            comparison: ComparisonOptions {
                linked_connector_count: Some(false),
                hydrogen_count: Some(false),
                ..ComparisonOptions::with_level(level)
            },
            exact_match: false,
            max_steps: None,
        }
    }
}

/// A sub-structure hit. Each pair is `(pattern object, target object)`,
/// both addressed in the structures as they were passed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchMatch {
    pub node_pairs: Vec<(NodePath, NodePath)>,
    pub connector_pairs: Vec<(ConnectorPath, ConnectorPath)>,
}

pub fn contains_sub_structure(target: &Structure, pattern: &Structure, options: &SearchOptions) -> Result<bool> {
    Ok(find_sub_structure(target, pattern, options)?.is_some())
}

/// Finds the first occurrence of `pattern` inside `target`.
pub fn find_sub_structure(
    target: &Structure,
    pattern: &Structure,
    options: &SearchOptions,
) -> Result<Option<SearchMatch>> {
    find_sub_structure_with(target, pattern, options, &CancelToken::new())
}

/// As [`find_sub_structure`], checking `cancel` while backtracking.
pub fn find_sub_structure_with(
    target: &Structure,
    pattern: &Structure,
    options: &SearchOptions,
    cancel: &CancelToken,
) -> Result<Option<SearchMatch>> {
    let mut flags = options.comparison.flags();
    let standardize_options = StandardizeOptions {
        do_stereo_perception: flags.stereo,
        ..StandardizeOptions::default()
    };
    let canonicalizer = Canonicalizer::default();
    let mut t = target.clone();
    let mut p = pattern.clone();
    let t_report = standardize(&mut t, &standardize_options, &canonicalizer)?;
    let p_report = standardize(&mut p, &standardize_options, &canonicalizer)?;

    let check_stereo = flags.stereo;
    flags.stereo = false;
    let matcher = Matcher::new(&t, &p, &flags, options);
    let mapping = matcher.run(check_stereo, cancel)?;
    log::debug!(
        "sub-structure search over {} target nodes: {}",
        t.node_count(),
        if mapping.is_some() { "match" } else { "no match" }
    );
    Ok(mapping.map(|m| matcher.to_match(&m, &t_report, &p_report)))
}

struct Matcher<'a> {
    target: &'a Structure,
    pattern: &'a Structure,
    target_values: Vec<NodeCompareValue>,
    pattern_values: Vec<NodeCompareValue>,
    flags: ComparisonFlags,
    exact: bool,
    max_steps: Option<usize>,
    /// Pattern nodes in visiting order; each one after the first of its
    /// component has an earlier neighbor.
    order: Vec<NodeIndex>,
    parent: Vec<Option<NodeIndex>>,
}

impl<'a> Matcher<'a> {
    fn new(target: &'a Structure, pattern: &'a Structure, flags: &ComparisonFlags, options: &SearchOptions) -> Self {
        let values = |s: &Structure| -> Vec<NodeCompareValue> {
            s.nodes().map(|n| node_compare_value(s, n, flags)).collect()
        };
        let (order, parent) = visiting_order(pattern);
        Self {
            target,
            pattern,
            target_values: values(target),
            pattern_values: values(pattern),
            flags: *flags,
            exact: options.exact_match,
            max_steps: options.max_steps,
            order,
            parent,
        }
    }

    fn connector_value(&self, s: &Structure, e: EdgeIndex) -> ConnectorCompareValue {
        connector_compare_value(s, e, &self.flags)
    }

    fn candidates(&self, depth: usize, mapping: &[Option<NodeIndex>], used: &[bool]) -> Vec<NodeIndex> {
        let p = self.order[depth];
        let pool: Vec<NodeIndex> = match self.parent[p.index()].and_then(|q| mapping[q.index()]) {
            Some(anchor) => self.target.neighbors(anchor).collect(),
            None => self.target.nodes().collect(),
        };
        pool.into_iter()
            .filter(|t| !used[t.index()] && self.node_matches(p, *t))
            .collect()
    }

    fn node_matches(&self, p: NodeIndex, t: NodeIndex) -> bool {
        let (pd, td) = (self.pattern.degree(p), self.target.degree(t));
        let degree_ok = if self.exact { pd == td } else { pd <= td };
        degree_ok && self.pattern_values[p.index()] == self.target_values[t.index()]
    }

    /// Every connector from `p` to an already mapped pattern node has a
    /// matching counterpart in the target.
    fn connectors_match(&self, p: NodeIndex, t: NodeIndex, mapping: &[Option<NodeIndex>]) -> bool {
        self.pattern.links(p).all(|(pe, q)| match mapping[q.index()] {
            None => true,
            Some(u) => self.target.connector_between(t, u).is_some_and(|te| {
                self.connector_value(self.pattern, pe) == self.connector_value(self.target, te)
            }),
        })
    }

    fn run(&self, check_stereo: bool, cancel: &CancelToken) -> Result<Option<Vec<NodeIndex>>> {
        let (pn, tn) = (self.pattern.node_count(), self.target.node_count());
        if pn > tn
            || (self.exact
                && (pn != tn || self.pattern.connector_count() != self.target.connector_count()))
        {
            return Ok(None);
        }
        if pn == 0 {
            return Ok(Some(Vec::new()));
        }

        let mut mapping: Vec<Option<NodeIndex>> = vec![None; pn];
        let mut used = vec![false; tn];
        let mut candidates: Vec<Vec<NodeIndex>> = vec![Vec::new(); pn];
        let mut cursor = vec![0usize; pn];
        candidates[0] = self.candidates(0, &mapping, &used);
        let mut depth = 0;
        let mut steps = 0usize;

        loop {
            if steps % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            steps += 1;
            if let Some(limit) = self.max_steps {
                if steps > limit {
                    return Err(StructureError::SearchLimitExceeded { limit });
                }
            }

            if depth == pn {
                let full: Vec<NodeIndex> = mapping.iter().flatten().copied().collect();
                if !check_stereo || self.stereo_matches(&full) {
                    return Ok(Some(full));
                }
                depth -= 1;
                continue;
            }

            let p = self.order[depth];
            if let Some(t) = mapping[p.index()].take() {
                used[t.index()] = false;
            }
            let mut next = None;
            while let Some(&t) = candidates[depth].get(cursor[depth]) {
                cursor[depth] += 1;
                if !used[t.index()] && self.connectors_match(p, t, &mapping) {
                    next = Some(t);
                    break;
                }
            }
            match next {
                Some(t) => {
                    mapping[p.index()] = Some(t);
                    used[t.index()] = true;
                    depth += 1;
                    if depth < pn {
                        candidates[depth] = self.candidates(depth, &mapping, &used);
                        cursor[depth] = 0;
                    }
                }
                None if depth == 0 => return Ok(None),
                None => depth -= 1,
            }
        }
    }

    /// Determined pattern parities agree with the target once the
    /// differing neighbor orders of the two structures are accounted for.
    fn stereo_matches(&self, mapping: &[NodeIndex]) -> bool {
        let nodes_ok = self.pattern.nodes().all(|p| {
            let parity = self.pattern.node(p).parity;
            !parity.is_determined() || self.center_matches(p, parity, mapping)
        });
        nodes_ok
            && self.pattern.connectors().all(|pe| {
                let parity = self.pattern.connector(pe).parity;
                !parity.is_determined() || self.double_bond_matches(pe, parity, mapping)
            })
    }

    fn center_matches(&self, p: NodeIndex, parity: StereoParity, mapping: &[NodeIndex]) -> bool {
        let t = mapping[p.index()];
        let target_parity = self.target.node(t).parity;
        if !target_parity.is_determined() {
            return false;
        }
        // the implicit slot, when present, comes last in both sequences
        let target_seq: Vec<Option<NodeIndex>> = with_implicit_slot(ordered_siblings(self.target, t));
        let mut pattern_seq: Vec<Option<NodeIndex>> = ordered_siblings(self.pattern, p)
            .into_iter()
            .map(|s| Some(mapping[s.index()]))
            .collect();
        let unmatched: Vec<NodeIndex> = target_seq
            .iter()
            .flatten()
            .filter(|s| !pattern_seq.contains(&Some(**s)))
            .copied()
            .collect();
        match unmatched[..] {
            [] => {
                if pattern_seq.len() < target_seq.len() {
                    pattern_seq.push(None);
                }
            }
            [extra] => pattern_seq.push(Some(extra)),
            _ => return false,
        }
        if pattern_seq.len() != target_seq.len() {
            return false;
        }
        let Some(even) = permutation_parity(&pattern_seq, &target_seq) else {
            return false;
        };
        parity == if even { target_parity } else { target_parity.flipped() }
    }

    fn double_bond_matches(&self, pe: EdgeIndex, parity: StereoParity, mapping: &[NodeIndex]) -> bool {
        let Some(pk) = bond_key_nodes(self.pattern, pe) else {
            return false;
        };
        let [r0, e0, e1, r1] = pk.map(|n| mapping[n.index()]);
        let Some(te) = self.target.connector_between(e0, e1) else {
            return false;
        };
        let target_parity = self.target.connector(te).parity;
        let Some([s0, f0, _, s1]) = bond_key_nodes(self.target, te) else {
            return false;
        };
        if !target_parity.is_determined() {
            return false;
        }
        let (s0, s1) = if f0 == e0 { (s0, s1) } else { (s1, s0) };
        let flips = usize::from(r0 != s0) + usize::from(r1 != s1);
        parity == if flips % 2 == 0 { target_parity } else { target_parity.flipped() }
    }

    fn to_match(&self, mapping: &[NodeIndex], t_report: &StandardizeReport, p_report: &StandardizeReport) -> SearchMatch {
        let node_pairs = self
            .pattern
            .nodes()
            .filter_map(|p| {
                let t = mapping.get(p.index())?;
                Some((
                    p_report.origins.nodes.get(p.index())?.clone(),
                    t_report.origins.nodes.get(t.index())?.clone(),
                ))
            })
            .collect();
        let connector_pairs = self
            .pattern
            .connectors()
            .filter_map(|pe| {
                let (a, b) = self.pattern.connector_ends(pe)?;
                let te = self
                    .target
                    .connector_between(*mapping.get(a.index())?, *mapping.get(b.index())?)?;
                Some((
                    p_report.origins.connectors.get(pe.index())?.clone(),
                    t_report.origins.connectors.get(te.index())?.clone(),
                ))
            })
            .collect();
        SearchMatch {
            node_pairs,
            connector_pairs,
        }
    }
}

fn with_implicit_slot(siblings: Vec<NodeIndex>) -> Vec<Option<NodeIndex>> {
    let mut seq: Vec<Option<NodeIndex>> = siblings.into_iter().map(Some).collect();
    if seq.len() < 4 {
        seq.push(None);
    }
    seq
}

/// Breadth-first order over the pattern, starting each component at its
/// most connected node.
fn visiting_order(pattern: &Structure) -> (Vec<NodeIndex>, Vec<Option<NodeIndex>>) {
    let n = pattern.node_count();
    let mut seen = vec![false; n];
    let mut parent = vec![None; n];
    let mut order = Vec::with_capacity(n);
    let mut starts: Vec<NodeIndex> = pattern.nodes().collect();
    starts.sort_by_key(|&s| std::cmp::Reverse(pattern.degree(s)));
    for start in starts {
        if seen[start.index()] {
            continue;
        }
        seen[start.index()] = true;
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for w in pattern.neighbors(v) {
                if !seen[w.index()] {
                    seen[w.index()] = true;
                    parent[w.index()] = Some(v);
                    queue.push_back(w);
                }
            }
        }
    }
    (order, parent)
}
