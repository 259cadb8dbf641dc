use std::f64::consts::PI;

use log::{debug, warn};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::canonical::{clear_stereo, Canonicalizer};
use crate::connector::{BondOrder, BondStereo};
use crate::element::Element;
use crate::error::Result;
use crate::node::{Node, StereoParity};
use crate::rings::RingInfo;
use crate::structure::{ConnectorPath, NodePath, Structure};

/// Double bonds inside rings up to this size cannot be stereo bonds.
const MAX_STEREO_RING_SIZE: usize = 10;
/// Minimum sine of a double bond side substituent off the bond axis.
const SIDE_SINE_THRESHOLD: f64 = 5e-2;
const EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoOptions {
    /// Perceive on a flattened copy when sub-groups are present and write
    /// the parities back into the nested structure.
    pub use_flattened_shadow: bool,
    pub perceive_stereo_connectors: bool,
    pub perceive_chiral_nodes: bool,
    /// When unset, stereo elements are found but their parity stays `None`.
    pub calc_parity: bool,
    /// Reject double bonds whose two substituents on one end are drawn on
    /// the same side of the bond axis.
    pub strict_stereo_bond_geometry: bool,
    /// Reject 2D centers drawn with more than two plain sibling bonds.
    pub strict_stereo_atom_geometry: bool,
    /// Wedges lift their far end twice as much as hashes push it down.
    pub wedge_bond_prior: bool,
    /// Vertical Fischer substituents point toward the viewer.
    pub reversed_fischer: bool,
    /// Allowed deviation (minor over major axis) of a Fischer cross arm.
    pub fischer_allowed_error: f64,
}

impl Default for StereoOptions {
    fn default() -> Self {
        Self {
            use_flattened_shadow: true,
            perceive_stereo_connectors: true,
            perceive_chiral_nodes: true,
            calc_parity: true,
            strict_stereo_bond_geometry: false,
            strict_stereo_atom_geometry: false,
            wedge_bond_prior: true,
            reversed_fischer: false,
            fischer_allowed_error: 0.08,
        }
    }
}

/// Stereo elements found by [`perceive_stereos`], addressed in the
/// (possibly nested) input structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StereoPerception {
    pub nodes: Vec<NodePath>,
    pub connectors: Vec<ConnectorPath>,
}

/// Runs both perceivers and stores the parities on the input.
pub fn perceive_stereos(structure: &mut Structure, options: &StereoOptions) -> Result<StereoPerception> {
    if !(options.use_flattened_shadow && structure.has_sub_groups()) {
        ensure_ranked(structure)?;
        let (nodes, connectors) = perceive_ranked(structure, options);
        return Ok(StereoPerception {
            nodes: nodes.into_iter().map(NodePath::top).collect(),
            connectors: connectors.into_iter().map(ConnectorPath::top).collect(),
        });
    }

    let (mut shadow, map) = structure.flattened(true)?;
    ensure_ranked(&mut shadow)?;
    let (nodes, connectors) = perceive_ranked(&mut shadow, options);
    for n in shadow.nodes() {
        if let Some(origin) = structure.node_at_path_mut(&map.nodes[n.index()]) {
            origin.parity = shadow.node(n).parity;
        }
    }
    for e in shadow.connectors() {
        if let Some(origin) = structure.connector_at_path_mut(&map.connectors[e.index()]) {
            origin.parity = shadow.connector(e).parity;
        }
    }
    Ok(StereoPerception {
        nodes: nodes.iter().map(|n| map.nodes[n.index()].clone()).collect(),
        connectors: connectors
            .iter()
            .map(|e| map.connectors[e.index()].clone())
            .collect(),
    })
}

/// Finds tetrahedral stereo centers and sets their parity. Every other
/// node gets `StereoParity::None`.
pub fn perceive_chiral_nodes(structure: &mut Structure, options: &StereoOptions) -> Result<Vec<NodeIndex>> {
    ensure_ranked(structure)?;
    let found: Vec<NodeIndex> = structure
        .nodes()
        .filter(|&n| is_chiral_node(structure, n))
        .collect();
    for n in structure.nodes().collect::<Vec<_>>() {
        let parity = if options.calc_parity && found.contains(&n) {
            chiral_node_parity(structure, n, options)
        } else {
            StereoParity::None
        };
        structure.node_mut(n).parity = parity;
    }
    debug!("found {} chiral nodes", found.len());
    Ok(found)
}

/// Finds double bonds with cis/trans isomerism and sets their parity. Every
/// other connector gets `StereoParity::None`.
pub fn perceive_stereo_connectors(
    structure: &mut Structure,
    options: &StereoOptions,
) -> Result<Vec<EdgeIndex>> {
    ensure_ranked(structure)?;
    let rings = RingInfo::sssr(structure);
    let found: Vec<EdgeIndex> = structure
        .connectors()
        .filter(|&e| is_stereo_connector(structure, &rings, e))
        .collect();
    for e in structure.connectors().collect::<Vec<_>>() {
        let parity = if options.calc_parity && found.contains(&e) {
            stereo_connector_parity(structure, e, options)
        } else {
            StereoParity::None
        };
        structure.connector_mut(e).parity = parity;
    }
    debug!("found {} stereo connectors", found.len());
    Ok(found)
}

fn ensure_ranked(structure: &mut Structure) -> Result<()> {
    let ranked = structure
        .graph()
        .node_weights()
        .all(|n| n.symmetry_class.is_some() && n.canonical_rank.is_some());
    if !ranked {
        warn!("stereo perception on a structure without canonical ranks, canonicalizing first");
        Canonicalizer::default().canonicalize(structure, None)?;
    }
    Ok(())
}

/// Resets every parity, then perceives using the ranks already present.
pub(crate) fn perceive_ranked(
    structure: &mut Structure,
    options: &StereoOptions,
) -> (Vec<NodeIndex>, Vec<EdgeIndex>) {
    clear_stereo(structure);
    let mut nodes = Vec::new();
    let mut connectors = Vec::new();
    if options.perceive_chiral_nodes {
        nodes = structure
            .nodes()
            .filter(|&n| is_chiral_node(structure, n))
            .collect();
    }
    if options.perceive_stereo_connectors {
        let rings = RingInfo::sssr(structure);
        connectors = structure
            .connectors()
            .filter(|&e| is_stereo_connector(structure, &rings, e))
            .collect();
    }
    if options.calc_parity {
        for &n in &nodes {
            structure.node_mut(n).parity = chiral_node_parity(structure, n, options);
        }
        for &e in &connectors {
            structure.connector_mut(e).parity = stereo_connector_parity(structure, e, options);
        }
    }
    debug!(
        "perceived {} chiral nodes, {} stereo connectors",
        nodes.len(),
        connectors.len()
    );
    (nodes, connectors)
}

struct ChiralRule {
    substituents: usize,
    charge: Option<i8>,
}

fn chiral_rule(node: &Node) -> Option<ChiralRule> {
    let rule = |substituents, charge| Some(ChiralRule { substituents, charge });
    if node.may_contain_element(Element::C) || node.may_contain_element(Element::Si) {
        rule(4, Some(0))
    } else if node.may_contain_element(Element::N) {
        rule(4, None)
    } else if node.may_contain_element(Element::S) || node.may_contain_element(Element::P) {
        rule(3, None)
    } else if node.may_contain_element(Element::B) {
        rule(4, Some(-1))
    } else {
        None
    }
}

/// Whether a node is a tetrahedral stereo center: an allowed element with
/// enough pairwise distinct substituents, at most one hydrogen and no
/// multiple bonds. Neighbor distinctness is read from symmetry classes.
pub fn is_chiral_node(structure: &Structure, node: NodeIndex) -> bool {
    let n = structure.node(node);
    let Some(rule) = chiral_rule(n) else {
        return false;
    };
    if rule.charge.is_some_and(|c| c != n.charge) {
        return false;
    }
    let multiple = structure.connectors_of(node).any(|e| {
        let c = structure.connector(e);
        c.order.is_multiple() || c.is_aromatic
    });
    if multiple || structure.hydrogen_count(node, true) >= 2 {
        return false;
    }
    let own_h = structure.hydrogen_count(node, false) as usize;
    let neighbors: Vec<NodeIndex> = structure.neighbors(node).collect();
    if neighbors.len() + own_h < rule.substituents {
        return false;
    }
    let mut classes = Vec::with_capacity(neighbors.len());
    for &m in &neighbors {
        match structure.node(m).symmetry_class {
            Some(class) => classes.push(class),
            None => return false,
        }
    }
    classes.sort_unstable();
    classes.dedup();
    classes.len() == neighbors.len()
}

/// Neighbors of a node, highest canonical rank first.
pub(crate) fn ordered_siblings(structure: &Structure, node: NodeIndex) -> Vec<NodeIndex> {
    let mut siblings: Vec<NodeIndex> = structure.neighbors(node).collect();
    siblings.sort_by_key(|&s| std::cmp::Reverse(structure.node(s).canonical_rank));
    siblings.dedup();
    siblings
}

fn side_nodes(structure: &Structure, end: NodeIndex, other: NodeIndex) -> Vec<NodeIndex> {
    let mut sides = ordered_siblings(structure, end);
    sides.retain(|&s| s != other);
    sides
}

/// Whether a connector is a double bond with cis/trans isomerism.
pub fn is_stereo_connector(structure: &Structure, rings: &RingInfo, connector: EdgeIndex) -> bool {
    if rings
        .smallest_ring_size_of_connector(connector)
        .is_some_and(|size| size <= MAX_STEREO_RING_SIZE)
    {
        return false;
    }
    if structure.connector(connector).order != BondOrder::Double {
        return false;
    }
    let Some((a, b)) = structure.connector_ends(connector) else {
        return false;
    };
    [(a, b), (b, a)].into_iter().all(|(end, other)| {
        let sides = side_nodes(structure, end, other);
        if structure.hydrogen_count(end, true) >= 2 || sides.is_empty() || sides.len() > 2 {
            return false;
        }
        if let [first, second] = sides[..] {
            let (c1, c2) = (
                structure.node(first).symmetry_class,
                structure.node(second).symmetry_class,
            );
            if c1.is_none() || c1 == c2 {
                return false;
            }
        }
        sides.iter().all(|&s| {
            structure
                .connector_between(end, s)
                .is_some_and(|e| structure.connector(e).order == BondOrder::Single)
        })
    })
}

/// `[ref0, end0, end1, ref1]` of a double bond, where each reference is
/// the highest ranked substituent of its end.
pub(crate) fn bond_key_nodes(structure: &Structure, connector: EdgeIndex) -> Option<[NodeIndex; 4]> {
    let (a, b) = structure.connector_ends(connector)?;
    let ref_a = *side_nodes(structure, a, b).first()?;
    let ref_b = *side_nodes(structure, b, a).first()?;
    Some([ref_a, a, b, ref_b])
}

/// Parity of a permutation taking `from` to `to`: `Some(true)` when even,
/// `None` when `to` is not a rearrangement of `from`.
pub(crate) fn permutation_parity<T: Eq>(from: &[T], to: &[T]) -> Option<bool> {
    let n = from.len();
    if n != to.len() {
        return None;
    }
    let perm: Vec<usize> = from
        .iter()
        .map(|f| to.iter().position(|t| t == f))
        .collect::<Option<_>>()?;
    let mut visited = vec![false; n];
    let mut swaps = 0usize;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut cycle_len = 0;
        let mut j = i;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    Some(swaps % 2 == 0)
}

type Vec3 = [f64; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: Vec3, k: f64) -> Vec3 {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn lift(c: [f64; 2]) -> Vec3 {
    [c[0], c[1], 0.0]
}

fn wedge_z_factor(stereo: BondStereo, wedge_bond_prior: bool) -> f64 {
    match (stereo, wedge_bond_prior) {
        (BondStereo::Up, true) => 2.0,
        (BondStereo::UpInverted, true) => -2.0,
        (BondStereo::Up, false) | (BondStereo::DownInverted, _) => 1.0,
        (BondStereo::UpInverted, false) | (BondStereo::Down, _) => -1.0,
        _ => 0.0,
    }
}

/// Stereo of the connector between `center` and `sibling`, as seen from
/// `center`. `None` when there is no such connector.
fn stereo_from(structure: &Structure, center: NodeIndex, sibling: NodeIndex) -> Option<BondStereo> {
    let e = structure.connector_between(center, sibling)?;
    let stereo = structure.connector(e).stereo;
    let (first, _) = structure.connector_ends(e)?;
    Some(if first == center { stereo } else { stereo.inverted() })
}

/// Parity of a chiral node from 3D coordinates, or from 2D coordinates
/// with wedges or a Fischer cross.
pub fn chiral_node_parity(structure: &Structure, center: NodeIndex, options: &StereoOptions) -> StereoParity {
    let siblings = ordered_siblings(structure, center);
    if siblings.len() < 3 {
        return StereoParity::Unknown;
    }
    let with_implicit = structure.hydrogen_count(center, false) > 0 || siblings.len() < 4;

    let spatial = structure.node(center).coord_3d.and_then(|c| {
        siblings
            .iter()
            .map(|&s| structure.node(s).coord_3d.map(|p| sub(p, c)))
            .collect::<Option<Vec<Vec3>>>()
    });
    let (rel, implicit_z) = match spatial {
        Some(rel) => (rel, None),
        None => match planar_siblings(structure, center, &siblings, options) {
            Some(planar) => planar,
            None => return StereoParity::Unknown,
        },
    };
    rotation_parity(&rel, with_implicit, implicit_z)
}

/// Sibling vectors of a 2D center with wedge or Fischer depth, plus the
/// depth of an implicit sibling placed on the toward-viewer Fischer arm.
fn planar_siblings(
    structure: &Structure,
    center: NodeIndex,
    siblings: &[NodeIndex],
    options: &StereoOptions,
) -> Option<(Vec<Vec3>, Option<f64>)> {
    let c = lift(structure.node(center).coord_2d?);
    let mut rel = Vec::with_capacity(siblings.len());
    let mut stereos = Vec::with_capacity(siblings.len());
    for &s in siblings {
        rel.push(sub(lift(structure.node(s).coord_2d?), c));
        let stereo = stereo_from(structure, center, s)?;
        if stereo.is_wavy() {
            return None;
        }
        stereos.push(if stereo.is_wedge() { stereo } else { BondStereo::None });
    }

    let mut implicit_toward = false;
    if stereos.iter().all(|&s| s == BondStereo::None) {
        let slots = fischer_slots(structure, center, &rel, options)?;
        let toward = |slot: usize| (slot % 2 == 1) != options.reversed_fischer;
        for (i, &slot) in slots.iter().enumerate() {
            stereos[i] = if toward(slot) { BondStereo::Up } else { BondStereo::Down };
        }
        if siblings.len() == 3 && (0..4).any(|slot| !slots.contains(&slot) && toward(slot)) {
            implicit_toward = true;
        }
    } else if options.strict_stereo_atom_geometry
        && stereos.iter().filter(|&&s| s == BondStereo::None).count() > 2
    {
        return None;
    }

    for (v, &stereo) in rel.iter_mut().zip(&stereos) {
        v[2] = norm(*v) * wedge_z_factor(stereo, options.wedge_bond_prior);
    }
    let max_z = rel.iter().map(|v| v[2].abs()).fold(0.0, f64::max);
    if max_z < EPSILON {
        return None;
    }
    Some((rel, implicit_toward.then_some(max_z)))
}

/// Fischer cross slots (0 top, 1 right, 2 bottom, 3 left) of the siblings
/// of a carbon center drawn with plain bonds only.
fn fischer_slots(
    structure: &Structure,
    center: NodeIndex,
    rel: &[Vec3],
    options: &StereoOptions,
) -> Option<Vec<usize>> {
    if !structure.node(center).is_element(Element::C) || !(3..=4).contains(&rel.len()) {
        return None;
    }
    let mut slots = Vec::with_capacity(rel.len());
    for v in rel {
        let (dx, dy) = (v[0].abs(), v[1].abs());
        if dx < EPSILON && dy < EPSILON {
            return None;
        }
        let (ratio, slot) = if dx > dy {
            (dy / dx, if v[0] > 0.0 { 1 } else { 3 })
        } else {
            (dx / dy, if v[1] > 0.0 { 0 } else { 2 })
        };
        if ratio > options.fischer_allowed_error || slots.contains(&slot) {
            return None;
        }
        slots.push(slot);
    }
    Some(slots)
}

/// Rotation direction of the three highest siblings seen with the
/// reference sibling behind the center. The reference is the implicit
/// sibling when there is one, otherwise the fourth sibling.
fn rotation_parity(rel: &[Vec3], with_implicit: bool, implicit_z: Option<f64>) -> StereoParity {
    let reference = if with_implicit {
        let sum = rel[..3]
            .iter()
            .fold([0.0; 3], |acc, v| [acc[0] + v[0], acc[1] + v[1], acc[2] + v[2]]);
        let mut r = scale(sum, -1.0);
        if let Some(z) = implicit_z {
            r[2] = z;
        }
        r
    } else {
        match rel.get(3) {
            Some(&r) => r,
            None => return StereoParity::Unknown,
        }
    };
    let length = norm(reference);
    if length < EPSILON {
        return StereoParity::Unknown;
    }
    let axis = scale(reference, -1.0 / length);
    let project = |v: Vec3| sub(v, scale(axis, dot(v, axis)));

    let e1 = project(rel[0]);
    if norm(e1) < EPSILON {
        return StereoParity::Unknown;
    }
    let mut angles = [0.0; 2];
    for (angle, &v) in angles.iter_mut().zip(&rel[1..3]) {
        let p = project(v);
        if norm(p) < EPSILON {
            return StereoParity::Unknown;
        }
        *angle = dot(cross(e1, p), axis).atan2(dot(e1, p)).rem_euclid(2.0 * PI);
    }
    if (angles[0] - angles[1]).abs() < EPSILON {
        StereoParity::Unknown
    } else if angles[0] < angles[1] {
        StereoParity::Even
    } else {
        StereoParity::Odd
    }
}

/// Parity of a stereo double bond: `Odd` when the highest ranked
/// substituents of both ends sit on the same side.
pub fn stereo_connector_parity(
    structure: &Structure,
    connector: EdgeIndex,
    options: &StereoOptions,
) -> StereoParity {
    if matches!(
        structure.connector(connector).stereo,
        BondStereo::EOrZ | BondStereo::CisOrTrans
    ) {
        return StereoParity::None;
    }
    let Some((a, b)) = structure.connector_ends(connector) else {
        return StereoParity::Unknown;
    };
    let sides = [side_nodes(structure, a, b), side_nodes(structure, b, a)];
    if sides.iter().any(|s| s.is_empty()) {
        return StereoParity::Unknown;
    }
    let wavy = [(a, &sides[0]), (b, &sides[1])].into_iter().any(|(end, ss)| {
        ss.iter()
            .any(|&s| stereo_from(structure, end, s).is_some_and(BondStereo::is_wavy))
    });
    if wavy {
        return StereoParity::Unknown;
    }

    let coords_3d = [sides[0][0], a, b, sides[1][0]]
        .iter()
        .map(|&n| structure.node(n).coord_3d)
        .collect::<Option<Vec<Vec3>>>();
    if let Some(c) = coords_3d {
        return dihedral_parity(c[0], c[1], c[2], c[3]);
    }
    planar_bond_parity(structure, [a, b], &sides, options.strict_stereo_bond_geometry)
        .unwrap_or(StereoParity::Unknown)
}

fn dihedral_parity(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> StereoParity {
    let b1 = sub(p1, p0);
    let b2 = sub(p2, p1);
    let b3 = sub(p3, p2);
    let n1 = cross(b1, b2);
    let n2 = cross(b2, b3);
    let (l1, l2) = (norm(n1), norm(n2));
    if l1 < EPSILON || l2 < EPSILON {
        return StereoParity::Unknown;
    }
    let angle = (dot(n1, n2) / (l1 * l2)).clamp(-1.0, 1.0).acos();
    if angle < PI * 2.0 / 5.0 {
        StereoParity::Odd
    } else if angle > PI * 3.0 / 5.0 {
        StereoParity::Even
    } else {
        StereoParity::Unknown
    }
}

/// Side of the bond axis each end's superior substituent lies on, after
/// rotating the axis onto +x.
fn planar_bond_parity(
    structure: &Structure,
    ends: [NodeIndex; 2],
    sides: &[Vec<NodeIndex>; 2],
    strict: bool,
) -> Option<StereoParity> {
    let p0 = structure.node(ends[0]).coord_2d?;
    let p1 = structure.node(ends[1]).coord_2d?;
    let axis = [p1[0] - p0[0], p1[1] - p0[1]];
    if axis[0].abs() < EPSILON && axis[1].abs() < EPSILON {
        return Some(StereoParity::Unknown);
    }
    let (sin, cos) = axis[1].atan2(axis[0]).sin_cos();

    let mut signs = [0i8; 2];
    for (k, end) in ends.iter().enumerate() {
        let origin = structure.node(*end).coord_2d?;
        let mut sines = Vec::with_capacity(2);
        for &s in &sides[k] {
            let p = structure.node(s).coord_2d?;
            let (x, y) = (p[0] - origin[0], p[1] - origin[1]);
            let length = x.hypot(y);
            if length < EPSILON {
                return Some(StereoParity::Unknown);
            }
            sines.push((-x * sin + y * cos) / length);
        }
        signs[k] = side_sign(&sines, strict);
    }

    Some(match signs {
        [0, _] | [_, 0] => StereoParity::Unknown,
        [s0, s1] if s0 == s1 => StereoParity::Odd,
        _ => StereoParity::Even,
    })
}

fn side_sign(sines: &[f64], strict: bool) -> i8 {
    let d = match *sines {
        [s] => s,
        [s, other] => {
            if strict && s.signum() == other.signum() {
                return 0;
            }
            s - other
        }
        _ => return 0,
    };
    if d.abs() < SIDE_SINE_THRESHOLD {
        0
    } else if d > 0.0 {
        1
    } else {
        -1
    }
}
