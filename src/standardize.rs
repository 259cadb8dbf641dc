use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::aromaticity::{perceive_aromatic_rings, AromaticityOptions};
use crate::canonical::Canonicalizer;
use crate::error::Result;
use crate::rings::Ring;
use crate::stereo::{perceive_stereos, StereoOptions, StereoPerception};
use crate::structure::{ConnectorPath, FlattenMap, NodePath, Structure};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeOptions {
    pub unmarshal_sub_fragments: bool,
    pub do_canonicalization: bool,
    pub do_aromatic_perception: bool,
    pub do_stereo_perception: bool,
    /// Fold explicit hydrogen atoms into their heavy atom's count.
    pub clear_hydrogens: bool,
    /// Executor used for canonicalization; the registry default when unset.
    pub canonicalizer_executor_id: Option<String>,
    pub aromaticity: AromaticityOptions,
    pub stereo: StereoOptions,
}

impl Default for StandardizeOptions {
    fn default() -> Self {
        Self {
            unmarshal_sub_fragments: true,
            do_canonicalization: true,
            do_aromatic_perception: true,
            do_stereo_perception: true,
            clear_hydrogens: true,
            canonicalizer_executor_id: None,
            aromaticity: AromaticityOptions::default(),
            stereo: StereoOptions::default(),
        }
    }
}

/// What [`standardize`] did, in the numbering of the standardized
/// structure.
#[derive(Debug, Clone, Default)]
pub struct StandardizeReport {
    /// Where each node and connector came from in the input structure.
    pub origins: FlattenMap,
    pub aromatic_rings: Vec<Ring>,
    pub stereo: StereoPerception,
}

/// Brings a structure into the form comparison and search work on:
/// sub-groups expanded, canonical ranks assigned, aromatic connectors
/// flagged, stereo parities perceived and explicit hydrogens folded away.
/// Previously derived annotations are discarded first.
pub fn standardize(
    structure: &mut Structure,
    options: &StandardizeOptions,
    canonicalizer: &Canonicalizer,
) -> Result<StandardizeReport> {
    structure.clear_derived();
    let mut origins = if options.unmarshal_sub_fragments {
        structure.unmarshal_all_sub_fragments(true)?
    } else {
        FlattenMap::identity(structure)
    };

    if options.do_canonicalization {
        canonicalizer.canonicalize(structure, options.canonicalizer_executor_id.as_deref())?;
    }
    let mut aromatic_rings = if options.do_aromatic_perception {
        perceive_aromatic_rings(structure, &options.aromaticity)
    } else {
        Vec::new()
    };
    let mut stereo = if options.do_stereo_perception {
        perceive_stereos(structure, &options.stereo)?
    } else {
        StereoPerception::default()
    };

    if options.clear_hydrogens {
        let (kept_nodes, kept_connectors) = structure.remove_explicit_hydrogens();
        let reindex = Reindex::new(&kept_nodes, &kept_connectors);
        if options.unmarshal_sub_fragments {
            origins = origins.retain(&kept_nodes, &kept_connectors);
        } else {
            origins = FlattenMap::identity(structure);
        }
        aromatic_rings = aromatic_rings
            .iter()
            .filter_map(|ring| reindex.ring(ring))
            .collect();
        stereo = StereoPerception {
            nodes: stereo.nodes.iter().filter_map(|p| reindex.node_path(p)).collect(),
            connectors: stereo
                .connectors
                .iter()
                .filter_map(|p| reindex.connector_path(p))
                .collect(),
        };
    }

    log::debug!(
        "standardized: {} nodes, {} aromatic rings, {} stereo elements",
        structure.node_count(),
        aromatic_rings.len(),
        stereo.nodes.len() + stereo.connectors.len()
    );
    Ok(StandardizeReport {
        origins,
        aromatic_rings,
        stereo,
    })
}

/// Old to new indices after top level nodes were dropped.
struct Reindex {
    nodes: Vec<Option<NodeIndex>>,
    connectors: Vec<Option<EdgeIndex>>,
}

impl Reindex {
    fn new(kept_nodes: &[NodeIndex], kept_connectors: &[EdgeIndex]) -> Self {
        let node_len = kept_nodes.iter().map(|n| n.index() + 1).max().unwrap_or(0);
        let connector_len = kept_connectors.iter().map(|e| e.index() + 1).max().unwrap_or(0);
        let mut nodes = vec![None; node_len];
        for (new, old) in kept_nodes.iter().enumerate() {
            nodes[old.index()] = Some(NodeIndex::new(new));
        }
        let mut connectors = vec![None; connector_len];
        for (new, old) in kept_connectors.iter().enumerate() {
            connectors[old.index()] = Some(EdgeIndex::new(new));
        }
        Self { nodes, connectors }
    }

    fn node(&self, n: NodeIndex) -> Option<NodeIndex> {
        self.nodes.get(n.index()).copied().flatten()
    }

    fn connector(&self, e: EdgeIndex) -> Option<EdgeIndex> {
        self.connectors.get(e.index()).copied().flatten()
    }

    fn ring(&self, ring: &Ring) -> Option<Ring> {
        Some(Ring {
            nodes: ring.nodes.iter().map(|&n| self.node(n)).collect::<Option<_>>()?,
            connectors: ring
                .connectors
                .iter()
                .map(|&e| self.connector(e))
                .collect::<Option<_>>()?,
        })
    }

    // nested paths are untouched: only the top level loses hydrogens
    fn node_path(&self, path: &NodePath) -> Option<NodePath> {
        match path.groups.first() {
            None => self.node(path.node).map(NodePath::top),
            Some(&g) => Some(NodePath {
                groups: std::iter::once(self.node(g)?)
                    .chain(path.groups[1..].iter().copied())
                    .collect(),
                node: path.node,
            }),
        }
    }

    fn connector_path(&self, path: &ConnectorPath) -> Option<ConnectorPath> {
        match path.groups.first() {
            None => self.connector(path.connector).map(ConnectorPath::top),
            Some(&g) => Some(ConnectorPath {
                groups: std::iter::once(self.node(g)?)
                    .chain(path.groups[1..].iter().copied())
                    .collect(),
                connector: path.connector,
            }),
        }
    }
}
