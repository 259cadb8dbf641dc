pub mod aromaticity;
pub mod builder;
pub mod cancel;
pub mod canonical;
pub mod compare;
pub mod connector;
pub mod element;
pub mod error;
pub mod node;
pub mod rings;
pub mod search;
pub mod standardize;
pub mod stereo;
pub mod structure;
pub mod traits;
pub mod valence;

pub use aromaticity::{
    perceive_aromatic_rings, perceive_aromatic_rings_in, ring_aromatic_type, AromaticType,
    AromaticityOptions,
};
pub use builder::StructureBuilder;
pub use cancel::CancelToken;
pub use canonical::{
    canonicalize, CanonicalizationExecutor, Canonicalizer, MorganExExecutor, MorganExecutor,
};
pub use compare::{
    compare_structures, compare_structures_with, is_same_structure, ComparisonLevel,
    ComparisonOptions,
};
pub use connector::{BondOrder, BondStereo, BondType, Connector};
pub use element::Element;
pub use error::{Result, StructureError};
pub use node::{IsotopeId, Node, NodeKind, PseudoKind, Radical, StereoParity, SubGroup};
pub use rings::{
    expected_ring_count, find_all_rings, find_all_rings_with, find_cycle_blocks, find_sssr,
    CycleBlock, Ring, RingInfo, RingSearchLimits,
};
pub use search::{
    contains_sub_structure, find_sub_structure, find_sub_structure_with, SearchMatch,
    SearchOptions,
};
pub use standardize::{standardize, StandardizeOptions, StandardizeReport};
pub use stereo::{perceive_chiral_nodes, perceive_stereo_connectors, perceive_stereos, StereoOptions, StereoPerception};
pub use structure::{ConnectorPath, FlattenMap, NodePath, Structure};
pub use traits::{HasCanonicalRank, HasParity};

#[cfg(test)]
mod tests;
