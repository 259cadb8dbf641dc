use petgraph::graph::NodeIndex;

use crate::element::Element;
use crate::structure::Structure;

/// Binary stereo descriptor assigned by stereo perception.
///
/// `Odd` and `Even` follow the MDL convention: for a double bond, `Odd`
/// means the superior substituents sit on the same side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StereoParity {
    #[default]
    None,
    Odd,
    Even,
    Unknown,
}

impl StereoParity {
    pub fn is_determined(self) -> bool {
        matches!(self, StereoParity::Odd | StereoParity::Even)
    }

    pub fn flipped(self) -> Self {
        match self {
            StereoParity::Odd => StereoParity::Even,
            StereoParity::Even => StereoParity::Odd,
            other => other,
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            StereoParity::None => 0,
            StereoParity::Odd => 1,
            StereoParity::Even => 2,
            StereoParity::Unknown => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Radical {
    #[default]
    None,
    Singlet,
    Doublet,
    Triplet,
}

impl Radical {
    /// Valence consumed by the unpaired electrons.
    pub fn valence_loss(self) -> u8 {
        match self {
            Radical::None => 0,
            Radical::Doublet => 1,
            Radical::Singlet | Radical::Triplet => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsotopeId {
    pub element: Element,
    pub mass_number: Option<u16>,
}

impl From<Element> for IsotopeId {
    fn from(element: Element) -> Self {
        Self {
            element,
            mass_number: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PseudoKind {
    Dummy,
    Hetero,
    Any,
    Custom,
}

/// A nested fragment represented by a single node of its parent.
///
/// `anchors` are the fragment nodes that receive the parent's connectors
/// when the sub-group is unmarshalled: the k-th external connector goes to
/// `anchors[k]`, and the last anchor takes any surplus.
#[derive(Debug, Clone)]
pub struct SubGroup {
    pub fragment: Structure,
    pub anchors: Vec<NodeIndex>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Atom {
        element: Element,
        mass_number: Option<u16>,
    },
    Pseudo {
        kind: PseudoKind,
        symbol: String,
    },
    /// Query atom: any of `allowed` (any element when empty) except `disallowed`.
    Variable {
        allowed: Vec<IsotopeId>,
        disallowed: Vec<IsotopeId>,
    },
    SubGroup(Box<SubGroup>),
}

/// A node of a structure: atom, pseudo atom, variable atom or sub-group.
///
/// The `parity`, `canonical_rank` and `symmetry_class` fields are derived
/// annotations written by the perception algorithms. Everything else is
/// identity and is never modified by them.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub charge: i8,
    pub radical: Radical,
    pub lone_pairs: u8,
    /// Hydrogen count fixed by the input. `None` lets the count be derived
    /// from the default valences.
    pub explicit_hydrogen_count: Option<u8>,
    /// 2D coordinate, relative to the owning sub-group when nested.
    pub coord_2d: Option<[f64; 2]>,
    pub coord_3d: Option<[f64; 3]>,
    pub parity: StereoParity,
    pub canonical_rank: Option<usize>,
    /// Rank before tie-breaking; equal values mark topologically
    /// equivalent nodes.
    pub symmetry_class: Option<usize>,
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            charge: 0,
            radical: Radical::None,
            lone_pairs: 0,
            explicit_hydrogen_count: None,
            coord_2d: None,
            coord_3d: None,
            parity: StereoParity::None,
            canonical_rank: None,
            symmetry_class: None,
        }
    }

    pub fn atom(element: Element) -> Self {
        Self::with_kind(NodeKind::Atom {
            element,
            mass_number: None,
        })
    }

    pub fn pseudo(kind: PseudoKind, symbol: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Pseudo {
            kind,
            symbol: symbol.into(),
        })
    }

    pub fn variable(allowed: Vec<IsotopeId>, disallowed: Vec<IsotopeId>) -> Self {
        Self::with_kind(NodeKind::Variable {
            allowed,
            disallowed,
        })
    }

    pub fn sub_group(fragment: Structure, anchors: Vec<NodeIndex>) -> Self {
        Self::with_kind(NodeKind::SubGroup(Box::new(SubGroup { fragment, anchors })))
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_hydrogens(mut self, count: u8) -> Self {
        self.explicit_hydrogen_count = Some(count);
        self
    }

    pub fn with_mass_number(mut self, mass: u16) -> Self {
        if let NodeKind::Atom { mass_number, .. } = &mut self.kind {
            *mass_number = Some(mass);
        }
        self
    }

    pub fn with_radical(mut self, radical: Radical) -> Self {
        self.radical = radical;
        self
    }

    pub fn with_coord_2d(mut self, x: f64, y: f64) -> Self {
        self.coord_2d = Some([x, y]);
        self
    }

    pub fn with_coord_3d(mut self, x: f64, y: f64, z: f64) -> Self {
        self.coord_3d = Some([x, y, z]);
        self
    }

    pub fn element(&self) -> Option<Element> {
        match &self.kind {
            NodeKind::Atom { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn mass_number(&self) -> Option<u16> {
        match &self.kind {
            NodeKind::Atom { mass_number, .. } => *mass_number,
            _ => None,
        }
    }

    pub fn is_element(&self, element: Element) -> bool {
        self.element() == Some(element)
    }

    pub fn as_sub_group(&self) -> Option<&SubGroup> {
        match &self.kind {
            NodeKind::SubGroup(group) => Some(group),
            _ => None,
        }
    }

    /// Whether this node may stand for `element`: atoms match their own
    /// element, variable atoms match anything their lists allow.
    pub fn may_contain_element(&self, element: Element) -> bool {
        match &self.kind {
            NodeKind::Atom { element: e, .. } => *e == element,
            NodeKind::Variable {
                allowed,
                disallowed,
            } => {
                let permitted = allowed.is_empty() || allowed.iter().any(|i| i.element == element);
                permitted && !disallowed.iter().any(|i| i.element == element)
            }
            NodeKind::Pseudo { .. } | NodeKind::SubGroup(_) => false,
        }
    }

    /// Coarse node category: atom 1, pseudo atom 2, variable atom 3,
    /// sub-group 4.
    pub fn class_code(&self) -> u8 {
        match &self.kind {
            NodeKind::Atom { .. } => 1,
            NodeKind::Pseudo { .. } => 2,
            NodeKind::Variable { .. } => 3,
            NodeKind::SubGroup(_) => 4,
        }
    }

    /// Identity code used by ranking and comparison: the atomic number for
    /// atoms, fixed sentinels for the abstract kinds.
    pub fn identity_code(&self) -> u16 {
        match &self.kind {
            NodeKind::Atom { element, .. } => element.atomic_num() as u16,
            NodeKind::SubGroup(_) => 0xFFD,
            NodeKind::Pseudo { .. } => 0xFFE,
            NodeKind::Variable { .. } => 0xFFF,
        }
    }

    /// Free-form part of the identity that `identity_code` cannot carry.
    pub fn identity_label(&self) -> String {
        match &self.kind {
            NodeKind::Atom { .. } => String::new(),
            NodeKind::Pseudo { kind, symbol } => format!("{:?}:{}", kind, symbol),
            NodeKind::Variable {
                allowed,
                disallowed,
            } => {
                let list = |ids: &[IsotopeId]| {
                    let mut symbols: Vec<&str> = ids.iter().map(|i| i.element.symbol()).collect();
                    symbols.sort_unstable();
                    symbols.join(",")
                };
                format!("[{}]![{}]", list(allowed), list(disallowed))
            }
            NodeKind::SubGroup(group) => format!("group:{}", group.fragment.node_count()),
        }
    }

    pub fn clear_derived(&mut self) {
        self.parity = StereoParity::None;
        self.canonical_rank = None;
        self.symmetry_class = None;
    }
}

impl crate::traits::HasCanonicalRank for Node {
    fn canonical_rank(&self) -> Option<usize> {
        self.canonical_rank
    }

    fn set_canonical_rank(&mut self, rank: Option<usize>) {
        self.canonical_rank = rank;
    }
}

impl crate::traits::HasParity for Node {
    fn parity(&self) -> StereoParity {
        self.parity
    }

    fn set_parity(&mut self, parity: StereoParity) {
        self.parity = parity;
    }
}
