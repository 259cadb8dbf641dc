use crate::node::StereoParity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    /// Delocalised bond drawn as aromatic; contributes a valence of 1.5.
    Aromatic,
    Other,
    Unset,
}

impl BondOrder {
    /// Valence contribution in half units, so that an aromatic bond counts 3.
    pub fn valence_halves(self) -> u16 {
        match self {
            BondOrder::Single => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Quadruple => 8,
            BondOrder::Aromatic => 3,
            BondOrder::Other | BondOrder::Unset => 0,
        }
    }

    pub fn valence(self) -> f64 {
        self.valence_halves() as f64 / 2.0
    }

    /// Shared electrons: single 2, double 4, triple 6, quadruple 8,
    /// aromatic 3.
    pub fn electron_count(self) -> u8 {
        self.valence_halves() as u8
    }

    /// Higher than single, aromatic included.
    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            BondOrder::Double | BondOrder::Triple | BondOrder::Quadruple | BondOrder::Aromatic
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BondType {
    #[default]
    Covalent,
    Ionic,
    Coordinate,
    Metallic,
    Hydrogen,
}

impl BondType {
    pub fn code(self) -> u8 {
        match self {
            BondType::Covalent => 1,
            BondType::Ionic => 2,
            BondType::Coordinate => 3,
            BondType::Metallic => 4,
            BondType::Hydrogen => 9,
        }
    }
}

/// Drawing-level stereo designator of a connector.
///
/// Wedges are directional: `Up` points from the first connected node
/// (narrow end) to the second. The `Inverted` forms point the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    UpInverted,
    Down,
    DownInverted,
    UpOrDown,
    UpOrDownInverted,
    EOrZ,
    CisOrTrans,
}

impl BondStereo {
    pub fn inverted(self) -> Self {
        match self {
            BondStereo::Up => BondStereo::UpInverted,
            BondStereo::UpInverted => BondStereo::Up,
            BondStereo::Down => BondStereo::DownInverted,
            BondStereo::DownInverted => BondStereo::Down,
            BondStereo::UpOrDown => BondStereo::UpOrDownInverted,
            BondStereo::UpOrDownInverted => BondStereo::UpOrDown,
            other => other,
        }
    }

    pub fn is_wedge(self) -> bool {
        matches!(
            self,
            BondStereo::Up | BondStereo::UpInverted | BondStereo::Down | BondStereo::DownInverted
        )
    }

    pub fn is_wavy(self) -> bool {
        matches!(self, BondStereo::UpOrDown | BondStereo::UpOrDownInverted)
    }
}

/// An edge of a structure. The two connected nodes are the petgraph edge
/// endpoints, in insertion order; that order matters for wedges.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub order: BondOrder,
    pub bond_type: BondType,
    pub stereo: BondStereo,
    pub parity: StereoParity,
    /// Set by aromaticity perception.
    pub is_aromatic: bool,
    pub canonical_rank: Option<usize>,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(BondOrder::Single)
    }
}

impl Connector {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            bond_type: BondType::Covalent,
            stereo: BondStereo::None,
            parity: StereoParity::None,
            is_aromatic: false,
            canonical_rank: None,
        }
    }

    pub fn single() -> Self {
        Self::new(BondOrder::Single)
    }

    pub fn double() -> Self {
        Self::new(BondOrder::Double)
    }

    pub fn with_type(mut self, bond_type: BondType) -> Self {
        self.bond_type = bond_type;
        self
    }

    pub fn with_stereo(mut self, stereo: BondStereo) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn is_covalent(&self) -> bool {
        self.bond_type == BondType::Covalent
    }

    pub fn clear_derived(&mut self) {
        self.parity = StereoParity::None;
        self.is_aromatic = false;
        self.canonical_rank = None;
    }
}

impl crate::traits::HasCanonicalRank for Connector {
    fn canonical_rank(&self) -> Option<usize> {
        self.canonical_rank
    }

    fn set_canonical_rank(&mut self, rank: Option<usize>) {
        self.canonical_rank = rank;
    }
}

impl crate::traits::HasParity for Connector {
    fn parity(&self) -> StereoParity {
        self.parity
    }

    fn set_parity(&mut self, parity: StereoParity) {
        self.parity = parity;
    }
}
