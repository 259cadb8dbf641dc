/// Chemical elements up to xenon.
///
/// Heavier elements do not occur in the structures this crate perceives;
/// they can still be represented through pseudo atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
}

use Element::*;

const ALL: [Element; 54] = [
    H, He, Li, Be, B, C, N, O, F, Ne, Na, Mg, Al, Si, P, S, Cl, Ar, K, Ca, Sc, Ti, V, Cr, Mn, Fe,
    Co, Ni, Cu, Zn, Ga, Ge, As, Se, Br, Kr, Rb, Sr, Y, Zr, Nb, Mo, Tc, Ru, Rh, Pd, Ag, Cd, In, Sn,
    Sb, Te, I, Xe,
];

static SYMBOLS: [&str; 54] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe",
];

impl Element {
    pub fn from_atomic_num(n: u8) -> Option<Element> {
        ALL.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        SYMBOLS
            .iter()
            .position(|&sym| sym == s)
            .map(|i| ALL[i])
    }

    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self as usize - 1]
    }

    /// Anything that is neither carbon nor hydrogen.
    pub fn is_hetero(self) -> bool {
        !matches!(self, C | H)
    }

    pub fn period(self) -> u8 {
        match self as u8 {
            1..=2 => 1,
            3..=10 => 2,
            11..=18 => 3,
            19..=36 => 4,
            _ => 5,
        }
    }

    /// Valences used to fill implicit hydrogens, lowest first. Metals and
    /// noble gases never receive implicit hydrogens.
    pub fn default_valences(self) -> &'static [u8] {
        match self {
            H | F | Cl | Br => &[1],
            I => &[1, 3, 5, 7],
            O => &[2],
            S | Se | Te => &[2, 4, 6],
            N | P | As | Sb => &[3, 5],
            B => &[3],
            C | Si | Ge => &[4],
            _ => &[],
        }
    }

    /// Valences of a charged atom, taken from the isoelectronic neighbour in
    /// the same period (N+ behaves like C, B- like C, O- like F). Returns an
    /// empty slice when no such neighbour exists.
    pub fn charged_valences(self, charge: i8) -> &'static [u8] {
        if charge == 0 {
            return self.default_valences();
        }
        if self.default_valences().is_empty() {
            return &[];
        }
        let shifted = self as i16 - charge as i16;
        match u8::try_from(shifted).ok().and_then(Element::from_atomic_num) {
            Some(e) if e.period() == self.period() => e.default_valences(),
            _ => &[],
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
