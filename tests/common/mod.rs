#![allow(dead_code)]

use chemstruct::{BondOrder, BondStereo, Structure, StructureBuilder};

use BondOrder::{Double as D, Single as S};

/// Ring of `symbols` closed with `orders[i]` between atom `i` and `i + 1`.
pub fn ring_of(b: &mut StructureBuilder, symbols: &[&str], orders: &[BondOrder]) -> Vec<usize> {
    let atoms: Vec<usize> = symbols.iter().map(|s| b.add_atom(s).unwrap()).collect();
    for i in 0..atoms.len() {
        b.bond(atoms[i], atoms[(i + 1) % atoms.len()], orders[i]);
    }
    atoms
}

/// Regular hexagon of unit edge centred on the origin, first atom at the
/// top right.
pub fn hexagon(b: &mut StructureBuilder) -> Vec<usize> {
    let coords = [
        (0.866, 0.5),
        (0.866, -0.5),
        (0.0, -1.0),
        (-0.866, -0.5),
        (-0.866, 0.5),
        (0.0, 1.0),
    ];
    coords
        .iter()
        .map(|&(x, y)| b.add_atom_at("C", x, y).unwrap())
        .collect()
}

pub fn benzene() -> Structure {
    let mut b = StructureBuilder::new();
    ring_of(&mut b, &["C"; 6], &[D, S, D, S, D, S]);
    b.build().unwrap()
}

pub fn cyclohexane() -> Structure {
    let mut b = StructureBuilder::new();
    ring_of(&mut b, &["C"; 6], &[S; 6]);
    b.build().unwrap()
}

pub fn furan() -> Structure {
    let mut b = StructureBuilder::new();
    ring_of(&mut b, &["O", "C", "C", "C", "C"], &[S, D, S, D, S]);
    b.build().unwrap()
}

/// para-benzoquinone.
pub fn quinone() -> Structure {
    let mut b = StructureBuilder::new();
    let ring = ring_of(&mut b, &["C"; 6], &[S, D, S, S, D, S]);
    for &i in &[ring[0], ring[3]] {
        let o = b.add_atom("O").unwrap();
        b.bond(i, o, D);
    }
    b.build().unwrap()
}

/// pyridin-2(1H)-one.
pub fn pyridinone() -> Structure {
    let mut b = StructureBuilder::new();
    let ring = ring_of(&mut b, &["N", "C", "C", "C", "C", "C"], &[S, S, D, S, D, S]);
    let o = b.add_atom("O").unwrap();
    b.bond(ring[1], o, D);
    b.build().unwrap()
}

/// 2-oxopyridin-1-ide.
pub fn oxypyridinide() -> Structure {
    let mut b = StructureBuilder::new();
    let ring = ring_of(&mut b, &["N", "C", "C", "C", "C", "C"], &[S, S, D, S, D, S]);
    b.node_mut(ring[0]).unwrap().charge = -1;
    let o = b.add_atom("O").unwrap();
    b.bond(ring[1], o, D);
    b.build().unwrap()
}

/// Porphine skeleton: four pyrrole rings joined by four methine bridges.
/// Only the ring topology matters here, so every bond is single.
pub fn porphine() -> Structure {
    let mut b = StructureBuilder::new();
    let mut alphas = Vec::new();
    for _ in 0..4 {
        let ring = ring_of(&mut b, &["N", "C", "C", "C", "C"], &[S; 5]);
        alphas.push((ring[1], ring[4]));
    }
    for k in 0..4 {
        let meso = b.add_atom("C").unwrap();
        b.bond(alphas[k].1, meso, S);
        b.bond(meso, alphas[(k + 1) % 4].0, S);
    }
    b.build().unwrap()
}

/// Azulene: a five and a seven membered ring sharing one bond.
pub fn azulene() -> Structure {
    let mut b = StructureBuilder::new();
    let a: Vec<usize> = (0..10).map(|_| b.add_atom("C").unwrap()).collect();
    for (x, y, order) in [
        (0, 1, D),
        (1, 2, S),
        (2, 3, D),
        (3, 4, S),
        (4, 0, S),
        (4, 5, D),
        (5, 6, S),
        (6, 7, D),
        (7, 8, S),
        (8, 9, D),
        (9, 0, S),
    ] {
        b.bond(a[x], a[y], order);
    }
    b.build().unwrap()
}

/// alpha-Pinene: bicyclo[3.1.1]hept-2-ene with three methyl groups.
pub fn alpha_pinene() -> Structure {
    let mut b = StructureBuilder::new();
    let c: Vec<usize> = (0..10).map(|_| b.add_atom("C").unwrap()).collect();
    for (x, y, order) in [
        (0, 1, S),
        (1, 2, D),
        (2, 3, S),
        (3, 4, S),
        (4, 5, S),
        (5, 0, S),
        (0, 6, S),
        (6, 4, S),
        (1, 7, S),
        (6, 8, S),
        (6, 9, S),
    ] {
        b.bond(c[x], c[y], order);
    }
    b.build().unwrap()
}

/// Kekulé benzene with a two-carbon bridge from atom 0 to atom 3: three
/// six rings, any two of which form a smallest set.
pub fn bridged_benzene() -> Structure {
    let mut b = StructureBuilder::new();
    let ring = ring_of(&mut b, &["C"; 6], &[D, S, D, S, D, S]);
    let c6 = b.add_atom("C").unwrap();
    let c7 = b.add_atom("C").unwrap();
    b.bond(ring[0], c6, S);
    b.bond(c6, c7, S);
    b.bond(c7, ring[3], S);
    b.build().unwrap()
}

/// but-2-ene drawn in the plane; `cis` puts both methyls above the axis.
pub fn butene(cis: bool) -> Structure {
    let mut b = StructureBuilder::new();
    let c1 = b.add_atom_at("C", -0.5, 0.866).unwrap();
    let c2 = b.add_atom_at("C", 0.0, 0.0).unwrap();
    let c3 = b.add_atom_at("C", 1.0, 0.0).unwrap();
    let c4 = b.add_atom_at("C", 1.5, if cis { 0.866 } else { -0.866 }).unwrap();
    b.bond(c1, c2, S);
    b.bond(c2, c3, D);
    b.bond(c3, c4, S);
    b.build().unwrap()
}

/// hexa-2,4-diene on a zigzag backbone; each flag makes the terminal
/// methyl of that double bond cis to the backbone.
pub fn hexadiene(first_cis: bool, second_cis: bool) -> Structure {
    let mut b = StructureBuilder::new();
    let c1 = if first_cis {
        b.add_atom_at("C", 0.0, -1.0)
    } else {
        b.add_atom_at("C", -0.866, 0.5)
    }
    .unwrap();
    let c2 = b.add_atom_at("C", 0.0, 0.0).unwrap();
    let c3 = b.add_atom_at("C", 0.866, 0.5).unwrap();
    let c4 = b.add_atom_at("C", 1.732, 0.0).unwrap();
    let c5 = b.add_atom_at("C", 2.598, 0.5).unwrap();
    let c6 = if second_cis {
        b.add_atom_at("C", 2.598, 1.5)
    } else {
        b.add_atom_at("C", 3.464, 0.0)
    }
    .unwrap();
    b.bond(c1, c2, S);
    b.bond(c2, c3, D);
    b.bond(c3, c4, S);
    b.bond(c4, c5, D);
    b.bond(c5, c6, S);
    b.build().unwrap()
}

/// Benzene ring with a chain of atoms on ring atom 0. Returns the
/// builder and the first chain atom.
fn benzene_with(chain: &[&str]) -> (StructureBuilder, usize) {
    let mut b = StructureBuilder::new();
    let ring = ring_of(&mut b, &["C"; 6], &[D, S, D, S, D, S]);
    let mut prev = ring[0];
    let mut first = None;
    for symbol in chain {
        let next = b.add_atom(symbol).unwrap();
        b.bond(prev, next, S);
        first.get_or_insert(next);
        prev = next;
    }
    (b, first.unwrap())
}

pub fn benzyl_bromide() -> Structure {
    benzene_with(&["C", "Br"]).0.build().unwrap()
}

pub fn isopropyl_benzene() -> Structure {
    let (mut b, ch) = benzene_with(&["C"]);
    for _ in 0..2 {
        let me = b.add_atom("C").unwrap();
        b.bond(ch, me, S);
    }
    b.build().unwrap()
}

/// 1,2-disubstituted cyclohexane with one wedge per substituent. Each
/// substituent is a chain of `chain_len` carbons.
pub fn disubstituted_cyclohexane(chain_len: usize, first: BondStereo, second: BondStereo) -> Structure {
    let mut b = StructureBuilder::new();
    let ring = hexagon(&mut b);
    b.ring(&ring);
    for (k, (stereo, dy)) in [(first, 1.0), (second, -1.0)].into_iter().enumerate() {
        let at = ring[k];
        let x0 = 1.732;
        let y0 = if dy > 0.0 { 1.0 } else { -1.0 };
        let mut prev = b.add_atom_at("C", x0, y0).unwrap();
        b.wedge(at, prev, stereo);
        for step in 1..chain_len {
            let next = b.add_atom_at("C", x0 + step as f64 * 0.866, y0 + dy * 0.5 * (step % 2) as f64).unwrap();
            b.bond(prev, next, S);
            prev = next;
        }
    }
    b.build().unwrap()
}

pub fn cis_dimethyl_cyclohexane() -> Structure {
    disubstituted_cyclohexane(1, BondStereo::Up, BondStereo::Up)
}

pub fn cis_diethyl_cyclohexane() -> Structure {
    disubstituted_cyclohexane(2, BondStereo::Up, BondStereo::Up)
}

pub fn trans_diethyl_cyclohexanes() -> [Structure; 2] {
    [
        disubstituted_cyclohexane(2, BondStereo::Up, BondStereo::Down),
        disubstituted_cyclohexane(2, BondStereo::Down, BondStereo::Up),
    ]
}
