use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chemstruct::{
    canonicalize, find_all_rings, find_sssr, find_sub_structure, perceive_aromatic_rings,
    AromaticityOptions, BondOrder, SearchOptions, Structure, StructureBuilder,
};

fn benzene_ring(b: &mut StructureBuilder) -> Vec<usize> {
    let atoms: Vec<usize> = (0..6).map(|_| b.add_atom("C").unwrap()).collect();
    for i in 0..6 {
        let order = if i % 2 == 0 { BondOrder::Double } else { BondOrder::Single };
        b.bond(atoms[i], atoms[(i + 1) % 6], order);
    }
    atoms
}

fn benzene() -> Structure {
    let mut b = StructureBuilder::new();
    benzene_ring(&mut b);
    b.build().unwrap()
}

/// `count` phenyl rings joined para to para.
fn polyphenyl(count: usize) -> Structure {
    let mut b = StructureBuilder::new();
    let mut prev: Option<usize> = None;
    for _ in 0..count {
        let ring = benzene_ring(&mut b);
        if let Some(p) = prev {
            b.bond(p, ring[0], BondOrder::Single);
        }
        prev = Some(ring[3]);
    }
    b.build().unwrap()
}

fn porphine() -> Structure {
    let mut b = StructureBuilder::new();
    let mut alphas = Vec::new();
    for _ in 0..4 {
        let atoms: Vec<usize> = ["N", "C", "C", "C", "C"]
            .iter()
            .map(|s| b.add_atom(s).unwrap())
            .collect();
        b.ring(&atoms);
        alphas.push((atoms[1], atoms[4]));
    }
    for k in 0..4 {
        let meso = b.add_atom("C").unwrap();
        b.bond(alphas[k].1, meso, BondOrder::Single);
        b.bond(meso, alphas[(k + 1) % 4].0, BondOrder::Single);
    }
    b.build().unwrap()
}

/// Square grid of `n` by `n` fused four rings.
fn grid(n: usize) -> Structure {
    let mut b = StructureBuilder::new();
    let side = n + 1;
    let atoms: Vec<usize> = (0..side * side).map(|_| b.add_atom("C").unwrap()).collect();
    for r in 0..side {
        for c in 0..side {
            if c + 1 < side {
                b.bond(atoms[r * side + c], atoms[r * side + c + 1], BondOrder::Single);
            }
            if r + 1 < side {
                b.bond(atoms[r * side + c], atoms[(r + 1) * side + c], BondOrder::Single);
            }
        }
    }
    b.build().unwrap()
}

fn bench_rings(c: &mut Criterion) {
    let porphine = porphine();
    let grid = grid(3);
    let chain = polyphenyl(8);

    let mut group = c.benchmark_group("rings");
    group.bench_function("sssr_porphine", |b| b.iter(|| black_box(find_sssr(black_box(&porphine)))));
    group.bench_function("sssr_polyphenyl", |b| b.iter(|| black_box(find_sssr(black_box(&chain)))));
    group.bench_function("all_rings_porphine", |b| {
        b.iter(|| black_box(find_all_rings(black_box(&porphine)).unwrap()))
    });
    group.bench_function("all_rings_grid", |b| {
        b.iter(|| black_box(find_all_rings(black_box(&grid)).unwrap()))
    });
    group.bench_function("aromatic_polyphenyl", |b| {
        b.iter(|| {
            let mut s = chain.clone();
            black_box(perceive_aromatic_rings(&mut s, &AromaticityOptions::default()))
        })
    });
    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    let porphine = porphine();
    let chain = polyphenyl(8);

    let mut group = c.benchmark_group("canonicalize");
    group.bench_function("porphine", |b| {
        b.iter(|| {
            let mut s = porphine.clone();
            canonicalize(&mut s, None).unwrap();
            black_box(s)
        })
    });
    group.bench_function("polyphenyl", |b| {
        b.iter(|| {
            let mut s = chain.clone();
            canonicalize(&mut s, None).unwrap();
            black_box(s)
        })
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let pattern = benzene();
    let target = polyphenyl(8);
    let options = SearchOptions::default();

    let mut group = c.benchmark_group("search");
    group.bench_function("benzene_in_polyphenyl", |b| {
        b.iter(|| black_box(find_sub_structure(black_box(&target), &pattern, &options).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_rings, bench_canonicalize, bench_search);
criterion_main!(benches);
