use grain_mesh::prelude::*;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-6;

/// Unit cube `[grain_x, grain_x + 1] x [0, 1] x [0, 1]` split into `n^3`
/// hexahedra, with shuffled local ids and sub-tolerance coordinate noise.
fn grain_block(grain_x: f64, n: usize, rng: &mut SmallRng) -> MeshFragment {
    let side = n + 1;
    let h = 1.0 / n as f64;
    let jitter = TOL / 10.0;

    let node_offset: u64 = rng.gen_range(1..1000);
    let mut node_ids: Vec<u64> = (0..(side * side * side) as u64)
        .map(|k| k + node_offset)
        .collect();
    node_ids.shuffle(rng);
    let idx = |i: usize, j: usize, k: usize| i + side * (j + side * k);

    let mut f = MeshFragment::new();
    for k in 0..side {
        for j in 0..side {
            for i in 0..side {
                let xyz = [
                    grain_x + i as f64 * h + rng.gen_range(-jitter..=jitter),
                    j as f64 * h + rng.gen_range(-jitter..=jitter),
                    k as f64 * h + rng.gen_range(-jitter..=jitter),
                ];
                let id = NodeId::new(node_ids[idx(i, j, k)]).unwrap();
                f.insert_node(id, xyz).unwrap();
            }
        }
    }

    let elem_offset: u64 = rng.gen_range(1..1000);
    let mut elem_ids: Vec<u64> = (0..(n * n * n) as u64).map(|k| k + elem_offset).collect();
    elem_ids.shuffle(rng);
    let mut e = 0;
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let corners = [
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i + 1, j + 1, k + 1),
                    idx(i, j + 1, k + 1),
                ];
                let verts = corners
                    .iter()
                    .map(|&c| NodeId::new(node_ids[c]).unwrap())
                    .collect();
                f.insert_element(
                    ElementId::new(elem_ids[e]).unwrap(),
                    Element::new(CellType::Hexahedron, verts),
                )
                .unwrap();
                e += 1;
            }
        }
    }
    f
}

/// A row of face-sharing grain blocks.
fn grain_row(grains: usize, n: usize, seed: u64) -> Vec<(GrainId, MeshFragment)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..grains)
        .map(|g| (GrainId(g as u32 + 1), grain_block(g as f64, n, &mut rng)))
        .collect()
}

fn config(locator: LocatorKind) -> AssemblyConfig {
    AssemblyConfig::default()
        .with_tolerance(TOL)
        .with_locator(locator)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn shared_faces_are_welded(n in 1usize..4, grains in 1usize..5, seed in any::<u64>()) {
        let fragments = grain_row(grains, n, seed);
        let mesh = assemble(config(LocatorKind::Grid), fragments).unwrap();

        let side = n + 1;
        prop_assert_eq!(mesh.node_count(), (grains * n + 1) * side * side);
        prop_assert_eq!(mesh.element_count(), grains * n * n * n);
        prop_assert!(mesh.validate_invariants().is_ok());
        prop_assert!(mesh.find_coincident_pairs(TOL).unwrap().is_empty());
    }

    #[test]
    fn grid_and_linear_scan_agree(n in 1usize..3, grains in 1usize..4, seed in any::<u64>()) {
        let fragments = grain_row(grains, n, seed);
        let grid = assemble(config(LocatorKind::Grid), fragments.clone()).unwrap();
        let linear = assemble(config(LocatorKind::LinearScan), fragments).unwrap();
        prop_assert_eq!(grid, linear);
    }

    #[test]
    fn assembly_is_deterministic(n in 1usize..3, grains in 1usize..4, seed in any::<u64>()) {
        let first = assemble(config(LocatorKind::Grid), grain_row(grains, n, seed)).unwrap();
        let second = assemble(config(LocatorKind::Grid), grain_row(grains, n, seed)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ids_are_dense_and_monotonic(n in 1usize..3, grains in 1usize..5, seed in any::<u64>()) {
        let mut asm = MeshAssembler::new(config(LocatorKind::Grid)).unwrap();
        let mut prev_node = 0u64;
        let mut prev_elem = 0u64;
        for (grain, fragment) in grain_row(grains, n, seed) {
            let report = asm.merge(grain, fragment).unwrap();
            if let Some(first) = report.first_node {
                prop_assert_eq!(first.get(), prev_node + 1);
                prev_node += report.nodes_added as u64;
            }
            let first = report.first_element.unwrap();
            prop_assert_eq!(first.get(), prev_elem + 1);
            prev_elem += report.elements_added as u64;
        }
        let mesh = asm.into_mesh();
        let node_ids: Vec<u64> = mesh.nodes().map(|(id, _)| id.get()).collect();
        prop_assert_eq!(node_ids, (1..=prev_node).collect::<Vec<_>>());
        let elem_ids: Vec<u64> = mesh.elements().map(|(id, _)| id.get()).collect();
        prop_assert_eq!(elem_ids, (1..=prev_elem).collect::<Vec<_>>());
        for record in mesh.grains() {
            prop_assert_eq!(record.elements_added as usize, n * n * n);
        }
    }

    #[test]
    fn disjoint_fragments_only_reference_new_nodes(n in 1usize..3, seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut asm = MeshAssembler::new(config(LocatorKind::Grid)).unwrap();
        asm.merge(GrainId(1), grain_block(0.0, n, &mut rng)).unwrap();

        let far = grain_block(10.0, n, &mut rng);
        let far_nodes = far.node_count();
        let before = asm.mesh().node_count();
        let report = asm.merge(GrainId(2), far).unwrap();

        prop_assert_eq!(report.nodes_matched, 0);
        prop_assert_eq!(asm.mesh().node_count(), before + far_nodes);
        let first_new = report.first_node.unwrap();
        for eid in asm.mesh().elements_of_grain(GrainId(2)) {
            let elem = asm.mesh().element(eid).unwrap();
            prop_assert!(elem.vertices.iter().all(|v| *v >= first_new));
        }
    }
}

#[test]
fn fully_coincident_fragment_adds_only_elements() {
    let mut rng = SmallRng::seed_from_u64(7);
    let block = grain_block(0.0, 2, &mut rng);
    let mut asm = MeshAssembler::new(config(LocatorKind::Grid)).unwrap();
    asm.merge(GrainId(1), block.clone()).unwrap();
    let nodes = asm.mesh().node_count();
    let elements = asm.mesh().element_count();

    let report = asm.merge(GrainId(2), block.clone()).unwrap();
    assert_eq!(report.nodes_added, 0, "coincident nodes must reuse global ids");
    assert_eq!(asm.mesh().node_count(), nodes);
    assert_eq!(asm.mesh().element_count(), elements + block.element_count());
}

#[test]
fn two_quads_share_one_corner() {
    let node = |raw| NodeId::new(raw).unwrap();
    let mut a = MeshFragment::new();
    for (id, xyz) in [
        (1, [0.0, 0.0, 0.0]),
        (2, [1.0, 0.0, 0.0]),
        (3, [1.0, 1.0, 0.0]),
        (4, [0.0, 1.0, 0.0]),
    ] {
        a.insert_node(node(id), xyz).unwrap();
    }
    a.insert_element(
        ElementId::new(1).unwrap(),
        Element::new(CellType::Quadrilateral, vec![node(1), node(2), node(3), node(4)]),
    )
    .unwrap();

    let mut b = MeshFragment::new();
    for (id, xyz) in [
        (10, [1.0, 0.0, 0.0]),
        (11, [2.0, 0.0, 0.0]),
        (12, [2.0, 1.0, 0.0]),
        (13, [1.0, 1.0, 1.0]),
    ] {
        b.insert_node(node(id), xyz).unwrap();
    }
    b.insert_element(
        ElementId::new(5).unwrap(),
        Element::new(CellType::Quadrilateral, vec![node(10), node(11), node(12), node(13)]),
    )
    .unwrap();

    let mesh = assemble(
        AssemblyConfig::default(),
        vec![(GrainId(1), a), (GrainId(2), b)],
    )
    .unwrap();
    assert_eq!(mesh.node_count(), 7);
    assert_eq!(mesh.element_count(), 2);
    let second = mesh.element(ElementId::new(2).unwrap()).unwrap();
    assert_eq!(second.vertices[0], node(2));
    assert_eq!(&second.vertices[1..], &[node(5), node(6), node(7)]);
}
