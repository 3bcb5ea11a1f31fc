//! Deforming mesh collision demo
//!
//! Builds bounding volume trees over a sphere mesh and a grid mesh, one
//! with axis-aligned boxes and one with oriented boxes. Each frame jitters
//! the vertices, refits both trees, moves the grid through the sphere and
//! reports the leaf pairs whose boxes touch. The hierarchical result is
//! checked against an exhaustive leaf-pair test every frame.
//!
//! Usage: `bvtree_demo [config.toml|config.ron]`

use std::collections::BTreeSet;

use bvtree::collision::is_disjoint;
use bvtree::foundation::math::{relative_transform, rigid, Point3, Rotation, Vec3};
use bvtree::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Sphere tessellation
const RINGS: usize = 12;
const SEGMENTS: usize = 24;
const RADIUS: f64 = 1.0;

// Simulation settings
const FRAMES: usize = 20;
const JITTER: f64 = 0.01;
const GRID_CELLS: usize = 16;
const GRID_SIZE: f64 = 3.0;

/// Vertex and face lists of a triangle mesh
struct TriangleMesh {
    vertices: Vec<Point3>,
    faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Latitude/longitude sphere with poles at +/- z
    fn sphere(radius: f64) -> Self {
        let mut vertices = vec![Point3::new(0.0, 0.0, radius)];
        for ring in 1..RINGS {
            let theta = std::f64::consts::PI * ring as f64 / RINGS as f64;
            for seg in 0..SEGMENTS {
                let phi = std::f64::consts::TAU * seg as f64 / SEGMENTS as f64;
                vertices.push(Point3::new(
                    radius * theta.sin() * phi.cos(),
                    radius * theta.sin() * phi.sin(),
                    radius * theta.cos(),
                ));
            }
        }
        vertices.push(Point3::new(0.0, 0.0, -radius));
        let south = vertices.len() - 1;

        let ring_start = |ring: usize| 1 + (ring - 1) * SEGMENTS;
        let mut faces = Vec::new();
        for seg in 0..SEGMENTS {
            let next = (seg + 1) % SEGMENTS;
            faces.push([0, ring_start(1) + seg, ring_start(1) + next]);
            let last = ring_start(RINGS - 1);
            faces.push([south, last + next, last + seg]);
        }
        for ring in 1..RINGS - 1 {
            let (a, b) = (ring_start(ring), ring_start(ring + 1));
            for seg in 0..SEGMENTS {
                let next = (seg + 1) % SEGMENTS;
                faces.push([a + seg, b + seg, b + next]);
                faces.push([a + seg, b + next, a + next]);
            }
        }
        Self { vertices, faces }
    }

    /// Square grid in the xy plane centered on the origin
    fn grid(cells: usize, size: f64) -> Self {
        let step = size / cells as f64;
        let half = size * 0.5;
        let mut vertices = Vec::with_capacity((cells + 1) * (cells + 1));
        for j in 0..=cells {
            for i in 0..=cells {
                vertices.push(Point3::new(i as f64 * step - half, j as f64 * step - half, 0.0));
            }
        }
        let at = |i: usize, j: usize| j * (cells + 1) + i;
        let mut faces = Vec::with_capacity(2 * cells * cells);
        for j in 0..cells {
            for i in 0..cells {
                faces.push([at(i, j), at(i + 1, j), at(i + 1, j + 1)]);
                faces.push([at(i, j), at(i + 1, j + 1), at(i, j + 1)]);
            }
        }
        Self { vertices, faces }
    }

    fn elements(&self) -> Vec<MeshFace<'_>> {
        self.faces.iter().map(|&f| MeshFace::new(&self.vertices, f)).collect()
    }

    fn jitter(&mut self, rng: &mut StdRng) {
        for v in &mut self.vertices {
            *v += Vec3::new(
                rng.gen_range(-JITTER..JITTER),
                rng.gen_range(-JITTER..JITTER),
                rng.gen_range(-JITTER..JITTER),
            );
        }
    }
}

/// Leaf pairs of two trees whose boxes are not disjoint, by testing every pair
fn exhaustive_pairs(a: &BoundingVolumeTree, b: &BoundingVolumeTree) -> BTreeSet<(NodeId, NodeId)> {
    let x21 = relative_transform(a.bvh_to_world(), b.bvh_to_world());
    let mut pairs = BTreeSet::new();
    for &l1 in a.leaf_nodes() {
        for &l2 in b.leaf_nodes() {
            if let (Some(n1), Some(n2)) = (a.node(l1), b.node(l2)) {
                if !is_disjoint(n1.volume(), n2.volume(), &x21) {
                    pairs.insert((l1, l2));
                }
            }
        }
    }
    pairs
}

fn load_config() -> Result<TreeConfig, Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading tree configuration from {path}");
            TreeConfig::load_from_file(&path)?
        }
        None => TreeConfig::new(VolumeKind::Aabb).with_margin(0.005),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    bvtree::foundation::logging::init_with_level(log::LevelFilter::Info);

    let config = load_config()?;
    log::info!("Tree configuration: {config:?}");

    let mut rng = StdRng::seed_from_u64(7);
    let mut mesh1 = TriangleMesh::sphere(RADIUS);
    let mut mesh2 = TriangleMesh::grid(GRID_CELLS, GRID_SIZE);

    let other_kind = match config.kind {
        VolumeKind::Aabb => VolumeKind::Obb,
        VolumeKind::Obb => VolumeKind::Aabb,
    };
    let mut tree1 = BoundingVolumeTree::from_elements(&mesh1.elements(), config)?;
    let mut tree2 = BoundingVolumeTree::from_elements(&mesh2.elements(), config.with_kind(other_kind))?;
    for (name, tree) in [("sphere", &tree1), ("grid", &tree2)] {
        log::info!(
            "Built {name} tree ({:?}): {} faces, {} nodes, depth {}, root radius {:.3}",
            tree.kind(),
            tree.num_elements(),
            tree.num_nodes(),
            tree.max_depth(),
            tree.radius()
        );
    }

    for frame in 0..FRAMES {
        mesh1.jitter(&mut rng);
        mesh2.jitter(&mut rng);
        tree2.set_bvh_to_world(rigid(
            Rotation::from_euler_angles(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
            ),
            Vec3::new(0.0, 0.0, rng.gen_range(-RADIUS..RADIUS)),
        ));
        tree1.update(&mesh1.elements())?;
        tree2.update(&mesh2.elements())?;
        tree1.validate(&mesh1.elements())?;
        tree2.validate(&mesh2.elements())?;

        let pairs: BTreeSet<_> = tree1.intersect_tree_world(&tree2).into_iter().collect();
        let expected = exhaustive_pairs(&tree1, &tree2);
        if pairs != expected {
            log::error!(
                "Frame {frame}: hierarchy found {} pairs, exhaustive search {}",
                pairs.len(),
                expected.len()
            );
            return Err(format!("leaf pair mismatch at frame {frame}").into());
        }

        let faces: BTreeSet<usize> = pairs
            .iter()
            .flat_map(|&(l1, _)| tree1.leaf_elements(l1).iter().copied())
            .collect();
        log::info!(
            "Frame {frame}: {} leaf pairs, {} candidate sphere faces, root radius {:.3}",
            pairs.len(),
            faces.len(),
            tree1.radius()
        );
    }

    log::debug!("Final grid hierarchy:\n{tree2}");
    Ok(())
}
