//! Incremental 3D convex hull
//!
//! Used to weight oriented box fitting by surface area rather than by
//! vertex density. Only the triangulated boundary is produced; no
//! adjacency is kept.

use std::collections::HashSet;

use crate::foundation::math::{update_bounds, Point3, Vec3};

/// Relative tolerance for visibility and degeneracy tests
const HULL_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
struct Face {
    v: [usize; 3],
    normal: Vec3,
    offset: f64,
}

impl Face {
    fn new(points: &[Point3], a: usize, b: usize, c: usize) -> Self {
        let n = (points[b] - points[a]).cross(&(points[c] - points[a]));
        let normal = n.try_normalize(0.0).unwrap_or_else(Vec3::zeros);
        Self {
            v: [a, b, c],
            normal,
            offset: normal.dot(&points[a].coords),
        }
    }

    /// Face with its normal pointing away from `interior`
    fn oriented(points: &[Point3], a: usize, b: usize, c: usize, interior: &Point3) -> Self {
        let face = Self::new(points, a, b, c);
        if face.signed_distance(interior) > 0.0 {
            Self::new(points, a, c, b)
        } else {
            face
        }
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

/// Triangulated convex hull of `points`, as index triples with outward
/// counter-clockwise winding.
///
/// Returns `None` when fewer than four points are given or the points are
/// coplanar to within tolerance.
pub fn convex_hull(points: &[Point3]) -> Option<Vec<[usize; 3]>> {
    if points.len() < 4 {
        return None;
    }

    let mut lo = points[0];
    let mut hi = points[0];
    for p in points {
        update_bounds(p, &mut lo, &mut hi);
    }
    let scale = (hi - lo).norm();
    if !(scale > 0.0 && scale.is_finite()) {
        return None;
    }
    let eps = scale * HULL_TOLERANCE;

    let simplex = initial_simplex(points, eps)?;
    let interior = Point3::from(
        simplex.iter().fold(Vec3::zeros(), |acc, &i| acc + points[i].coords) / 4.0,
    );
    let [i0, i1, i2, i3] = simplex;
    let mut faces = vec![
        Face::oriented(points, i0, i1, i2, &interior),
        Face::oriented(points, i0, i1, i3, &interior),
        Face::oriented(points, i0, i2, i3, &interior),
        Face::oriented(points, i1, i2, i3, &interior),
    ];

    for (idx, p) in points.iter().enumerate() {
        if simplex.contains(&idx) {
            continue;
        }
        let visible: Vec<bool> = faces.iter().map(|f| f.signed_distance(p) > eps).collect();
        if !visible.contains(&true) {
            continue;
        }

        let edges: HashSet<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|(_, &v)| v)
            .flat_map(|(f, _)| f.edges())
            .collect();
        let horizon: Vec<(usize, usize)> = edges
            .iter()
            .filter(|(a, b)| !edges.contains(&(*b, *a)))
            .copied()
            .collect();

        let mut keep = visible.iter().map(|v| !v);
        faces.retain(|_| keep.next().unwrap_or(true));
        for (a, b) in horizon {
            faces.push(Face::new(points, a, b, idx));
        }
    }

    Some(faces.iter().map(|f| f.v).collect())
}

/// Four affinely independent points spanning the set, or `None`
fn initial_simplex(points: &[Point3], eps: f64) -> Option<[usize; 4]> {
    let argmax = |score: &dyn Fn(&Point3) -> f64| -> (usize, f64) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, score(p)))
            .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
    };

    let (i0, _) = argmax(&|p: &Point3| -p.x);
    let p0 = points[i0];
    let (i1, d1) = argmax(&|p: &Point3| (p - p0).norm());
    if d1 <= eps {
        return None;
    }
    let axis = (points[i1] - p0) / d1;
    let (i2, d2) = argmax(&|p: &Point3| axis.cross(&(p - p0)).norm());
    if d2 <= eps {
        return None;
    }
    let normal = axis.cross(&(points[i2] - p0)).normalize();
    let (i3, d3) = argmax(&|p: &Point3| normal.dot(&(p - p0)).abs());
    if d3 <= eps {
        return None;
    }
    Some([i0, i1, i2, i3])
}
