//! Oriented box fitting
//!
//! The box orientation comes from the principal axes of a second moment
//! matrix; the extents are then the tight bounds of every element point in
//! that frame. Three moment sources are supported, see [`FitMethod`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::obb::OrientedBox;
use crate::error::BvhError;
use crate::foundation::math::{
    rigid, rotation_from_z_direction, Mat3, Point3, Rotation, SymmetricEigen, Vec3,
};
use crate::geometry::hull::convex_hull;
use crate::geometry::primitives::triangle_moment;
use crate::geometry::Boundable;

/// Principal variances closer than this fraction of the largest are
/// treated as equal.
const DEGENERACY_TOLERANCE: f64 = 1e-6;

/// How an oriented box picks its axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FitMethod {
    /// Surface covariance of the convex hull of the element points
    #[default]
    ConvexHull,
    /// Sum of the elements' own length or area weighted moments
    Covariance,
    /// Covariance of the distinct element points
    Points,
}

/// Fit an oriented box around `elements`, padded by `margin`.
///
/// Falls back to [`FitMethod::Points`] when the requested moment is
/// degenerate (a flat hull, zero total area).
pub fn fit_oriented_box<I>(elements: I, margin: f64, method: FitMethod) -> Result<OrientedBox, BvhError>
where
    I: IntoIterator,
    I::Item: Boundable,
{
    let elements: Vec<I::Item> = elements.into_iter().collect();
    if elements.is_empty() {
        return Err(BvhError::NoElements);
    }
    if elements.iter().any(|e| e.num_points() == 0) {
        return Err(BvhError::EmptyElement);
    }

    let points = distinct_points(&elements);
    let rotation = match method {
        FitMethod::Points => None,
        FitMethod::Covariance => element_moment(&elements).map(|c| principal_rotation(&c)),
        FitMethod::ConvexHull => hull_moment(&points).map(|c| principal_rotation(&c)),
    }
    .unwrap_or_else(|| principal_rotation(&point_moment(&points)));

    Ok(bound_points(&points, rotation, margin))
}

/// Element points with exact duplicates removed, in first-seen order
fn distinct_points<B: Boundable>(elements: &[B]) -> Vec<Point3> {
    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for e in elements {
        for i in 0..e.num_points() {
            let p = e.point(i);
            if seen.insert([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]) {
                points.push(p);
            }
        }
    }
    points
}

fn mean(points: &[Point3]) -> Vec3 {
    points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / points.len() as f64
}

/// Covariance of the points about their mean
fn point_moment(points: &[Point3]) -> Mat3 {
    let cent = mean(points);
    let mut c = Mat3::zeros();
    for p in points {
        let d = p.coords - cent;
        c += d * d.transpose();
    }
    c / points.len() as f64
}

/// Weighted covariance from the elements' own moments, or `None` when the
/// total weight vanishes
fn element_moment<B: Boundable>(elements: &[B]) -> Option<Mat3> {
    let mut total = 0.0;
    let mut cent = Vec3::zeros();
    let mut c = Mat3::zeros();
    for e in elements {
        let (w, m) = e.covariance();
        total += w;
        cent += e.centroid().coords * w;
        c += m;
    }
    if !(total > 0.0 && total.is_finite()) {
        return None;
    }
    cent /= total;
    Some(c / total - cent * cent.transpose())
}

/// Area-weighted covariance of the convex hull surface, computed about the
/// point mean to limit cancellation
fn hull_moment(points: &[Point3]) -> Option<Mat3> {
    let faces = convex_hull(points)?;
    let origin = mean(points);
    let local: Vec<Point3> = points.iter().map(|p| Point3::from(p.coords - origin)).collect();

    let mut total = 0.0;
    let mut cent = Vec3::zeros();
    let mut c = Mat3::zeros();
    for [a, b, d] in faces {
        let (area, m) = triangle_moment(&local[a], &local[b], &local[d]);
        total += area;
        cent += (local[a].coords + local[b].coords + local[d].coords) * (area / 3.0);
        c += m;
    }
    if !(total > 0.0 && total.is_finite()) {
        return None;
    }
    cent /= total;
    Some(c / total - cent * cent.transpose())
}

/// Right-handed principal frame of a symmetric moment matrix.
///
/// Axes are ordered by decreasing variance. When two variances coincide
/// only the distinct axis is meaningful and becomes the frame's z axis;
/// when all three coincide the identity is returned.
pub fn principal_rotation(cov: &Mat3) -> Rotation {
    if !cov.iter().all(|v| v.is_finite()) {
        return Rotation::identity();
    }
    let eig = SymmetricEigen::new(*cov);
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
    let vals = order.map(|i| eig.eigenvalues[i]);
    if vals[0] <= 0.0 {
        return Rotation::identity();
    }

    let mut u = Mat3::from_columns(&order.map(|i| eig.eigenvectors.column(i).into_owned()));
    if u.determinant() < 0.0 {
        let flipped = -u.column(2).into_owned();
        u.set_column(2, &flipped);
    }

    let tol = vals[0] * DEGENERACY_TOLERANCE;
    let first_pair_equal = vals[0] - vals[1] <= tol;
    let second_pair_equal = vals[1] - vals[2] <= tol;
    match (first_pair_equal, second_pair_equal) {
        (true, true) => Rotation::identity(),
        (true, false) => rotation_from_z_direction(&u.column(2).into_owned()),
        (false, true) => rotation_from_z_direction(&u.column(0).into_owned()),
        (false, false) => Rotation::from_matrix_unchecked(u),
    }
}

/// Tight box around `points` in the frame `rotation`, padded by `margin`
fn bound_points(points: &[Point3], rotation: Rotation, margin: f64) -> OrientedBox {
    let cent = mean(points);
    let mut lo = Vec3::repeat(f64::INFINITY);
    let mut hi = Vec3::repeat(f64::NEG_INFINITY);
    for p in points {
        let local = rotation.inverse_transform_vector(&(p.coords - cent));
        lo = lo.inf(&local);
        hi = hi.sup(&local);
    }
    let center = cent + rotation * ((lo + hi) * 0.5);
    let half_widths = (hi - lo) * 0.5 + Vec3::repeat(margin);
    OrientedBox::new(rigid(rotation, center), half_widths)
}
