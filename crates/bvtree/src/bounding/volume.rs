//! The bounding shape contract and the closed set of node volumes

use serde::{Deserialize, Serialize};

use super::aabb::AxisAlignedBox;
use super::obb::OrientedBox;
use crate::foundation::math::{Point3, RigidTransform, Vec3};
use crate::geometry::Boundable;

/// Box type used by a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VolumeKind {
    /// Axis-aligned boxes
    #[default]
    Aabb,
    /// Oriented boxes
    Obb,
}

/// Geometric queries and growth operations every node volume supports.
///
/// All inputs are expressed in the tree's base frame. Containment and
/// intersection tests are inclusive of the boundary.
pub trait BoundingShape {
    /// Whether `p` lies inside or on the boundary
    fn contains_point(&self, p: &Point3) -> bool;

    /// Conservative sphere test: the box grown by `radius` contains `center`
    fn intersects_sphere(&self, center: &Point3, radius: f64) -> bool;

    /// Whether the plane `normal . x = offset` touches the box
    fn intersects_plane(&self, normal: &Vec3, offset: f64) -> bool;

    /// Parameter interval `[t0, t1]` of `origin + t * dir` inside the box,
    /// clipped to `[min, max]`
    fn intersects_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> Option<(f64, f64)>;

    /// Whether the segment `[p1, p2]` touches the box
    fn intersects_line_segment(&self, p1: &Point3, p2: &Point3) -> bool;

    /// Euclidean distance from `p` to the box; zero inside
    fn distance_to_point(&self, p: &Point3) -> f64;

    /// Smallest `|t|` of `origin + t * dir` inside the box with `t` in
    /// `[min, max]`; infinity on a miss
    fn distance_along_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> f64;

    /// Whether every point of every element lies inside the box shrunk by
    /// `tol`
    fn is_contained<I>(&self, elements: I, tol: f64) -> bool
    where
        I: IntoIterator,
        I::Item: Boundable;

    /// Grow (never shrink) to contain `p` padded by `margin`; returns
    /// whether the box changed
    fn update_for_point(&mut self, p: &Point3, margin: f64) -> bool;

    /// Grow to contain every point of `element`
    fn update_for<B: Boundable + ?Sized>(&mut self, element: &B, margin: f64) -> bool {
        let mut modified = false;
        for i in 0..element.num_points() {
            modified |= self.update_for_point(&element.point(i), margin);
        }
        modified
    }

    /// Scale the half-widths by `s` about the center
    fn scale(&mut self, s: f64);

    /// Box center
    fn center(&self) -> Point3;

    /// Distance from the center to a corner
    fn radius(&self) -> f64 {
        self.half_widths().norm()
    }

    /// Half-widths along the box axes
    fn half_widths(&self) -> Vec3;

    /// Pose of the box frame in the base frame
    fn node_to_base(&self) -> RigidTransform;

    /// Fold the box corners into `[min, max]`
    fn update_bounds(&self, min: &mut Point3, max: &mut Point3);
}

/// Node volume: one of the two supported box types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Axis-aligned box
    Aabb(AxisAlignedBox),
    /// Oriented box
    Obb(OrientedBox),
}

impl BoundingVolume {
    /// Empty volume of the requested kind
    pub fn empty(kind: VolumeKind) -> Self {
        match kind {
            VolumeKind::Aabb => Self::Aabb(AxisAlignedBox::empty()),
            VolumeKind::Obb => Self::Obb(OrientedBox::empty()),
        }
    }

    /// Box type of this volume
    pub const fn kind(&self) -> VolumeKind {
        match self {
            Self::Aabb(_) => VolumeKind::Aabb,
            Self::Obb(_) => VolumeKind::Obb,
        }
    }

    /// The axis-aligned box, if this is one
    pub const fn as_aabb(&self) -> Option<&AxisAlignedBox> {
        match self {
            Self::Aabb(b) => Some(b),
            Self::Obb(_) => None,
        }
    }

    /// The oriented box, if this is one
    pub const fn as_obb(&self) -> Option<&OrientedBox> {
        match self {
            Self::Obb(b) => Some(b),
            Self::Aabb(_) => None,
        }
    }

    /// Whether the volume encloses nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Aabb(b) => b.is_empty(),
            Self::Obb(b) => b.is_empty(),
        }
    }

    /// Reset to the empty box of the same kind
    pub fn clear(&mut self) {
        *self = Self::empty(self.kind());
    }

    /// Grow to contain another volume's corners padded by `margin`
    pub fn update_for_volume(&mut self, other: &Self, margin: f64) -> bool {
        match (self, other) {
            (Self::Aabb(a), Self::Aabb(b)) => a.update_for_aabb(b, margin),
            (this, other) => {
                let mut modified = false;
                for corner in other.corners() {
                    modified |= this.update_for_point(&corner, margin);
                }
                modified
            }
        }
    }

    /// The eight corners in the base frame
    pub fn corners(&self) -> [Point3; 8] {
        match self {
            Self::Aabb(b) => b.corners(),
            Self::Obb(b) => b.corners(),
        }
    }
}

impl From<AxisAlignedBox> for BoundingVolume {
    fn from(b: AxisAlignedBox) -> Self {
        Self::Aabb(b)
    }
}

impl From<OrientedBox> for BoundingVolume {
    fn from(b: OrientedBox) -> Self {
        Self::Obb(b)
    }
}

macro_rules! dispatch {
    ($self:expr, $b:ident => $body:expr) => {
        match $self {
            BoundingVolume::Aabb($b) => $body,
            BoundingVolume::Obb($b) => $body,
        }
    };
}

impl BoundingShape for BoundingVolume {
    fn contains_point(&self, p: &Point3) -> bool {
        dispatch!(self, b => b.contains_point(p))
    }

    fn intersects_sphere(&self, center: &Point3, radius: f64) -> bool {
        dispatch!(self, b => b.intersects_sphere(center, radius))
    }

    fn intersects_plane(&self, normal: &Vec3, offset: f64) -> bool {
        dispatch!(self, b => b.intersects_plane(normal, offset))
    }

    fn intersects_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> Option<(f64, f64)> {
        dispatch!(self, b => b.intersects_line(origin, dir, min, max))
    }

    fn intersects_line_segment(&self, p1: &Point3, p2: &Point3) -> bool {
        dispatch!(self, b => b.intersects_line_segment(p1, p2))
    }

    fn distance_to_point(&self, p: &Point3) -> f64 {
        dispatch!(self, b => b.distance_to_point(p))
    }

    fn distance_along_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> f64 {
        dispatch!(self, b => b.distance_along_line(origin, dir, min, max))
    }

    fn is_contained<I>(&self, elements: I, tol: f64) -> bool
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        dispatch!(self, b => b.is_contained(elements, tol))
    }

    fn update_for_point(&mut self, p: &Point3, margin: f64) -> bool {
        dispatch!(self, b => b.update_for_point(p, margin))
    }

    fn scale(&mut self, s: f64) {
        dispatch!(self, b => b.scale(s));
    }

    fn center(&self) -> Point3 {
        dispatch!(self, b => b.center())
    }

    fn radius(&self) -> f64 {
        dispatch!(self, b => b.radius())
    }

    fn half_widths(&self) -> Vec3 {
        dispatch!(self, b => b.half_widths())
    }

    fn node_to_base(&self) -> RigidTransform {
        dispatch!(self, b => b.node_to_base())
    }

    fn update_bounds(&self, min: &mut Point3, max: &mut Point3) {
        dispatch!(self, b => b.update_bounds(min, max));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{rigid, Rotation};
    use approx::assert_relative_eq;

    const S: f64 = 1.258_366_77;
    const EPS: f64 = 1e-13;
    const INF: f64 = f64::INFINITY;

    fn special_volumes() -> Vec<BoundingVolume> {
        vec![
            AxisAlignedBox::new(Point3::new(-S, -S, -S), Point3::new(S, S, S)).into(),
            OrientedBox::from_widths(Vec3::new(2.0 * S, 2.0 * S, 2.0 * S)).into(),
        ]
    }

    fn intervals_equal(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() <= EPS && (a.1 - b.1).abs() <= EPS
    }

    fn check_line(
        vol: &BoundingVolume,
        origin: &Point3,
        dir: &Vec3,
        min: f64,
        max: f64,
        expect_hit: bool,
        expected: (f64, f64),
    ) {
        let hit = vol.intersects_line(origin, dir, min, max);
        assert_eq!(hit.is_some(), expect_hit, "origin {origin:?} dir {dir:?} range [{min}, {max}]");
        if let Some(interval) = hit {
            assert!(intervals_equal(interval, expected), "got {interval:?}, expected {expected:?}");
        }
        let d = vol.distance_along_line(origin, dir, min, max);
        let expected_dist = match hit {
            None => INF,
            Some((t0, t1)) if t1 < min || t0 > max => INF,
            Some((t0, _)) if t0 > 0.0 => t0,
            Some((_, t1)) if t1 < 0.0 => -t1,
            Some(_) => 0.0,
        };
        if expected_dist == INF {
            assert_eq!(d, INF);
        } else {
            assert!((d - expected_dist).abs() <= EPS, "distance {d}, expected {expected_dist}");
        }
    }

    fn check_line_cases(vol: &BoundingVolume, origin: Point3, dir: Vec3, expect_hit: bool, lam: (f64, f64)) {
        check_line(vol, &origin, &dir, -INF, INF, expect_hit, lam);
        check_line(vol, &origin, &dir, lam.1 + EPS, INF, false, lam);
        check_line(vol, &origin, &dir, lam.0 - EPS, INF, expect_hit, lam);
        let mid = (lam.0 + lam.1) / 2.0;
        check_line(vol, &origin, &dir, mid, INF, expect_hit, (mid, lam.1));
        check_line(vol, &origin, &dir, -INF, mid, expect_hit, (lam.0, mid));
        check_line(vol, &origin, &dir, -INF, lam.0 - EPS, false, lam);
        check_line(vol, &origin, &dir, -INF, lam.1 + EPS, expect_hit, lam);
    }

    #[test]
    fn test_special_ray_cases() {
        for vol in special_volumes() {
            // axis aligned rays through the center
            for dir in [Vec3::x(), Vec3::y(), Vec3::z()] {
                check_line_cases(&vol, Point3::origin(), dir, true, (-S, S));
            }

            // just outside and just inside each face
            let cases = [
                (Vec3::new(0.0, 1.0, 0.0), Vec3::x()),
                (Vec3::new(0.0, 0.0, 1.0), Vec3::x()),
                (Vec3::new(1.0, 0.0, 0.0), Vec3::y()),
                (Vec3::new(0.0, 0.0, 1.0), Vec3::y()),
                (Vec3::new(1.0, 0.0, 0.0), Vec3::z()),
                (Vec3::new(0.0, 1.0, 0.0), Vec3::z()),
            ];
            for (offset_axis, dir) in cases {
                let outside = Point3::from(offset_axis * (S + EPS));
                check_line_cases(&vol, outside, dir, false, (-S, S));
                let inside = Point3::from(offset_axis * (S - EPS));
                check_line_cases(&vol, inside, dir, true, (-S, S));
            }
        }
    }

    #[test]
    fn test_dispatch_matches_inner_box() {
        let aabb = AxisAlignedBox::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
        let vol = BoundingVolume::from(aabb);
        let p = Point3::new(2.0, 0.0, 0.0);
        assert_eq!(vol.kind(), VolumeKind::Aabb);
        assert_eq!(vol.distance_to_point(&p), aabb.distance_to_point(&p));
        assert_eq!(vol.half_widths(), Vec3::new(1.0, 2.0, 3.0));
        assert!(vol.as_obb().is_none());

        let obb = OrientedBox::new(rigid(Rotation::from_euler_angles(0.2, 0.1, 0.4), Vec3::new(1.0, 1.0, 1.0)), Vec3::new(1.0, 0.5, 0.25));
        let vol = BoundingVolume::from(obb);
        assert_eq!(vol.kind(), VolumeKind::Obb);
        assert_relative_eq!(vol.radius(), obb.half_widths().norm());
        assert_eq!(vol.center(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_empty_and_clear() {
        for kind in [VolumeKind::Aabb, VolumeKind::Obb] {
            let mut vol = BoundingVolume::empty(kind);
            assert!(vol.is_empty());
            assert!(!vol.contains_point(&Point3::origin()));
            vol.update_for_point(&Point3::new(1.0, 2.0, 3.0), 0.5);
            assert!(!vol.is_empty());
            assert!(vol.contains_point(&Point3::new(1.0, 2.0, 3.0)));
            vol.clear();
            assert!(vol.is_empty());
            assert_eq!(vol.kind(), kind);
        }
    }

    #[test]
    fn test_update_for_volume_encloses_corners() {
        let inner = BoundingVolume::from(OrientedBox::new(
            rigid(Rotation::from_euler_angles(0.7, -0.3, 1.2), Vec3::new(3.0, 0.0, 0.0)),
            Vec3::new(1.0, 0.2, 0.4),
        ));
        let mut outer = BoundingVolume::from(AxisAlignedBox::new(Point3::origin(), Point3::new(0.5, 0.5, 0.5)));
        assert!(outer.update_for_volume(&inner, 0.0));
        for c in inner.corners() {
            assert!(outer.contains_point(&c));
        }
        // a second pass changes nothing
        assert!(!outer.update_for_volume(&inner, 0.0));
    }
}
