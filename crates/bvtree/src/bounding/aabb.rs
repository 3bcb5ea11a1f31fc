//! Axis-aligned bounding box

use super::slab;
use super::volume::BoundingShape;
use crate::foundation::math::{self, translation, Point3, RigidTransform, Vec3};
use crate::geometry::Boundable;

/// Axis-aligned bounding box
///
/// An empty box has `min = +inf` and `max = -inf` so that folding any point
/// into it yields that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl AxisAlignedBox {
    /// Creates a box from its corners
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Creates a box from a center and half-widths
    pub fn from_center_half_widths(center: &Point3, half_widths: &Vec3) -> Self {
        Self::new(center - half_widths, center + half_widths)
    }

    /// Box that contains nothing
    pub fn empty() -> Self {
        Self::new(
            Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        )
    }

    /// Tight box around `elements` padded by `margin`
    pub fn from_elements<I>(elements: I, margin: f64) -> Self
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        let mut b = Self::empty();
        b.set(elements, margin);
        b
    }

    /// Whether the box encloses nothing
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Reset to the empty box
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Reset to the tight bounds of `elements` padded by `margin`
    pub fn set<I>(&mut self, elements: I, margin: f64)
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        self.clear();
        for e in elements {
            e.update_bounds(&mut self.min, &mut self.max);
        }
        self.pad(margin);
    }

    /// Reset to the axis-aligned bounds of another shape padded by `margin`
    pub fn set_from_shape<S: BoundingShape>(&mut self, other: &S, margin: f64) {
        self.clear();
        other.update_bounds(&mut self.min, &mut self.max);
        self.pad(margin);
    }

    /// Grow to contain `other` padded by `margin`; returns whether the box
    /// changed
    pub fn update_for_aabb(&mut self, other: &Self, margin: f64) -> bool {
        let mut modified = false;
        for i in 0..3 {
            let lo = other.min[i] - margin;
            if lo < self.min[i] {
                self.min[i] = lo;
                modified = true;
            }
            let hi = other.max[i] + margin;
            if hi > self.max[i] {
                self.max[i] = hi;
                modified = true;
            }
        }
        modified
    }

    /// The eight corners
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (&self.min, &self.max);
        std::array::from_fn(|k| {
            Point3::new(
                if k & 1 == 0 { lo.x } else { hi.x },
                if k & 2 == 0 { lo.y } else { hi.y },
                if k & 4 == 0 { lo.z } else { hi.z },
            )
        })
    }

    /// Box dimensions
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    fn pad(&mut self, margin: f64) {
        let m = Vec3::repeat(margin);
        self.min -= m;
        self.max += m;
    }
}

impl Default for AxisAlignedBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingShape for AxisAlignedBox {
    fn contains_point(&self, p: &Point3) -> bool {
        slab::contains(&self.min.coords, &self.max.coords, &p.coords)
    }

    fn intersects_sphere(&self, center: &Point3, radius: f64) -> bool {
        slab::within(&self.min.coords, &self.max.coords, &center.coords, radius)
    }

    fn intersects_plane(&self, normal: &Vec3, offset: f64) -> bool {
        slab::plane_straddles(&self.min.coords, &self.max.coords, normal, offset)
    }

    fn intersects_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> Option<(f64, f64)> {
        slab::clip_line(&self.min.coords, &self.max.coords, &origin.coords, dir, min, max)
    }

    fn intersects_line_segment(&self, p1: &Point3, p2: &Point3) -> bool {
        slab::segment_hits(&self.min.coords, &self.max.coords, &p1.coords, &p2.coords)
    }

    fn distance_to_point(&self, p: &Point3) -> f64 {
        slab::distance_to_point(&self.min.coords, &self.max.coords, &p.coords)
    }

    fn distance_along_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> f64 {
        slab::distance_along_line(&self.min.coords, &self.max.coords, &origin.coords, dir, min, max)
    }

    fn is_contained<I>(&self, elements: I, tol: f64) -> bool
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        let tight = Self::from_elements(elements, 0.0);
        (0..3).all(|i| tight.max[i] + tol <= self.max[i] && tight.min[i] - tol >= self.min[i])
    }

    fn update_for_point(&mut self, p: &Point3, margin: f64) -> bool {
        let mut modified = false;
        for i in 0..3 {
            if p[i] - margin < self.min[i] {
                self.min[i] = p[i] - margin;
                modified = true;
            }
            if p[i] + margin > self.max[i] {
                self.max[i] = p[i] + margin;
                modified = true;
            }
        }
        modified
    }

    fn scale(&mut self, s: f64) {
        if self.is_empty() {
            return;
        }
        let inc = self.half_widths() * (s - 1.0);
        self.max += inc;
        self.min -= inc;
    }

    fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    fn half_widths(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    fn node_to_base(&self) -> RigidTransform {
        translation(self.center().coords)
    }

    fn update_bounds(&self, min: &mut Point3, max: &mut Point3) {
        math::update_bounds(&self.min, min, max);
        math::update_bounds(&self.max, min, max);
    }
}
