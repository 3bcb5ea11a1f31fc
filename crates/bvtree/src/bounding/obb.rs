//! Oriented bounding box

use super::fit::{self, FitMethod};
use super::slab;
use super::volume::BoundingShape;
use crate::error::BvhError;
use crate::foundation::math::{self, rigid, Point3, RigidTransform, Rotation, Vec3};
use crate::geometry::Boundable;

/// Oriented bounding box
///
/// A box of half-widths `half_widths` centered at the origin of its own
/// frame, placed in the base frame by `pose`. Negative half-widths mark an
/// empty box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pose: RigidTransform,
    half_widths: Vec3,
}

impl OrientedBox {
    /// Creates a box with the given pose and half-widths
    pub const fn new(pose: RigidTransform, half_widths: Vec3) -> Self {
        Self { pose, half_widths }
    }

    /// Axis-aligned box of full `widths` centered at the origin
    pub fn from_widths(widths: Vec3) -> Self {
        Self::new(RigidTransform::identity(), widths * 0.5)
    }

    /// Box that contains nothing
    pub fn empty() -> Self {
        Self::new(RigidTransform::identity(), Vec3::repeat(f64::NEG_INFINITY))
    }

    /// Fit a box around `elements` padded by `margin`
    pub fn fit<I>(elements: I, margin: f64, method: FitMethod) -> Result<Self, BvhError>
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        fit::fit_oriented_box(elements, margin, method)
    }

    /// Refit in place; see [`OrientedBox::fit`]
    pub fn set<I>(&mut self, elements: I, margin: f64, method: FitMethod) -> Result<(), BvhError>
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        *self = Self::fit(elements, margin, method)?;
        Ok(())
    }

    /// Copy the frame and extents of another shape padded by `margin`
    pub fn set_from_shape<S: BoundingShape>(&mut self, other: &S, margin: f64) {
        self.pose = other.node_to_base();
        self.half_widths = other.half_widths() + Vec3::repeat(margin);
    }

    /// Whether the box encloses nothing
    pub fn is_empty(&self) -> bool {
        self.half_widths.x < 0.0 || self.half_widths.y < 0.0 || self.half_widths.z < 0.0
    }

    /// Box pose in the base frame
    pub const fn pose(&self) -> &RigidTransform {
        &self.pose
    }

    /// Box orientation
    pub const fn rotation(&self) -> &Rotation {
        &self.pose.rotation
    }

    /// Unit direction of box axis `i` in the base frame
    pub fn axis(&self, i: usize) -> Vec3 {
        self.pose.rotation.matrix().column(i).into_owned()
    }

    /// Replace the pose, keeping the half-widths
    pub fn set_pose(&mut self, pose: RigidTransform) {
        self.pose = pose;
    }

    /// Replace the half-widths, keeping the pose
    pub fn set_half_widths(&mut self, half_widths: Vec3) {
        self.half_widths = half_widths;
    }

    /// The eight corners in the base frame
    pub fn corners(&self) -> [Point3; 8] {
        let hw = &self.half_widths;
        std::array::from_fn(|k| {
            let local = Point3::new(
                if k & 1 == 0 { -hw.x } else { hw.x },
                if k & 2 == 0 { -hw.y } else { hw.y },
                if k & 4 == 0 { -hw.z } else { hw.z },
            );
            self.pose.transform_point(&local)
        })
    }

    fn to_local(&self, p: &Point3) -> Vec3 {
        self.pose.inverse_transform_point(p).coords
    }

    fn local_extents(&self) -> (Vec3, Vec3) {
        (-self.half_widths, self.half_widths)
    }
}

impl Default for OrientedBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingShape for OrientedBox {
    fn contains_point(&self, p: &Point3) -> bool {
        let (lo, hi) = self.local_extents();
        slab::contains(&lo, &hi, &self.to_local(p))
    }

    fn intersects_sphere(&self, center: &Point3, radius: f64) -> bool {
        let (lo, hi) = self.local_extents();
        slab::within(&lo, &hi, &self.to_local(center), radius)
    }

    fn intersects_plane(&self, normal: &Vec3, offset: f64) -> bool {
        let (lo, hi) = self.local_extents();
        let n = self.pose.rotation.inverse_transform_vector(normal);
        let d = offset - normal.dot(&self.pose.translation.vector);
        slab::plane_straddles(&lo, &hi, &n, d)
    }

    fn intersects_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> Option<(f64, f64)> {
        let (lo, hi) = self.local_extents();
        let dir = self.pose.rotation.inverse_transform_vector(dir);
        slab::clip_line(&lo, &hi, &self.to_local(origin), &dir, min, max)
    }

    fn intersects_line_segment(&self, p1: &Point3, p2: &Point3) -> bool {
        let (lo, hi) = self.local_extents();
        slab::segment_hits(&lo, &hi, &self.to_local(p1), &self.to_local(p2))
    }

    fn distance_to_point(&self, p: &Point3) -> f64 {
        let (lo, hi) = self.local_extents();
        slab::distance_to_point(&lo, &hi, &self.to_local(p))
    }

    fn distance_along_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> f64 {
        let (lo, hi) = self.local_extents();
        let dir = self.pose.rotation.inverse_transform_vector(dir);
        slab::distance_along_line(&lo, &hi, &self.to_local(origin), &dir, min, max)
    }

    fn is_contained<I>(&self, elements: I, tol: f64) -> bool
    where
        I: IntoIterator,
        I::Item: Boundable,
    {
        // slack for the rounding of the base-to-box transform
        let eps = self.half_widths.norm() * 1e-13;
        elements.into_iter().all(|e| {
            (0..e.num_points()).all(|i| self.intersects_sphere(&e.point(i), -(tol - eps)))
        })
    }

    fn update_for_point(&mut self, p: &Point3, margin: f64) -> bool {
        if self.is_empty() {
            self.pose = rigid(self.pose.rotation, p.coords);
            self.half_widths = Vec3::repeat(margin.max(0.0));
            return true;
        }
        let b = self.to_local(p);
        let hw = &mut self.half_widths;
        let mut modified = false;
        for i in 0..3 {
            let needed = b[i].abs() + margin;
            if needed > hw[i] {
                hw[i] = needed;
                modified = true;
            }
        }
        modified
    }

    fn scale(&mut self, s: f64) {
        if self.is_empty() {
            return;
        }
        self.half_widths *= s;
    }

    fn center(&self) -> Point3 {
        Point3::from(self.pose.translation.vector)
    }

    fn half_widths(&self) -> Vec3 {
        self.half_widths
    }

    fn node_to_base(&self) -> RigidTransform {
        self.pose
    }

    fn update_bounds(&self, min: &mut Point3, max: &mut Point3) {
        if self.is_empty() {
            return;
        }
        for c in self.corners() {
            math::update_bounds(&c, min, max);
        }
    }
}
