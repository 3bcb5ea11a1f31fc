//! Separating axis test between pairs of boxes
//!
//! Every combination of axis-aligned and oriented boxes is reduced to one
//! routine working in the frame of the first box: half-widths of both
//! boxes, the rotation of box 2 in box 1's frame, and the offset of box 2's
//! center in box 1's frame.

use crate::bounding::{AxisAlignedBox, BoundingShape, BoundingVolume};
use crate::foundation::math::{is_identity, Mat3, RigidTransform, Vec3};

/// Rotation entries at least this close to one mark an axis pair as
/// parallel, in which case the edge cross products are skipped.
const PARALLEL_CUTOFF: f64 = 1.0 - 1e-10;

/// Disjointness tester for boxes from two frames.
///
/// Holds the transform from the frame of the second box set into the
/// frame of the first. Touching boxes are not disjoint.
#[derive(Debug, Clone, Copy)]
pub struct BoxDisjointTester {
    x21: RigidTransform,
    identity: bool,
}

impl BoxDisjointTester {
    /// Tester for boxes whose frames are related by `x21` (frame 2 to
    /// frame 1)
    pub fn new(x21: &RigidTransform) -> Self {
        Self {
            x21: *x21,
            identity: is_identity(x21),
        }
    }

    /// Transform from frame 2 into frame 1
    pub const fn transform(&self) -> &RigidTransform {
        &self.x21
    }

    /// Whether `b1` (frame 1) and `b2` (frame 2) are separated.
    ///
    /// An empty box is disjoint from everything.
    pub fn is_disjoint(&self, b1: &BoundingVolume, b2: &BoundingVolume) -> bool {
        if b1.is_empty() || b2.is_empty() {
            return true;
        }
        if self.identity {
            if let (BoundingVolume::Aabb(a), BoundingVolume::Aabb(b)) = (b1, b2) {
                return aabbs_disjoint(a, b);
            }
        }
        // box 2 expressed in the frame of box 1
        let x = b1.node_to_base().inverse() * self.x21 * b2.node_to_base();
        boxes_disjoint(
            &b1.half_widths(),
            &b2.half_widths(),
            x.rotation.matrix(),
            &x.translation.vector,
        )
    }
}

/// One-shot form of [`BoxDisjointTester::is_disjoint`]
pub fn is_disjoint(b1: &BoundingVolume, b2: &BoundingVolume, x21: &RigidTransform) -> bool {
    BoxDisjointTester::new(x21).is_disjoint(b1, b2)
}

/// Interval test for two axis-aligned boxes in the same frame
pub fn aabbs_disjoint(a: &AxisAlignedBox, b: &AxisAlignedBox) -> bool {
    (0..3).any(|i| a.max[i] < b.min[i] || b.max[i] < a.min[i])
}

/// Separating axis test for two boxes in box 1's frame.
///
/// `hw1` and `hw2` are the half-widths, `r21` the rotation of box 2 in
/// box 1's frame and `p21` the position of box 2's center in that frame.
/// Tests the three face axes of each box, then the nine edge cross
/// products unless some pair of axes is parallel.
pub fn boxes_disjoint(hw1: &Vec3, hw2: &Vec3, r21: &Mat3, p21: &Vec3) -> bool {
    let (a, b, r, t) = (hw1, hw2, r21, p21);

    let mut abs_r = [[0.0; 3]; 3];
    let mut parallel = false;
    for i in 0..3 {
        for j in 0..3 {
            abs_r[i][j] = r[(i, j)].abs();
            if abs_r[i][j] > PARALLEL_CUTOFF {
                parallel = true;
            }
        }
    }

    // face axes of box 1
    for i in 0..3 {
        let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
        if t[i].abs() > a[i] + rb {
            return true;
        }
    }

    // face axes of box 2
    for j in 0..3 {
        let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
        let tb = t[0] * r[(0, j)] + t[1] * r[(1, j)] + t[2] * r[(2, j)];
        if tb.abs() > ra + b[j] {
            return true;
        }
    }

    if parallel {
        return false;
    }

    // edge cross products
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
            let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
            let sep = (t[i2] * r[(i1, j)] - t[i1] * r[(i2, j)]).abs();
            if sep > ra + rb {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding::OrientedBox;
    use crate::foundation::math::{rigid, translation, Point3, Rotation};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cube(center: Vec3) -> AxisAlignedBox {
        AxisAlignedBox::from_center_half_widths(&Point3::from(center), &Vec3::new(1.0, 1.0, 1.0))
    }

    fn random_rotation(rng: &mut StdRng) -> Rotation {
        Rotation::from_euler_angles(rng.gen_range(-3.1..3.1), rng.gen_range(-1.5..1.5), rng.gen_range(-3.1..3.1))
    }

    /// Projects both boxes' corners on all fifteen candidate axes.
    fn brute_force_disjoint(b1: &BoundingVolume, b2: &BoundingVolume, x21: &RigidTransform) -> bool {
        let c1 = b1.corners();
        let c2: Vec<Point3> = b2.corners().iter().map(|c| x21.transform_point(c)).collect();
        let r1 = b1.node_to_base().rotation;
        let r2 = x21.rotation * b2.node_to_base().rotation;
        let mut axes = Vec::new();
        for i in 0..3 {
            axes.push(r1.matrix().column(i).into_owned());
            axes.push(r2.matrix().column(i).into_owned());
            for j in 0..3 {
                let cross = r1.matrix().column(i).cross(&r2.matrix().column(j));
                if cross.norm() > 1e-6 {
                    axes.push(cross.normalize());
                }
            }
        }
        axes.iter().any(|axis| {
            let project = |pts: &[Point3]| {
                pts.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    let d = axis.dot(&p.coords);
                    (lo.min(d), hi.max(d))
                })
            };
            let (lo1, hi1) = project(&c1);
            let (lo2, hi2) = project(&c2);
            hi1 < lo2 || hi2 < lo1
        })
    }

    #[test]
    fn test_separation_boundary_on_face_axis() {
        let identity = BoxDisjointTester::new(&RigidTransform::identity());
        let b1: BoundingVolume = cube(Vec3::zeros()).into();
        let far: BoundingVolume = cube(Vec3::new(2.0 + 1e-10, 0.0, 0.0)).into();
        let near: BoundingVolume = cube(Vec3::new(2.0 - 1e-10, 0.0, 0.0)).into();
        assert!(identity.is_disjoint(&b1, &far));
        assert!(!identity.is_disjoint(&b1, &near));

        // same answers through the general path
        let o1: BoundingVolume = OrientedBox::from_widths(Vec3::new(2.0, 2.0, 2.0)).into();
        let mut o2 = OrientedBox::from_widths(Vec3::new(2.0, 2.0, 2.0));
        o2.set_pose(translation(Vec3::new(2.0 + 1e-10, 0.0, 0.0)));
        assert!(identity.is_disjoint(&o1, &o2.into()));
        o2.set_pose(translation(Vec3::new(2.0 - 1e-10, 0.0, 0.0)));
        assert!(!identity.is_disjoint(&o1, &o2.into()));

        // touching faces count as overlapping
        let touching: BoundingVolume = cube(Vec3::new(2.0, 0.0, 0.0)).into();
        assert!(!identity.is_disjoint(&b1, &touching));
    }

    #[test]
    fn test_separation_through_transform() {
        let b: BoundingVolume = cube(Vec3::zeros()).into();
        let tester = BoxDisjointTester::new(&translation(Vec3::new(0.0, 2.0 + 1e-10, 0.0)));
        assert!(tester.is_disjoint(&b, &b));
        let tester = BoxDisjointTester::new(&translation(Vec3::new(0.0, 2.0 - 1e-10, 0.0)));
        assert!(!tester.is_disjoint(&b, &b));
    }

    #[test]
    fn test_rotated_corner_against_face() {
        let b1: BoundingVolume = cube(Vec3::zeros()).into();
        let rot = Rotation::from_axis_angle(&Vec3::z_axis(), std::f64::consts::FRAC_PI_4);
        let far = OrientedBox::new(rigid(rot, Vec3::new(2.5, 0.0, 0.0)), Vec3::new(1.0, 1.0, 1.0));
        let near = OrientedBox::new(rigid(rot, Vec3::new(2.3, 0.0, 0.0)), Vec3::new(1.0, 1.0, 1.0));
        let tester = BoxDisjointTester::new(&RigidTransform::identity());
        assert!(tester.is_disjoint(&b1, &far.into()));
        assert!(!tester.is_disjoint(&b1, &near.into()));
    }

    #[test]
    fn test_edge_edge_separation() {
        // two boxes rotated so that only an edge cross product separates them
        let r1 = Rotation::from_axis_angle(&Vec3::x_axis(), std::f64::consts::FRAC_PI_4);
        let r2 = Rotation::from_axis_angle(&Vec3::y_axis(), std::f64::consts::FRAC_PI_4);
        let b1: BoundingVolume = OrientedBox::new(rigid(r1, Vec3::zeros()), Vec3::new(1.0, 1.0, 1.0)).into();
        let hw = Vec3::new(1.0, 1.0, 1.0);
        let tester = BoxDisjointTester::new(&RigidTransform::identity());
        for (gap, disjoint) in [(0.05, true), (-0.05, false)] {
            // edges of both boxes meet along the z axis at 2 * sqrt(2)
            let offset = Vec3::new(0.0, 0.0, 2.0 * 2f64.sqrt() + gap);
            let b2: BoundingVolume = OrientedBox::new(rigid(r2, offset), hw).into();
            assert_eq!(tester.is_disjoint(&b1, &b2), disjoint);
            assert_eq!(brute_force_disjoint(&b1, &b2, &RigidTransform::identity()), disjoint);
        }
    }

    #[test]
    fn test_matches_brute_force_and_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut disjoint_count = 0;
        for _ in 0..500 {
            let hw1 = Vec3::new(rng.gen_range(0.1..1.5), rng.gen_range(0.1..1.5), rng.gen_range(0.1..1.5));
            let hw2 = Vec3::new(rng.gen_range(0.1..1.5), rng.gen_range(0.1..1.5), rng.gen_range(0.1..1.5));
            let p1 = Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let p2 = Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let b1: BoundingVolume = if rng.gen_bool(0.5) {
                AxisAlignedBox::from_center_half_widths(&Point3::from(p1), &hw1).into()
            } else {
                OrientedBox::new(rigid(random_rotation(&mut rng), p1), hw1).into()
            };
            let b2: BoundingVolume = OrientedBox::new(rigid(random_rotation(&mut rng), p2), hw2).into();
            let x21 = rigid(random_rotation(&mut rng), Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0)));

            let forward = is_disjoint(&b1, &b2, &x21);
            let backward = is_disjoint(&b2, &b1, &x21.inverse());
            assert_eq!(forward, backward);
            assert_eq!(forward, brute_force_disjoint(&b1, &b2, &x21));
            if forward {
                disjoint_count += 1;
            }
        }
        // the sample must exercise both outcomes
        assert!(disjoint_count > 0 && disjoint_count < 500);
    }

    #[test]
    fn test_parallel_axes_skip_edge_tests() {
        // identical orientation: face tests alone decide
        let hw = Vec3::new(1.0, 2.0, 3.0);
        assert!(!boxes_disjoint(&hw, &hw, &Mat3::identity(), &Vec3::new(1.9, 3.9, 5.9)));
        assert!(boxes_disjoint(&hw, &hw, &Mat3::identity(), &Vec3::new(0.0, 4.1, 0.0)));

        // rounding-level rotation: off-diagonal entries are nonzero but the
        // diagonal still passes the cutoff
        let tiny = Rotation::from_axis_angle(&Vec3::z_axis(), 1e-12) * Rotation::from_axis_angle(&Vec3::x_axis(), 1e-12);
        let r = tiny.matrix();
        assert!(r[(0, 1)] != 0.0 && r[(1, 2)] != 0.0);
        assert!(r[(0, 0)].abs() > PARALLEL_CUTOFF);
        assert!(!boxes_disjoint(&hw, &hw, r, &Vec3::new(1.9, 3.9, 5.9)));
        assert!(boxes_disjoint(&hw, &hw, r, &Vec3::new(0.0, 4.1, 0.0)));
        assert!(boxes_disjoint(&hw, &hw, r, &Vec3::new(2.1, 0.0, 0.0)));
        assert!(boxes_disjoint(&hw, &hw, r, &Vec3::new(0.0, 0.0, -6.1)));
        assert!(!boxes_disjoint(&hw, &hw, r, &Vec3::new(-1.9, 0.0, -5.9)));
    }

    #[test]
    fn test_empty_box_is_disjoint_on_every_path() {
        let empty: BoundingVolume = AxisAlignedBox::empty().into();
        let aabb: BoundingVolume = cube(Vec3::zeros()).into();
        let obb: BoundingVolume = OrientedBox::from_widths(Vec3::new(2.0, 2.0, 2.0)).into();
        let rotated = rigid(Rotation::from_euler_angles(0.3, 0.2, 0.1), Vec3::new(0.1, 0.0, 0.0));

        for x21 in [RigidTransform::identity(), rotated] {
            for other in [aabb, obb] {
                assert!(is_disjoint(&empty, &other, &x21));
                assert!(is_disjoint(&other, &empty, &x21));
            }
            assert!(is_disjoint(&empty, &empty, &x21));
            assert!(is_disjoint(&OrientedBox::empty().into(), &aabb, &x21));
            assert!(!is_disjoint(&aabb, &obb, &x21));
        }
    }
}
