//! Math utilities and types
//!
//! Double precision aliases over nalgebra. Rigid transforms keep their
//! rotation as a matrix so box tests can read the entries directly.

pub use nalgebra::{IsometryMatrix3, Matrix3, Rotation3, SymmetricEigen, Translation3, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// Orthonormal rotation matrix
pub type Rotation = Rotation3<f64>;

/// Rigid transform (rotation followed by translation)
///
/// Maps points from a local frame into the frame it is expressed in,
/// i.e. `p_base = R * p_local + t`.
pub type RigidTransform = IsometryMatrix3<f64>;

/// Build a rigid transform from a rotation and a translation vector
pub fn rigid(rotation: Rotation, translation: Vec3) -> RigidTransform {
    RigidTransform::from_parts(Translation3::from(translation), rotation)
}

/// Build a pure translation
pub fn translation(offset: Vec3) -> RigidTransform {
    rigid(Rotation::identity(), offset)
}

/// Exact identity check; no tolerance is applied.
pub fn is_identity(x: &RigidTransform) -> bool {
    x.translation.vector == Vec3::zeros() && *x.rotation.matrix() == Mat3::identity()
}

/// Transform of frame 2 expressed in frame 1, given both frames in world
/// coordinates.
pub fn relative_transform(x1_to_world: &RigidTransform, x2_to_world: &RigidTransform) -> RigidTransform {
    x1_to_world.inverse() * x2_to_world
}

/// Rotation whose z axis points along `z`.
///
/// The x and y axes are chosen by the shortest arc from the world z axis.
/// A zero `z` yields the identity.
pub fn rotation_from_z_direction(z: &Vec3) -> Rotation {
    let norm = z.norm();
    if norm == 0.0 {
        return Rotation::identity();
    }
    let dir = z / norm;
    Rotation::rotation_between(&Vec3::z(), &dir).unwrap_or_else(|| {
        // antiparallel: half turn about x
        Rotation::from_axis_angle(&Vec3::x_axis(), std::f64::consts::PI)
    })
}

/// Index of the largest component
pub fn longest_axis(v: &Vec3) -> usize {
    if v.x >= v.y {
        if v.x >= v.z { 0 } else { 2 }
    } else if v.y >= v.z {
        1
    } else {
        2
    }
}

/// Fold `p` into the running `[min, max]` bounds.
pub fn update_bounds(p: &Point3, min: &mut Point3, max: &mut Point3) {
    for i in 0..3 {
        if p[i] < min[i] {
            min[i] = p[i];
        }
        if p[i] > max[i] {
            max[i] = p[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_detection() {
        assert!(is_identity(&RigidTransform::identity()));
        assert!(!is_identity(&translation(Vec3::new(0.0, 1e-300, 0.0))));
        let rot = Rotation::from_axis_angle(&Vec3::y_axis(), 1e-9);
        assert!(!is_identity(&rigid(rot, Vec3::zeros())));
    }

    #[test]
    fn test_relative_transform_round_trip() {
        let x1 = rigid(
            Rotation::from_euler_angles(0.3, -0.2, 1.1),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let x2 = rigid(
            Rotation::from_euler_angles(-0.7, 0.4, 0.25),
            Vec3::new(-4.0, 0.5, 2.0),
        );
        let x21 = relative_transform(&x1, &x2);
        let p = Point3::new(0.2, -1.3, 4.0);
        // going through world and going through x21 must agree
        let via_world = x1.inverse_transform_point(&x2.transform_point(&p));
        assert_relative_eq!(x21.transform_point(&p), via_world, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_from_z_direction() {
        for z in [Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, -2.0, 0.5)] {
            let r = rotation_from_z_direction(&z);
            assert_relative_eq!(r * Vec3::z(), z.normalize(), epsilon = 1e-12);
            assert_relative_eq!(r.matrix().determinant(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(rotation_from_z_direction(&Vec3::zeros()), Rotation::identity());
    }

    #[test]
    fn test_longest_axis() {
        assert_eq!(longest_axis(&Vec3::new(3.0, 2.0, 1.0)), 0);
        assert_eq!(longest_axis(&Vec3::new(1.0, 2.0, 1.5)), 1);
        assert_eq!(longest_axis(&Vec3::new(1.0, 2.0, 3.0)), 2);
    }
}
