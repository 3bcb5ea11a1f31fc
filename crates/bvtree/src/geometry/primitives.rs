//! Concrete elements: segments, triangles and indexed mesh faces

use super::boundable::Boundable;
use crate::foundation::math::{Mat3, Point3, Vec3};

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Start point
    pub p0: Point3,
    /// End point
    pub p1: Point3,
}

impl LineSegment {
    /// Creates a new segment
    pub fn new(p0: Point3, p1: Point3) -> Self {
        Self { p0, p1 }
    }

    /// Segment length
    pub fn length(&self) -> f64 {
        (self.p1 - self.p0).norm()
    }
}

impl Boundable for LineSegment {
    fn num_points(&self) -> usize {
        2
    }

    fn point(&self, idx: usize) -> Point3 {
        if idx == 0 { self.p0 } else { self.p1 }
    }

    fn covariance(&self) -> (f64, Mat3) {
        let len = self.length();
        let (a, b) = (self.p0.coords, self.p1.coords);
        // integral of x x^T along the segment
        let c = (a * a.transpose() + b * b.transpose()) * (len / 3.0)
            + (a * b.transpose() + b * a.transpose()) * (len / 6.0);
        (len, c)
    }
}

/// A triangle for bounding volume construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Point3,
    /// Second vertex
    pub v1: Point3,
    /// Third vertex
    pub v2: Point3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).normalize()
    }

    /// Triangle area
    pub fn area(&self) -> f64 {
        triangle_area(&self.v0, &self.v1, &self.v2)
    }
}

impl Boundable for Triangle {
    fn num_points(&self) -> usize {
        3
    }

    fn point(&self, idx: usize) -> Point3 {
        match idx {
            0 => self.v0,
            1 => self.v1,
            _ => self.v2,
        }
    }

    fn centroid(&self) -> Point3 {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    fn covariance(&self) -> (f64, Mat3) {
        triangle_moment(&self.v0, &self.v1, &self.v2)
    }
}

/// A triangle that indexes into a shared vertex buffer.
///
/// Deforming the buffer and calling `update` on the tree keeps every face
/// bounded without rebuilding the element list.
#[derive(Debug, Clone, Copy)]
pub struct MeshFace<'a> {
    vertices: &'a [Point3],
    indices: [usize; 3],
}

impl<'a> MeshFace<'a> {
    /// Face over `vertices[indices[k]]`; indices must be in range
    pub fn new(vertices: &'a [Point3], indices: [usize; 3]) -> Self {
        Self { vertices, indices }
    }

    /// Vertex indices of the face
    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    /// The face as a standalone triangle
    pub fn triangle(&self) -> Triangle {
        Triangle::new(self.point(0), self.point(1), self.point(2))
    }
}

impl Boundable for MeshFace<'_> {
    fn num_points(&self) -> usize {
        3
    }

    fn point(&self, idx: usize) -> Point3 {
        self.vertices[self.indices[idx]]
    }

    fn centroid(&self) -> Point3 {
        self.triangle().centroid()
    }

    fn covariance(&self) -> (f64, Mat3) {
        self.triangle().covariance()
    }
}

/// Area of the triangle `(a, b, c)`
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Area and second moment about the origin of a triangle's surface.
///
/// For area `A` and centroid `g` the moment is
/// `A / 12 * (9 g g^T + sum_i p_i p_i^T)`.
pub fn triangle_moment(a: &Point3, b: &Point3, c: &Point3) -> (f64, Mat3) {
    let area = triangle_area(a, b, c);
    let g = (a.coords + b.coords + c.coords) / 3.0;
    let mut m = g * g.transpose() * 9.0;
    for p in [a, b, c] {
        m += p.coords * p.coords.transpose();
    }
    (area, m * (area / 12.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_properties() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        assert_relative_eq!(tri.area(), 2.0);
        assert_relative_eq!(tri.normal(), Vec3::z());
        assert_relative_eq!(tri.centroid(), Point3::new(2.0 / 3.0, 2.0 / 3.0, 0.0));
        assert_eq!(tri.num_points(), 3);
        assert_eq!(tri.point(2), tri.v2);
    }

    #[test]
    fn test_triangle_moment_matches_centroid() {
        // a triangle translated far away is dominated by A * g g^T
        let tri = Triangle::new(
            Point3::new(100.0, 0.0, 0.0),
            Point3::new(100.1, 0.0, 0.0),
            Point3::new(100.0, 0.1, 0.0),
        );
        let (area, m) = tri.covariance();
        let g = tri.centroid().coords;
        assert_relative_eq!(area, 0.005, epsilon = 1e-12);
        assert_relative_eq!(m[(0, 0)] / area, g.x * g.x, max_relative = 1e-6);
    }

    #[test]
    fn test_segment_moment() {
        // unit segment along x from the origin: integral of x^2 is 1/3
        let seg = LineSegment::new(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let (len, m) = seg.covariance();
        assert_relative_eq!(len, 1.0);
        assert_relative_eq!(m[(0, 0)], 1.0 / 3.0, epsilon = 1e-15);
        assert_relative_eq!(m[(1, 1)], 0.0);
        assert_relative_eq!(seg.centroid(), Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_mesh_face_follows_vertices() {
        let mut vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        {
            let face = MeshFace::new(&vertices, [0, 1, 2]);
            assert_eq!(face.point(1), Point3::new(1.0, 0.0, 0.0));
            assert_relative_eq!(face.triangle().area(), 0.5);
        }
        vertices[1].x = 3.0;
        let face = MeshFace::new(&vertices, [0, 1, 2]);
        assert_eq!(face.point(1), Point3::new(3.0, 0.0, 0.0));
        assert_eq!(face.indices(), [0, 1, 2]);
    }
}
