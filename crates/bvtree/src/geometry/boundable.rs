//! The element contract the tree is built over

use crate::foundation::math::{self, Mat3, Point3};

/// Anything a bounding volume can be fitted around.
///
/// An element exposes a finite set of points; every bound computed for it
/// is a bound of those points. Points are returned by value so elements can
/// be lightweight views into shared vertex buffers.
pub trait Boundable {
    /// Number of points defining the element
    fn num_points(&self) -> usize;

    /// The `idx`-th point; `idx < num_points()`
    fn point(&self, idx: usize) -> Point3;

    /// Iterate over the element's points
    fn points(&self) -> PointIter<'_, Self>
    where
        Self: Sized,
    {
        PointIter { element: self, next: 0 }
    }

    /// Fold the element's points into `[min, max]`
    fn update_bounds(&self, min: &mut Point3, max: &mut Point3) {
        for i in 0..self.num_points() {
            math::update_bounds(&self.point(i), min, max);
        }
    }

    /// Average of the element's points; the origin for an empty element
    fn centroid(&self) -> Point3 {
        let n = self.num_points();
        if n == 0 {
            return Point3::origin();
        }
        let sum = (0..n).fold(Point3::origin().coords, |acc, i| acc + self.point(i).coords);
        Point3::from(sum / n as f64)
    }

    /// Weight and second moment about the origin.
    ///
    /// The default treats every point as a unit mass; elements with extent
    /// (segments, triangles) override this with the moment of their length
    /// or area.
    fn covariance(&self) -> (f64, Mat3) {
        let mut c = Mat3::zeros();
        for i in 0..self.num_points() {
            let p = self.point(i).coords;
            c += p * p.transpose();
        }
        (self.num_points() as f64, c)
    }
}

/// Iterator over the points of a [`Boundable`]
pub struct PointIter<'a, B> {
    element: &'a B,
    next: usize,
}

impl<B: Boundable> Iterator for PointIter<'_, B> {
    type Item = Point3;

    fn next(&mut self) -> Option<Point3> {
        if self.next < self.element.num_points() {
            self.next += 1;
            Some(self.element.point(self.next - 1))
        } else {
            None
        }
    }
}

impl<B: Boundable + ?Sized> Boundable for &B {
    fn num_points(&self) -> usize {
        (**self).num_points()
    }

    fn point(&self, idx: usize) -> Point3 {
        (**self).point(idx)
    }

    fn update_bounds(&self, min: &mut Point3, max: &mut Point3) {
        (**self).update_bounds(min, max);
    }

    fn centroid(&self) -> Point3 {
        (**self).centroid()
    }

    fn covariance(&self) -> (f64, Mat3) {
        (**self).covariance()
    }
}

impl Boundable for Point3 {
    fn num_points(&self) -> usize {
        1
    }

    fn point(&self, _idx: usize) -> Point3 {
        *self
    }

    fn centroid(&self) -> Point3 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_is_boundable() {
        let p = Point3::new(1.0, -2.0, 3.0);
        assert_eq!(p.num_points(), 1);
        assert_eq!(p.centroid(), p);

        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        p.update_bounds(&mut min, &mut max);
        assert_eq!(min, p);
        assert_eq!(max, p);

        let (w, c) = p.covariance();
        assert_eq!(w, 1.0);
        assert_relative_eq!(c[(0, 1)], -2.0);
        assert_relative_eq!(c[(2, 2)], 9.0);
    }

    #[test]
    fn test_points_iterator() {
        let p = Point3::new(0.5, 0.5, 0.5);
        let collected: Vec<Point3> = p.points().collect();
        assert_eq!(collected, vec![p]);
        // references delegate
        let r = &p;
        assert_eq!(r.num_points(), 1);
        assert_eq!(r.point(0), p);
    }
}
