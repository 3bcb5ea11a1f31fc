//! Axis-aligned extent tests shared by both box types.
//!
//! Every routine takes the box as `[lo, hi]` in the coordinates the query
//! is expressed in. Axis-aligned boxes pass their `min`/`max` directly,
//! oriented boxes pass `[-hw, hw]` after moving the query into box space.

use crate::foundation::math::Vec3;

/// Inclusive point containment
pub(crate) fn contains(lo: &Vec3, hi: &Vec3, p: &Vec3) -> bool {
    lo.x <= p.x && p.x <= hi.x && lo.y <= p.y && p.y <= hi.y && lo.z <= p.z && p.z <= hi.z
}

/// Inclusive test of `p` against the box grown by `r` on every side
pub(crate) fn within(lo: &Vec3, hi: &Vec3, p: &Vec3, r: f64) -> bool {
    lo.x <= p.x + r
        && p.x - r <= hi.x
        && lo.y <= p.y + r
        && p.y - r <= hi.y
        && lo.z <= p.z + r
        && p.z - r <= hi.z
}

/// Clip the line `origin + t * dir`, `t` in `[tmin, tmax]`, against the box.
///
/// Returns the parameter interval inside the box. A zero direction
/// component rejects immediately when the origin lies outside that slab.
pub(crate) fn clip_line(
    lo: &Vec3,
    hi: &Vec3,
    origin: &Vec3,
    dir: &Vec3,
    mut tmin: f64,
    mut tmax: f64,
) -> Option<(f64, f64)> {
    for i in 0..3 {
        if dir[i] == 0.0 {
            if lo[i] - origin[i] > 0.0 || hi[i] - origin[i] < 0.0 {
                return None;
            }
        } else {
            let inv = 1.0 / dir[i];
            let (near, far) = if dir[i] > 0.0 {
                ((lo[i] - origin[i]) * inv, (hi[i] - origin[i]) * inv)
            } else {
                ((hi[i] - origin[i]) * inv, (lo[i] - origin[i]) * inv)
            };
            if near > tmin {
                tmin = near;
            }
            if far < tmax {
                tmax = far;
            }
            if tmin > tmax {
                return None;
            }
        }
    }
    Some((tmin, tmax))
}

/// Segment `[p1, p2]` test: an endpoint inside, or the clipped line
/// interval overlapping `[0, 1]`.
pub(crate) fn segment_hits(lo: &Vec3, hi: &Vec3, p1: &Vec3, p2: &Vec3) -> bool {
    if contains(lo, hi, p1) || contains(lo, hi, p2) {
        return true;
    }
    clip_line(lo, hi, p1, &(p2 - p1), 0.0, 1.0).is_some()
}

/// Exact Euclidean distance from `p` to the box; zero when inside.
pub(crate) fn distance_to_point(lo: &Vec3, hi: &Vec3, p: &Vec3) -> f64 {
    let mut deltas = [0.0; 3];
    let mut outside = 0;
    for i in 0..3 {
        let d = if p[i] > hi[i] {
            p[i] - hi[i]
        } else if p[i] < lo[i] {
            lo[i] - p[i]
        } else {
            continue;
        };
        deltas[outside] = d;
        outside += 1;
    }
    match outside {
        0 => 0.0,
        1 => deltas[0],
        2 => (deltas[0] * deltas[0] + deltas[1] * deltas[1]).sqrt(),
        _ => (deltas[0] * deltas[0] + deltas[1] * deltas[1] + deltas[2] * deltas[2]).sqrt(),
    }
}

/// Smallest `|t|` over the part of the line inside the box, restricted to
/// `[tmin, tmax]`; infinity on a miss.
pub(crate) fn distance_along_line(
    lo: &Vec3,
    hi: &Vec3,
    origin: &Vec3,
    dir: &Vec3,
    tmin: f64,
    tmax: f64,
) -> f64 {
    match clip_line(lo, hi, origin, dir, tmin, tmax) {
        None => f64::INFINITY,
        Some((near, _)) if near > 0.0 => near,
        Some((_, far)) if far < 0.0 => -far,
        Some(_) => 0.0,
    }
}

/// Whether the plane `n . x = d` touches the box: some corner lies on or
/// above it and some corner on or below.
pub(crate) fn plane_straddles(lo: &Vec3, hi: &Vec3, n: &Vec3, d: f64) -> bool {
    let mut up = false;
    let mut down = false;
    for corner in 0..8 {
        let c = Vec3::new(
            if corner & 1 == 0 { lo.x } else { hi.x },
            if corner & 2 == 0 { lo.y } else { hi.y },
            if corner & 4 == 0 { lo.z } else { hi.z },
        );
        let b = n.dot(&c) - d;
        up |= b >= 0.0;
        down |= b <= 0.0;
        if up && down {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> (Vec3, Vec3) {
        (Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_clip_line_axis_parallel() {
        let (lo, hi) = unit();
        let hit = clip_line(&lo, &hi, &Vec3::new(0.0, 0.5, 0.0), &Vec3::x(), f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(hit, Some((-1.0, 1.0)));
        let miss = clip_line(&lo, &hi, &Vec3::new(0.0, 1.5, 0.0), &Vec3::x(), f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(miss, None);
        // negative direction swaps near and far
        let back = clip_line(&lo, &hi, &Vec3::zeros(), &(-Vec3::x() * 2.0), f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(back, Some((-0.5, 0.5)));
    }

    #[test]
    fn test_segment_hits() {
        let (lo, hi) = unit();
        assert!(segment_hits(&lo, &hi, &Vec3::new(-3.0, 0.0, 0.0), &Vec3::new(3.0, 0.0, 0.0)));
        assert!(!segment_hits(&lo, &hi, &Vec3::new(-3.0, 0.0, 0.0), &Vec3::new(-2.0, 0.0, 0.0)));
        assert!(segment_hits(&lo, &hi, &Vec3::zeros(), &Vec3::new(0.1, 0.0, 0.0)));
        // touching the face counts
        assert!(segment_hits(&lo, &hi, &Vec3::new(-3.0, 1.0, 0.0), &Vec3::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn test_distance_to_point() {
        let (lo, hi) = unit();
        assert_eq!(distance_to_point(&lo, &hi, &Vec3::new(0.3, -0.9, 1.0)), 0.0);
        assert_eq!(distance_to_point(&lo, &hi, &Vec3::new(3.0, 0.0, 0.0)), 2.0);
        assert_eq!(distance_to_point(&lo, &hi, &Vec3::new(4.0, -5.0, 0.0)), 5.0);
        assert_eq!(distance_to_point(&lo, &hi, &Vec3::new(3.0, 3.0, 2.0)), 3.0);
    }

    #[test]
    fn test_distance_along_line() {
        let (lo, hi) = unit();
        let o = Vec3::new(-5.0, 0.0, 0.0);
        assert_eq!(distance_along_line(&lo, &hi, &o, &Vec3::x(), 0.0, f64::INFINITY), 4.0);
        assert_eq!(distance_along_line(&lo, &hi, &o, &(-Vec3::x()), f64::NEG_INFINITY, f64::INFINITY), 4.0);
        assert_eq!(distance_along_line(&lo, &hi, &Vec3::zeros(), &Vec3::x(), 0.0, f64::INFINITY), 0.0);
        assert_eq!(distance_along_line(&lo, &hi, &o, &Vec3::y(), 0.0, f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_plane_straddles() {
        let (lo, hi) = unit();
        assert!(plane_straddles(&lo, &hi, &Vec3::z(), 0.0));
        assert!(plane_straddles(&lo, &hi, &Vec3::z(), 1.0));
        assert!(!plane_straddles(&lo, &hi, &Vec3::z(), 1.5));
        let n = Vec3::new(1.0, 1.0, 1.0).normalize();
        assert!(plane_straddles(&lo, &hi, &n, 3f64.sqrt() - 1e-9));
        assert!(!plane_straddles(&lo, &hi, &n, 3f64.sqrt() + 1e-9));
    }
}
