use nalgebra::{Point3, Vector3};

/// An infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Creates a plane, normalizing `normal`. Returns `None` for a zero or non-finite normal.
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        if !normal.iter().all(|c| c.is_finite()) {
            return None;
        }
        normal
            .try_normalize(1e-12)
            .map(|normal| Self { point, normal })
    }

    /// Signed distance of `p` along the normal. Negative values lie on the side the
    /// normal points away from.
    #[inline]
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.point).dot(&self.normal)
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal * self.signed_distance(p)
    }

    /// Point where segment `a`-`b` pierces the plane, if its ends lie strictly on
    /// opposite sides.
    pub fn intersect_segment(&self, a: &Point3<f64>, b: &Point3<f64>) -> Option<Point3<f64>> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        if da * db >= 0.0 {
            return None;
        }
        let t = da / (da - db);
        Some(a + (b - a) * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_plane() -> Plane {
        Plane::new(Point3::origin(), Vector3::new(0.0, 0.0, 2.0)).unwrap()
    }

    #[test]
    fn new_normalizes_and_rejects_degenerate_normals() {
        assert_eq!(xy_plane().normal, Vector3::z());
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_none());
        assert!(Plane::new(Point3::origin(), Vector3::new(f64::NAN, 0.0, 1.0)).is_none());
    }

    #[test]
    fn signed_distance_uses_normal_direction() {
        let plane = xy_plane();
        assert!((plane.signed_distance(&Point3::new(3.0, -1.0, 0.5)) - 0.5).abs() < 1e-12);
        assert!((plane.signed_distance(&Point3::new(0.0, 0.0, -2.0)) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn project_drops_normal_component() {
        let p = xy_plane().project(&Point3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn intersect_segment_finds_crossing_point() {
        let plane = xy_plane();
        let hit = plane
            .intersect_segment(&Point3::new(0.0, 0.0, -1.0), &Point3::new(2.0, 0.0, 3.0))
            .unwrap();
        assert!((hit - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn intersect_segment_ignores_same_side_and_touching_segments() {
        let plane = xy_plane();
        assert!(plane
            .intersect_segment(&Point3::new(0.0, 0.0, 1.0), &Point3::new(0.0, 0.0, 2.0))
            .is_none());
        assert!(plane
            .intersect_segment(&Point3::new(0.0, 0.0, 0.0), &Point3::new(0.0, 0.0, 2.0))
            .is_none());
    }
}
