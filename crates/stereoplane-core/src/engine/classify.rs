//! # Stereo Classifier
//!
//! Converts the signed depths of a bond's two atoms against the fixed viewing plane into
//! a wedge / dash / plain label.
//!
//! Negative depth is in front of the plane (toward the viewer) and maps to
//! [`BondStereo::Up`]; positive depth maps to [`BondStereo::Down`].
//!
//! A bond whose ends lie on opposite sides crosses the plane at the fraction
//! `t = |dA| / (|dA| + |dB|)` along A→B. A crossing in the middle half
//! (`0.25 ≤ t ≤ 0.75`) gives no clear bias and the bond is drawn plain. A crossing close
//! to one end means that end sits almost on the plane, so the label comes from the other
//! end's depth, which is the numerically stable one.

use crate::core::geometry::plane::Plane;
use crate::core::models::topology::BondStereo;
use nalgebra::{Point3, Vector3};

/// Lower and upper bounds of the central crossing band.
pub const CENTRAL_CROSSING_BAND: (f64, f64) = (0.25, 0.75);

/// The locked viewing plane of the current molecule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPlane {
    pub point: Point3<f64>,
    pub normal: Vector3<f64>,
    /// Distance within which an atom counts as lying on the plane.
    pub depth_threshold: f64,
}

impl FixedPlane {
    /// Signed depth of `p`; negative means toward the viewer.
    #[inline]
    pub fn depth_of(&self, p: &Point3<f64>) -> f64 {
        (p - self.point).dot(&self.normal)
    }

    /// `true` if `p` lies within the depth threshold of the plane.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        self.depth_of(p).abs() < self.depth_threshold
    }

    pub fn as_plane(&self) -> Plane {
        Plane {
            point: self.point,
            normal: self.normal,
        }
    }
}

fn label_for_depth(depth: f64) -> BondStereo {
    if depth < 0.0 {
        BondStereo::Up
    } else {
        BondStereo::Down
    }
}

/// Classifies the bond `a`-`b` against `plane`.
///
/// Returns [`BondStereo::None`] without computing anything when no plane has been fixed,
/// and when both atoms lie exactly on the plane.
pub fn classify_bond(plane: Option<&FixedPlane>, a: &Point3<f64>, b: &Point3<f64>) -> BondStereo {
    let Some(plane) = plane else {
        return BondStereo::None;
    };
    let da = plane.depth_of(a);
    let db = plane.depth_of(b);
    classify_depths(da, db)
}

/// Classification on precomputed depths.
pub fn classify_depths(da: f64, db: f64) -> BondStereo {
    if !da.is_finite() || !db.is_finite() {
        return BondStereo::None;
    }
    if da == 0.0 && db == 0.0 {
        return BondStereo::None;
    }

    if da * db < 0.0 {
        let t = da.abs() / (da.abs() + db.abs());
        let (low, high) = CENTRAL_CROSSING_BAND;
        return if (low..=high).contains(&t) {
            BondStereo::None
        } else if t < low {
            label_for_depth(db)
        } else {
            label_for_depth(da)
        };
    }

    label_for_depth((da + db) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_plane() -> FixedPlane {
        FixedPlane {
            point: Point3::origin(),
            normal: Vector3::z(),
            depth_threshold: 0.2,
        }
    }

    fn z(v: f64) -> Point3<f64> {
        Point3::new(0.0, 0.0, v)
    }

    fn classify(a: f64, b: f64) -> BondStereo {
        classify_bond(Some(&xy_plane()), &z(a), &z(b))
    }

    #[test]
    fn same_side_in_front_is_up_and_behind_is_down() {
        assert_eq!(classify(-1.0, -0.5), BondStereo::Up);
        assert_eq!(classify(1.0, 0.5), BondStereo::Down);
    }

    #[test]
    fn central_crossing_is_plain() {
        assert_eq!(classify(-1.0, 1.0), BondStereo::None);
        assert_eq!(classify(-1.0, 3.0), BondStereo::None);
        assert_eq!(classify(-3.0, 1.0), BondStereo::None);
    }

    #[test]
    fn crossing_near_a_uses_b_side() {
        assert_eq!(classify(-0.1, 1.0), BondStereo::Down);
        assert_eq!(classify(0.1, -1.0), BondStereo::Up);
    }

    #[test]
    fn crossing_near_b_uses_a_side() {
        assert_eq!(classify(-1.0, 0.1), BondStereo::Up);
        assert_eq!(classify(1.0, -0.1), BondStereo::Down);
    }

    #[test]
    fn label_is_independent_of_endpoint_order() {
        let depths = [-2.0, -1.0, -0.35, -0.1, 0.0, 0.05, 0.4, 1.0, 2.5];
        for &a in &depths {
            for &b in &depths {
                assert_eq!(classify(a, b), classify(b, a), "a={} b={}", a, b);
            }
        }
    }

    #[test]
    fn both_on_plane_is_plain() {
        assert_eq!(classify(0.0, 0.0), BondStereo::None);
    }

    #[test]
    fn one_end_on_plane_follows_the_other_end() {
        assert_eq!(classify(0.0, -0.5), BondStereo::Up);
        assert_eq!(classify(0.0, 0.5), BondStereo::Down);
    }

    #[test]
    fn missing_plane_yields_plain() {
        assert_eq!(classify_bond(None, &z(-1.0), &z(-1.0)), BondStereo::None);
    }

    #[test]
    fn non_finite_depths_yield_plain() {
        assert_eq!(classify_depths(f64::NAN, 1.0), BondStereo::None);
        assert_eq!(classify_depths(-1.0, f64::INFINITY), BondStereo::None);
    }

    #[test]
    fn depth_and_contains_use_the_threshold() {
        let plane = xy_plane();
        assert!((plane.depth_of(&Point3::new(4.0, 4.0, -0.3)) + 0.3).abs() < 1e-12);
        assert!(plane.contains(&z(0.1)));
        assert!(!plane.contains(&z(-0.25)));
        assert_eq!(plane.as_plane().normal, Vector3::z());
    }
}
