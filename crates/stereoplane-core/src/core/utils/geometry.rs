use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};

const PARALLEL_EPSILON: f64 = 1e-9;

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Antiparallel inputs have no unique shortest arc; a half turn about an axis
/// perpendicular to `from` is returned instead. Zero-length inputs yield `None`.
pub fn rotation_to_align(from: &Vector3<f64>, to: &Vector3<f64>) -> Option<UnitQuaternion<f64>> {
    let from = from.try_normalize(PARALLEL_EPSILON)?;
    let to = to.try_normalize(PARALLEL_EPSILON)?;
    if let Some(rotation) = UnitQuaternion::rotation_between(&from, &to) {
        return Some(rotation);
    }
    if from.dot(&to) > 0.0 {
        return Some(UnitQuaternion::identity());
    }
    let axis = any_perpendicular(&from);
    Some(UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI))
}

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Rigid motion that rotates by `rotation` while keeping `pivot` fixed.
pub fn rotation_about_point(pivot: &Point3<f64>, rotation: UnitQuaternion<f64>) -> Isometry3<f64> {
    let to_pivot = Translation3::from(pivot.coords);
    let from_pivot = Translation3::from(-pivot.coords);
    Isometry3::from_parts(to_pivot, UnitQuaternion::identity())
        * Isometry3::from_parts(Translation3::identity(), rotation)
        * Isometry3::from_parts(from_pivot, UnitQuaternion::identity())
}

fn any_perpendicular(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&helper))
}
