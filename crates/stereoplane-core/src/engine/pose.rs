use crate::core::utils::geometry::rotation_about_point;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Rigid-body placement of a molecule in world space.
///
/// Atom coordinates stay in the molecule's own frame; the pose maps them to world
/// positions. Every motion applied here is expressed in world space and composed on the
/// left of the current pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    isometry: Isometry3<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
        }
    }

    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }

    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.isometry.rotation
    }

    #[inline]
    pub fn apply(&self, local: &Point3<f64>) -> Point3<f64> {
        self.isometry * local
    }

    pub fn world_positions(&self, local: &[Point3<f64>]) -> Vec<Point3<f64>> {
        local.iter().map(|p| self.apply(p)).collect()
    }

    /// Composes a world-space rigid motion onto the pose.
    pub fn compose(&mut self, motion: &Isometry3<f64>) {
        self.isometry = motion * self.isometry;
        self.isometry.rotation.renormalize();
    }

    /// Rotates about a world-space pivot, which keeps its world position.
    pub fn rotate_about(&mut self, pivot: &Point3<f64>, rotation: UnitQuaternion<f64>) {
        self.compose(&rotation_about_point(pivot, rotation));
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        self.compose(&Isometry3::from_parts(
            Translation3::from(*offset),
            UnitQuaternion::identity(),
        ));
    }
}
