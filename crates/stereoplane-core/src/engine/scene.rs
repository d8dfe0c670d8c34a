//! Collaborator interfaces of the alignment controller.
//!
//! The controller never draws anything itself. It hands atom and bond instances to a
//! [`SceneRenderer`] and reads the viewing direction from a [`Viewer`]. Both are
//! optional; a missing collaborator turns the corresponding step into a logged no-op.

use crate::core::models::ids::{AtomIndex, BondIndex};
use crate::core::models::topology::{BondOrder, BondStereo};
use nalgebra::{Point3, Vector3};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct AtomInstance {
    pub index: AtomIndex,
    pub element: String,
    /// World-space position in Angstroms.
    pub position: Point3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondInstance {
    pub bond: BondIndex,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

/// Consumer of atom and bond geometry.
pub trait SceneRenderer: Send {
    /// Draws the whole molecule, replacing whatever was drawn before.
    fn render_molecule(&mut self, atoms: &[AtomInstance], bonds: &[BondInstance]);

    /// Redraws bond geometry only; atom geometry is left as is.
    fn rerender_bonds_only(&mut self, bonds: &[BondInstance]);
}

/// Source of the viewing direction.
pub trait Viewer: Send {
    /// Direction the viewer looks along, in world space.
    fn forward(&self) -> Vector3<f64>;
}

/// A viewer that always looks the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewer {
    forward: Vector3<f64>,
}

impl FixedViewer {
    pub fn new(forward: Vector3<f64>) -> Self {
        Self { forward }
    }

    /// Looks down world +Z.
    pub fn looking_along_z() -> Self {
        Self::new(Vector3::z())
    }
}

impl Viewer for FixedViewer {
    fn forward(&self) -> Vector3<f64> {
        self.forward
    }
}

/// Everything a [`RecordingRenderer`] has been asked to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderLog {
    pub full_renders: usize,
    pub bond_rerenders: usize,
    pub last_atoms: Vec<AtomInstance>,
    pub last_bonds: Vec<BondInstance>,
}

/// Headless renderer that keeps the most recent frame in memory.
///
/// Clones share one log, so a caller can keep a handle after moving a clone into the
/// controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RenderLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the current log.
    pub fn snapshot(&self) -> RenderLog {
        self.lock().clone()
    }

    pub fn bond_rerenders(&self) -> usize {
        self.lock().bond_rerenders
    }
}

impl SceneRenderer for RecordingRenderer {
    fn render_molecule(&mut self, atoms: &[AtomInstance], bonds: &[BondInstance]) {
        let mut log = self.lock();
        log.full_renders += 1;
        log.last_atoms = atoms.to_vec();
        log.last_bonds = bonds.to_vec();
    }

    fn rerender_bonds_only(&mut self, bonds: &[BondInstance]) {
        let mut log = self.lock();
        log.bond_rerenders += 1;
        log.last_bonds = bonds.to_vec();
    }
}
