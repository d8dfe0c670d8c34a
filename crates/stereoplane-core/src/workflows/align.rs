use crate::core::models::ids::{AtomIndex, BondIndex};
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondStereo;
use crate::engine::config::AlignmentConfig;
use crate::engine::controller::{AlignmentController, FitPath};
use crate::engine::error::EngineError;
use crate::engine::scene::{RecordingRenderer, Viewer};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Label of one bond at rest, right after the plane was fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct BondLabel {
    pub bond: BondIndex,
    pub atom_a: AtomIndex,
    pub atom_b: AtomIndex,
    pub stereo: BondStereo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    pub molecule: String,
    pub formula: String,
    pub fit_path: FitPath,
    pub plane_point: Point3<f64>,
    pub plane_normal: Vector3<f64>,
    pub anchor: AtomIndex,
    pub radius: f64,
    pub depth_threshold: f64,
    /// Signed depth of every atom, by atom index.
    pub atom_depths: Vec<f64>,
    pub bonds: Vec<BondLabel>,
    pub crossings: Vec<(BondIndex, Point3<f64>)>,
}

impl AlignmentReport {
    /// Builds a report from an initialized controller.
    pub(crate) fn capture(controller: &AlignmentController) -> Result<Self, EngineError> {
        let missing = || EngineError::Internal("controller holds no aligned molecule".into());
        let molecule = controller.molecule().ok_or_else(missing)?;
        let plane = controller.plane().ok_or_else(missing)?;
        let fit_path = controller.fit_path().ok_or_else(missing)?.clone();

        let atom_depths = (0..molecule.atoms().len())
            .filter_map(|i| controller.atom_depth(i))
            .collect();
        let bonds = molecule
            .bonds()
            .iter()
            .zip(controller.labels())
            .enumerate()
            .map(|(bond, (b, stereo))| BondLabel {
                bond,
                atom_a: b.atom_a,
                atom_b: b.atom_b,
                stereo: *stereo,
            })
            .collect();

        Ok(Self {
            molecule: molecule.name.clone(),
            formula: molecule.display_formula(),
            fit_path,
            plane_point: plane.point,
            plane_normal: plane.normal,
            anchor: controller.anchor().ok_or_else(missing)?,
            radius: controller.radius().ok_or_else(missing)?,
            depth_threshold: plane.depth_threshold,
            atom_depths,
            bonds,
            crossings: controller.crossing_points(),
        })
    }

    /// Number of bonds with each label, as `(plain, wedge, dash)`.
    pub fn label_counts(&self) -> (usize, usize, usize) {
        self.bonds
            .iter()
            .fold((0, 0, 0), |(plain, wedge, dash), b| match b.stereo {
                BondStereo::None => (plain + 1, wedge, dash),
                BondStereo::Up => (plain, wedge + 1, dash),
                BondStereo::Down => (plain, wedge, dash + 1),
            })
    }
}

/// Fixes the viewing plane of `molecule` and reports it along with the bond labels.
///
/// Auto rotation is not run; the report reflects the molecule at rest after camera
/// alignment.
///
/// # Arguments
///
/// * `molecule` - The molecule to align.
/// * `config` - Plane and rotation parameters.
/// * `viewer` - Where the camera looks; without one the camera alignment step is skipped.
///
/// # Errors
///
/// Any [`EngineError`] raised by
/// [`AlignmentController::initialize_for_molecule`].
#[instrument(skip_all, name = "alignment_workflow")]
pub fn run(
    molecule: impl Into<Arc<Molecule>>,
    config: &AlignmentConfig,
    viewer: Option<Box<dyn Viewer>>,
) -> Result<AlignmentReport, EngineError> {
    let mut controller =
        AlignmentController::new(config.clone()).with_renderer(RecordingRenderer::new());
    controller.set_viewer(viewer);
    controller.initialize_for_molecule(molecule)?;

    let report = AlignmentReport::capture(&controller)?;
    for label in &report.bonds {
        debug!(
            bond = label.bond,
            a = label.atom_a,
            b = label.atom_b,
            stereo = %label.stereo,
            "Bond classified."
        );
    }
    let (plain, wedge, dash) = report.label_counts();
    info!(
        molecule = %report.molecule,
        plain,
        wedge,
        dash,
        "Alignment complete."
    );
    Ok(report)
}
