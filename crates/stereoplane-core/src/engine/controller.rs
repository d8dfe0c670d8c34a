//! # Alignment Controller
//!
//! Owns the molecule currently on display, fixes its viewing plane once per load and
//! drives the continuous rotation that moves atoms through that plane.
//!
//! ## States
//!
//! ```text
//! Uninitialized ──initialize──▶ PlaneFixed ──(auto rotation)──▶ Rotating ⇄ Paused
//!                                   │                              │
//!                                   └──────── stop / interact ─────┴──▶ ManualControl
//!                                                                        │ idle timeout
//!                                                                        ▼
//!                                                                     Rotating
//! any ──destroy──▶ Destroyed
//! ```
//!
//! ## Invariants
//!
//! - The fixed plane (point and normal) is written once by
//!   [`initialize_for_molecule`](AlignmentController::initialize_for_molecule) and never
//!   touched again until the next successful initialization. Ticks and manual rotations
//!   only move the molecule's [`Pose`].
//! - A failed initialization leaves every field exactly as it was.
//! - World positions are indexed by atom id, which is also what bonds store.

use super::classify::{self, FixedPlane};
use super::config::AlignmentConfig;
use super::error::EngineError;
use super::fitting::{FitInput, NormalSource, PlaneFitter};
use super::pose::Pose;
use super::rules::{PlaneRuleRegistry, normalize_name};
use super::scene::{AtomInstance, BondInstance, SceneRenderer, Viewer};
use crate::core::models::ids::{AtomIndex, BondIndex};
use crate::core::models::molecule::{Molecule, mean_position};
use crate::core::models::topology::BondStereo;
use crate::core::utils::geometry::{rotation_about_point, rotation_from_axis_angle, rotation_to_align};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Angles (degrees) at which auto rotation dwells.
pub const HALF_TURN: f64 = 180.0;
pub const FULL_TURN: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    PlaneFixed,
    Rotating,
    Paused,
    ManualControl,
    Destroyed,
}

/// How the plane of the current molecule was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum FitPath {
    /// A named plane rule matched the molecule.
    Rule(String),
    /// The general fitter chose the normal.
    General {
        source: NormalSource,
        atom_score: usize,
        bond_score: usize,
    },
}

/// What happened during one [`tick`](AlignmentController::tick).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEvents {
    /// Degrees turned this frame.
    pub rotated_by: f64,
    /// Set when the frame crossed a dwell mark.
    pub paused_at: Option<f64>,
    pub resumed: bool,
    pub bonds_refreshed: bool,
    pub auto_rotation_restarted: bool,
}

struct Alignment {
    molecule: Arc<Molecule>,
    local: Vec<Point3<f64>>,
    pose: Pose,
    world: Vec<Point3<f64>>,
    plane: FixedPlane,
    anchor: AtomIndex,
    radius: f64,
    fit_path: FitPath,
    labels: Vec<BondStereo>,
}

impl Alignment {
    fn refresh_world(&mut self) {
        self.world = self.pose.world_positions(&self.local);
    }

    fn relabel(&mut self) {
        self.labels = label_bonds(&self.molecule, &self.world, &self.plane);
    }

    fn atom_instances(&self) -> Vec<AtomInstance> {
        self.molecule
            .atoms()
            .iter()
            .zip(&self.world)
            .map(|(atom, position)| AtomInstance {
                index: atom.id,
                element: atom.element.clone(),
                position: *position,
            })
            .collect()
    }

    fn bond_instances(&self) -> Vec<BondInstance> {
        self.molecule
            .bonds()
            .iter()
            .enumerate()
            .filter_map(|(index, bond)| {
                Some(BondInstance {
                    bond: index,
                    start: *self.world.get(bond.atom_a)?,
                    end: *self.world.get(bond.atom_b)?,
                    order: bond.order,
                    stereo: self.labels.get(index).copied().unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RotationClock {
    angle: f64,
    pause_elapsed: f64,
    refresh_elapsed: f64,
    idle_elapsed: f64,
}

pub struct AlignmentController {
    config: AlignmentConfig,
    fitter: PlaneFitter,
    rules: PlaneRuleRegistry,
    renderer: Option<Box<dyn SceneRenderer>>,
    viewer: Option<Box<dyn Viewer>>,
    state: ControllerState,
    alignment: Option<Alignment>,
    clock: RotationClock,
}

impl AlignmentController {
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            fitter: PlaneFitter::new(config.depth_threshold_factor),
            config,
            rules: PlaneRuleRegistry::with_builtin_rules(),
            renderer: None,
            viewer: None,
            state: ControllerState::Uninitialized,
            alignment: None,
            clock: RotationClock::default(),
        }
    }

    pub fn with_rules(mut self, rules: PlaneRuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_renderer(mut self, renderer: impl SceneRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_viewer(mut self, viewer: impl Viewer + 'static) -> Self {
        self.viewer = Some(Box::new(viewer));
        self
    }

    pub fn set_renderer(&mut self, renderer: Option<Box<dyn SceneRenderer>>) {
        self.renderer = renderer;
    }

    pub fn set_viewer(&mut self, viewer: Option<Box<dyn Viewer>>) {
        self.viewer = viewer;
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    pub fn rules(&self) -> &PlaneRuleRegistry {
        &self.rules
    }

    /// Fits and locks the viewing plane for `molecule`, replacing the current one.
    ///
    /// Named molecules with a registered plane rule use that rule; everything else goes
    /// through the general fitter, after which the molecule is turned about its anchor
    /// atom so the fitted normal points along the configured target direction. Both paths
    /// then turn the molecule about the plane point so the normal matches the viewer's
    /// forward direction, lock the plane, render, and start auto rotation if enabled.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Destroyed`] after [`destroy`](Self::destroy)
    /// - [`EngineError::EmptyMolecule`] for a molecule without atoms
    /// - [`EngineError::InvalidMolecule`] if a bond references a missing atom or an atom
    ///   position is not finite
    /// - [`EngineError::Rule`] if the matching plane rule cannot be applied
    ///
    /// On error the controller is left exactly as it was.
    pub fn initialize_for_molecule(
        &mut self,
        molecule: impl Into<Arc<Molecule>>,
    ) -> Result<(), EngineError> {
        if self.state == ControllerState::Destroyed {
            warn!("Ignoring molecule load on a destroyed controller.");
            return Err(EngineError::Destroyed);
        }
        let molecule = molecule.into();
        if molecule.is_empty() {
            warn!(name = %molecule.name, "Molecule has no atoms; keeping the current state.");
            return Err(EngineError::EmptyMolecule {
                name: molecule.name.clone(),
            });
        }
        if let Err(e) = molecule.validate() {
            warn!(name = %molecule.name, error = %e, "Invalid molecule; keeping the current state.");
            return Err(e.into());
        }

        let alignment = self.align(molecule)?;
        info!(
            name = %alignment.molecule.name,
            path = ?alignment.fit_path,
            anchor = alignment.anchor,
            point = ?alignment.plane.point,
            normal = ?alignment.plane.normal,
            threshold = alignment.plane.depth_threshold,
            "Viewing plane fixed."
        );

        self.alignment = Some(alignment);
        self.clock = RotationClock::default();
        self.state = ControllerState::PlaneFixed;
        self.render_full();
        if self.config.rotation.enabled {
            self.state = ControllerState::Rotating;
        }
        Ok(())
    }

    fn align(&self, molecule: Arc<Molecule>) -> Result<Alignment, EngineError> {
        let local = molecule.positions();
        let mut pose = Pose::identity();
        let mut world = pose.world_positions(&local);

        let (mut centroid, anchor, mut normal, fit_path) = match self.rules.get(&molecule.name) {
            Some(rule) => {
                let rule_name = normalize_name(&molecule.name);
                let setup = rule.apply(&molecule, &world).map_err(|source| {
                    warn!(rule = %rule_name, error = %source, "Plane rule failed.");
                    EngineError::Rule {
                        rule: rule_name.clone(),
                        source,
                    }
                })?;
                debug!(rule = %rule_name, "Plane taken from rule.");
                (setup.centroid, setup.anchor, setup.normal, FitPath::Rule(rule_name))
            }
            None => self.fit_general(&molecule, &world)?,
        };

        if let FitPath::General { .. } = fit_path {
            let target = self.config.target_normal;
            if let (Some(rotation), Some(pivot)) =
                (rotation_to_align(&normal, &target), world.get(anchor).copied())
            {
                let motion = rotation_about_point(&pivot, rotation);
                pose.compose(&motion);
                centroid = motion * centroid;
                normal = target;
                world = pose.world_positions(&local);
            }
        }

        let radius = max_distance(&world, &centroid);

        match &self.viewer {
            Some(viewer) => match finite_unit(&viewer.forward()) {
                Some(forward) => {
                    if let Some(rotation) = rotation_to_align(&normal, &forward) {
                        pose.rotate_about(&centroid, rotation);
                        normal = forward;
                        world = pose.world_positions(&local);
                    }
                }
                None => warn!("Viewer forward direction is degenerate; skipping camera alignment."),
            },
            None => warn!("No viewer attached; skipping camera alignment."),
        }

        let normal = finite_unit(&normal).unwrap_or_else(Vector3::z);
        let plane = FixedPlane {
            point: centroid,
            normal,
            depth_threshold: radius * self.config.depth_threshold_factor,
        };
        let labels = label_bonds(&molecule, &world, &plane);

        Ok(Alignment {
            molecule,
            local,
            pose,
            world,
            plane,
            anchor,
            radius,
            fit_path,
            labels,
        })
    }

    fn fit_general(
        &self,
        molecule: &Molecule,
        world: &[Point3<f64>],
    ) -> Result<(Point3<f64>, AtomIndex, Vector3<f64>, FitPath), EngineError> {
        let carbons = molecule.carbon_indices();
        let subset: Vec<Point3<f64>> = if carbons.is_empty() {
            world.to_vec()
        } else {
            carbons.iter().filter_map(|&i| world.get(i).copied()).collect()
        };
        let centroid = mean_position(subset.iter().copied())
            .ok_or_else(|| EngineError::Internal("fitting subset is empty".into()))?;
        let anchor = closest_atom(world, &centroid)
            .ok_or_else(|| EngineError::Internal("no atom positions".into()))?;
        let radius = max_distance(world, &centroid);

        let fit = self.fitter.fit(&FitInput {
            points: &subset,
            center: centroid,
            reference_radius: radius,
            all_positions: world,
            bonds: molecule.bonds(),
        });
        debug!(
            carbons = carbons.len(),
            atom_score = fit.atom_score,
            bond_score = fit.bond_score,
            threshold = fit.threshold,
            "General fit selected a normal."
        );
        Ok((
            centroid,
            anchor,
            fit.normal,
            FitPath::General {
                source: fit.source,
                atom_score: fit.atom_score,
                bond_score: fit.bond_score,
            },
        ))
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Non-finite or non-positive steps are ignored.
    pub fn tick(&mut self, dt: f64) -> TickEvents {
        let mut events = TickEvents::default();
        if !(dt.is_finite() && dt > 0.0) {
            return events;
        }

        match self.state {
            ControllerState::Rotating => self.advance_rotation(dt, &mut events),
            ControllerState::Paused => {
                self.clock.refresh_elapsed += dt;
                self.clock.pause_elapsed += dt;
                if self.clock.pause_elapsed >= self.config.rotation.pause_duration {
                    self.clock.pause_elapsed = 0.0;
                    self.state = ControllerState::Rotating;
                    events.resumed = true;
                    debug!("Resuming rotation after pause.");
                }
            }
            ControllerState::ManualControl => {
                self.clock.idle_elapsed += dt;
                if self.config.rotation.enabled
                    && self.clock.idle_elapsed >= self.config.rotation.resume_after_inactivity
                {
                    info!("No interaction for a while; restarting auto rotation.");
                    self.start_auto_rotation();
                    events.auto_rotation_restarted = true;
                }
            }
            _ => {}
        }
        events
    }

    fn advance_rotation(&mut self, dt: f64, events: &mut TickEvents) {
        let Some(alignment) = self.alignment.as_mut() else {
            return;
        };
        self.clock.refresh_elapsed += dt;

        let step = self.config.rotation.speed_deg_per_sec * dt;
        let previous = self.clock.angle;
        let mut angle = previous + step.abs();

        let rotation = rotation_from_axis_angle(&self.config.up_axis, step);
        alignment.pose.rotate_about(&alignment.plane.point, rotation);
        alignment.refresh_world();
        events.rotated_by = step;

        let mark = if angle >= FULL_TURN {
            angle = 0.0;
            Some(FULL_TURN)
        } else if previous < HALF_TURN && angle >= HALF_TURN {
            Some(HALF_TURN)
        } else {
            None
        };
        self.clock.angle = angle;
        if let Some(mark) = mark {
            self.state = ControllerState::Paused;
            self.clock.pause_elapsed = 0.0;
            events.paused_at = Some(mark);
            debug!(mark, "Pausing rotation.");
        }

        if self.clock.refresh_elapsed >= self.config.rotation.bond_refresh_interval {
            self.clock.refresh_elapsed = 0.0;
            alignment.relabel();
            push_bonds(&mut self.renderer, alignment);
            events.bonds_refreshed = true;
        }
    }

    /// Starts (or restarts) auto rotation from angle zero.
    pub fn start_auto_rotation(&mut self) {
        if self.alignment.is_none() || self.state == ControllerState::Destroyed {
            warn!("Cannot start auto rotation without a molecule.");
            return;
        }
        self.clock.angle = 0.0;
        self.clock.pause_elapsed = 0.0;
        self.clock.idle_elapsed = 0.0;
        self.state = ControllerState::Rotating;
        debug!("Auto rotation started.");
    }

    /// Hands control to the user; auto rotation restarts after the inactivity timeout.
    pub fn stop_auto_rotation(&mut self) {
        if self.alignment.is_none() || self.state == ControllerState::Destroyed {
            return;
        }
        self.clock.idle_elapsed = 0.0;
        self.state = ControllerState::ManualControl;
        debug!("Auto rotation stopped; manual control active.");
    }

    /// Records user interaction: stops auto rotation and resets the inactivity timer.
    pub fn notify_interaction(&mut self) {
        match self.state {
            ControllerState::Rotating | ControllerState::Paused | ControllerState::PlaneFixed => {
                self.stop_auto_rotation()
            }
            ControllerState::ManualControl => self.clock.idle_elapsed = 0.0,
            ControllerState::Uninitialized | ControllerState::Destroyed => {}
        }
    }

    /// Turns the molecule about its anchor atom's current world position.
    ///
    /// Bonds are relabelled and redrawn; the fixed plane does not move. No-op before a
    /// molecule is loaded. The controller state is left alone: input handlers call
    /// [`notify_interaction`](Self::notify_interaction) to take over from auto rotation.
    pub fn rotate_around_anchor(&mut self, rotation: UnitQuaternion<f64>) {
        let Some(alignment) = self.alignment.as_mut() else {
            debug!("Ignoring manual rotation without a molecule.");
            return;
        };
        let Some(pivot) = alignment.world.get(alignment.anchor).copied() else {
            return;
        };
        alignment.pose.rotate_about(&pivot, rotation);
        alignment.refresh_world();
        alignment.relabel();
        push_bonds(&mut self.renderer, alignment);
        self.clock.idle_elapsed = 0.0;
    }

    /// Turns by `dy` degrees about world Y, then `dx` degrees about world X, both through
    /// the anchor atom.
    pub fn rotate_around_anchor_euler(&mut self, dx: f64, dy: f64) {
        let rotation = rotation_from_axis_angle(&Vector3::x(), dx)
            * rotation_from_axis_angle(&Vector3::y(), dy);
        self.rotate_around_anchor(rotation);
    }

    /// Label of bond `index` at the current pose; `None` before initialization.
    pub fn classify_bond(&self, index: BondIndex) -> BondStereo {
        let Some(alignment) = &self.alignment else {
            return BondStereo::None;
        };
        let Some(bond) = alignment.molecule.bonds().get(index) else {
            return BondStereo::None;
        };
        match (alignment.world.get(bond.atom_a), alignment.world.get(bond.atom_b)) {
            (Some(a), Some(b)) => classify::classify_bond(Some(&alignment.plane), a, b),
            _ => BondStereo::None,
        }
    }

    /// Labels of every bond at the current pose.
    pub fn classify_all(&self) -> Vec<BondStereo> {
        match &self.alignment {
            Some(a) => label_bonds(&a.molecule, &a.world, &a.plane),
            None => Vec::new(),
        }
    }

    /// Signed depth of an atom against the fixed plane; negative is toward the viewer.
    pub fn atom_depth(&self, index: AtomIndex) -> Option<f64> {
        let alignment = self.alignment.as_ref()?;
        alignment
            .world
            .get(index)
            .map(|p| alignment.plane.depth_of(p))
    }

    /// Bonds whose ends lie on opposite sides of the plane, with the point where they
    /// pierce it.
    pub fn crossing_points(&self) -> Vec<(BondIndex, Point3<f64>)> {
        let Some(alignment) = &self.alignment else {
            return Vec::new();
        };
        let plane = alignment.plane.as_plane();
        alignment
            .molecule
            .bonds()
            .iter()
            .enumerate()
            .filter_map(|(index, bond)| {
                let a = alignment.world.get(bond.atom_a)?;
                let b = alignment.world.get(bond.atom_b)?;
                plane.intersect_segment(a, b).map(|p| (index, p))
            })
            .collect()
    }

    /// Drops the molecule and collaborators. Later calls are no-ops.
    pub fn destroy(&mut self) {
        self.alignment = None;
        self.renderer = None;
        self.viewer = None;
        self.clock = RotationClock::default();
        self.state = ControllerState::Destroyed;
        debug!("Alignment controller destroyed.");
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn molecule(&self) -> Option<&Arc<Molecule>> {
        self.alignment.as_ref().map(|a| &a.molecule)
    }

    pub fn plane(&self) -> Option<&FixedPlane> {
        self.alignment.as_ref().map(|a| &a.plane)
    }

    pub fn anchor(&self) -> Option<AtomIndex> {
        self.alignment.as_ref().map(|a| a.anchor)
    }

    pub fn anchor_position(&self) -> Option<Point3<f64>> {
        let a = self.alignment.as_ref()?;
        a.world.get(a.anchor).copied()
    }

    /// The plane point, which is also the centre of auto rotation.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        self.alignment.as_ref().map(|a| a.plane.point)
    }

    pub fn radius(&self) -> Option<f64> {
        self.alignment.as_ref().map(|a| a.radius)
    }

    pub fn fit_path(&self) -> Option<&FitPath> {
        self.alignment.as_ref().map(|a| &a.fit_path)
    }

    pub fn world_positions(&self) -> &[Point3<f64>] {
        self.alignment.as_ref().map_or(&[], |a| a.world.as_slice())
    }

    /// Labels from the most recent relabel pass.
    pub fn labels(&self) -> &[BondStereo] {
        self.alignment.as_ref().map_or(&[], |a| a.labels.as_slice())
    }

    /// Cumulative auto-rotation angle in the current cycle, in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.clock.angle
    }

    fn render_full(&mut self) {
        let Some(alignment) = &self.alignment else {
            return;
        };
        match self.renderer.as_mut() {
            Some(renderer) => {
                renderer.render_molecule(&alignment.atom_instances(), &alignment.bond_instances())
            }
            None => warn!("No renderer attached; skipping molecule render."),
        }
    }
}

impl Default for AlignmentController {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

fn push_bonds(renderer: &mut Option<Box<dyn SceneRenderer>>, alignment: &Alignment) {
    if let Some(renderer) = renderer.as_mut() {
        renderer.rerender_bonds_only(&alignment.bond_instances());
    }
}

fn label_bonds(molecule: &Molecule, world: &[Point3<f64>], plane: &FixedPlane) -> Vec<BondStereo> {
    molecule
        .bonds()
        .iter()
        .map(|bond| match (world.get(bond.atom_a), world.get(bond.atom_b)) {
            (Some(a), Some(b)) => classify::classify_bond(Some(plane), a, b),
            _ => BondStereo::None,
        })
        .collect()
}

fn closest_atom(positions: &[Point3<f64>], target: &Point3<f64>) -> Option<AtomIndex> {
    positions
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - target)
                .norm_squared()
                .total_cmp(&(*b - target).norm_squared())
        })
        .map(|(i, _)| i)
}

fn max_distance(positions: &[Point3<f64>], center: &Point3<f64>) -> f64 {
    positions
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max)
}

fn finite_unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    v.try_normalize(1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondOrder;
    use crate::engine::config::AlignmentConfigBuilder;
    use crate::core::models::molecule::MoleculeError;
    use crate::engine::rules::RuleError;
    use crate::engine::scene::{FixedViewer, RecordingRenderer};

    const TOL: f64 = 1e-9;

    fn water() -> Molecule {
        let mut m = Molecule::new("water");
        let o = m.add_atom("O", Point3::origin());
        let h1 = m.add_atom("H", Point3::new(0.96, 0.0, 0.0));
        let h2 = m.add_atom("H", Point3::new(-0.24, 0.93, 0.0));
        m.add_bond(o, h1, BondOrder::Single, BondStereo::None).unwrap();
        m.add_bond(o, h2, BondOrder::Single, BondStereo::None).unwrap();
        m
    }

    fn keto_fragment() -> Molecule {
        let mut m = Molecule::new("keto fragment");
        let c1 = m.add_atom("C", Point3::new(0.0, 0.0, 0.0));
        let c2 = m.add_atom("C", Point3::new(1.5, 0.0, 0.0));
        let o = m.add_atom("O", Point3::new(2.0, 1.4, 0.0));
        let h = m.add_atom("H", Point3::new(0.0, 0.3, 1.0));
        m.add_bond(c1, c2, BondOrder::Single, BondStereo::None).unwrap();
        m.add_bond(c2, o, BondOrder::Double, BondStereo::None).unwrap();
        m.add_bond(c1, h, BondOrder::Single, BondStereo::Up).unwrap();
        m
    }

    fn tetrahedron() -> Molecule {
        let a = (2.0f64 / 3.0).sqrt();
        let b = (1.0f64 / 3.0).sqrt();
        let mut m = Molecule::new("tetrahedral centre");
        let c = m.add_atom("C", Point3::origin());
        for p in [
            Point3::new(a, 0.0, b),
            Point3::new(-a, 0.0, b),
            Point3::new(0.0, a, -b),
            Point3::new(0.0, -a, -b),
        ] {
            let h = m.add_atom("H", p);
            m.add_bond(c, h, BondOrder::Single, BondStereo::None).unwrap();
        }
        m
    }

    fn spin_config(speed: f64) -> AlignmentConfig {
        AlignmentConfigBuilder::new()
            .rotation_speed(speed)
            .pause_duration(1.0)
            .bond_refresh_interval(0.5)
            .resume_after_inactivity(5.0)
            .build()
            .unwrap()
    }

    #[test]
    fn water_uses_oxygen_as_anchor_and_plane_point() {
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(water()).unwrap();

        assert_eq!(controller.anchor(), Some(0));
        assert_eq!(controller.centroid(), Some(Point3::origin()));
        let expected = Vector3::new(0.96, 0.0, 0.0)
            .cross(&Vector3::new(-0.24, 0.93, 0.0))
            .normalize();
        let plane = controller.plane().unwrap();
        assert!((plane.normal - expected).norm() < TOL);
        assert!((plane.normal.norm() - 1.0).abs() < 1e-5);
        assert_eq!(controller.fit_path(), Some(&FitPath::Rule("water".into())));
        assert_eq!(controller.state(), ControllerState::Rotating);
    }

    #[test]
    fn empty_molecule_is_rejected_and_state_is_kept() {
        let mut controller = AlignmentController::default();
        let err = controller
            .initialize_for_molecule(Molecule::new("nothing"))
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyMolecule { .. }));
        assert_eq!(controller.state(), ControllerState::Uninitialized);
        assert!(controller.plane().is_none());

        controller.initialize_for_molecule(water()).unwrap();
        let plane = *controller.plane().unwrap();
        assert!(controller
            .initialize_for_molecule(Molecule::new("nothing"))
            .is_err());
        assert_eq!(controller.plane(), Some(&plane));
        assert_eq!(controller.molecule().unwrap().name, "water");
    }

    #[test]
    fn non_finite_positions_are_rejected_and_state_is_kept() {
        let mut controller = AlignmentController::default();
        let mut bad = Molecule::new("broken");
        bad.add_atom("C", Point3::origin());
        bad.add_atom("C", Point3::new(1.5, 0.0, f64::NAN));
        bad.add_atom("O", Point3::new(2.0, 1.4, 0.0));
        let err = controller.initialize_for_molecule(bad.clone()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidMolecule {
                source: MoleculeError::NonFinitePosition { atom: 1 }
            }
        ));
        assert_eq!(controller.state(), ControllerState::Uninitialized);
        assert!(controller.plane().is_none());

        controller.initialize_for_molecule(water()).unwrap();
        let plane = *controller.plane().unwrap();
        assert!(plane.point.iter().all(|c| c.is_finite()));
        assert!(controller.initialize_for_molecule(bad).is_err());
        assert_eq!(controller.plane(), Some(&plane));
        assert_eq!(controller.molecule().unwrap().name, "water");
    }

    #[test]
    fn failing_rule_aborts_without_partial_fix() {
        let mut controller = AlignmentController::default();
        let mut broken = Molecule::new("Water");
        broken.add_atom("O", Point3::origin());
        broken.add_atom("H", Point3::new(1.0, 0.0, 0.0));
        match controller.initialize_for_molecule(broken) {
            Err(EngineError::Rule { rule, source }) => {
                assert_eq!(rule, "water");
                assert!(matches!(source, RuleError::TooFew { element: "H", .. }));
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert_eq!(controller.state(), ControllerState::Uninitialized);
    }

    #[test]
    fn general_path_orients_fitted_normal_to_target_and_keeps_anchor() {
        let config = AlignmentConfigBuilder::new()
            .depth_threshold_factor(0.1)
            .auto_rotation(false)
            .build()
            .unwrap();
        let mut controller = AlignmentController::new(config);
        controller.initialize_for_molecule(tetrahedron()).unwrap();

        assert_eq!(controller.state(), ControllerState::PlaneFixed);
        assert_eq!(controller.anchor(), Some(0));
        assert!((controller.anchor_position().unwrap() - Point3::origin()).norm() < TOL);
        match controller.fit_path() {
            Some(FitPath::General {
                atom_score,
                bond_score,
                ..
            }) => {
                assert_eq!(*atom_score, 1);
                assert_eq!(*bond_score, 2);
            }
            other => panic!("unexpected fit path: {:?}", other),
        }
        let plane = controller.plane().unwrap();
        assert_eq!(plane.normal, Vector3::z());
        assert!(controller.atom_depth(3).unwrap().abs() < TOL);
        assert!(controller.atom_depth(4).unwrap().abs() < TOL);
        assert!(controller.atom_depth(1).unwrap().abs() > 0.5);
    }

    #[test]
    fn general_path_normal_is_unit_length() {
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        let plane = controller.plane().unwrap();
        assert!((plane.normal.norm() - 1.0).abs() < 1e-5);
        assert!(plane.depth_threshold > 0.0);
        assert_eq!(controller.labels().len(), 3);
    }

    #[test]
    fn single_atom_molecule_gets_a_finite_plane() {
        let mut m = Molecule::new("helium-like");
        m.add_atom("He", Point3::new(1.0, 1.0, 1.0));
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(m).unwrap();
        let plane = controller.plane().unwrap();
        assert_eq!(plane.normal, Vector3::z());
        assert_eq!(plane.point, Point3::new(1.0, 1.0, 1.0));
        assert!(controller.classify_all().is_empty());
    }

    #[test]
    fn viewer_forward_becomes_plane_normal() {
        let forward = Vector3::new(0.0, 0.0, -1.0);
        let mut controller =
            AlignmentController::default().with_viewer(FixedViewer::new(forward));
        controller.initialize_for_molecule(water()).unwrap();

        let plane = controller.plane().unwrap();
        assert!((plane.normal - forward).norm() < TOL);
        assert_eq!(plane.point, Point3::origin());
        // The oxygen is the pivot and does not move.
        assert!((controller.world_positions()[0] - Point3::origin()).norm() < TOL);
        // All three atoms still lie in the plane.
        for i in 0..3 {
            assert!(controller.atom_depth(i).unwrap().abs() < TOL);
        }
    }

    #[test]
    fn plane_is_unchanged_by_ticks_and_manual_rotation() {
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        let plane = *controller.plane().unwrap();

        for _ in 0..1000 {
            controller.tick(1.0 / 60.0);
            assert_eq!(controller.plane(), Some(&plane));
        }
        controller.rotate_around_anchor_euler(15.0, -40.0);
        controller.stop_auto_rotation();
        controller.rotate_around_anchor(rotation_from_axis_angle(&Vector3::z(), 33.0));
        assert_eq!(controller.plane(), Some(&plane));
    }

    #[test]
    fn rotation_pauses_at_half_and_full_turn() {
        let mut controller = AlignmentController::new(spin_config(90.0));
        controller.initialize_for_molecule(keto_fragment()).unwrap();

        assert_eq!(controller.tick(1.0).paused_at, None);
        assert!((controller.rotation_angle() - 90.0).abs() < TOL);

        let events = controller.tick(1.0);
        assert_eq!(events.paused_at, Some(HALF_TURN));
        assert_eq!(controller.state(), ControllerState::Paused);

        assert!(!controller.tick(0.5).resumed);
        assert_eq!(controller.tick(0.5).rotated_by, 0.0);
        assert_eq!(controller.state(), ControllerState::Rotating);

        controller.tick(1.0);
        let events = controller.tick(1.0);
        assert_eq!(events.paused_at, Some(FULL_TURN));
        assert_eq!(controller.rotation_angle(), 0.0);
        assert_eq!(controller.state(), ControllerState::Paused);
    }

    #[test]
    fn full_turn_is_detected_even_when_frame_overshoots() {
        let mut controller = AlignmentController::new(spin_config(100.0));
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        // 100, 200 (half-turn pause), resume, 300, 400 -> full turn.
        controller.tick(1.0);
        assert_eq!(controller.tick(1.0).paused_at, Some(HALF_TURN));
        controller.tick(1.0);
        controller.tick(1.0);
        assert_eq!(controller.tick(1.0).paused_at, Some(FULL_TURN));
    }

    #[test]
    fn bonds_refresh_on_cadence_only_while_turning() {
        let renderer = RecordingRenderer::new();
        let mut controller =
            AlignmentController::new(spin_config(10.0)).with_renderer(renderer.clone());
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        assert_eq!(renderer.snapshot().full_renders, 1);

        let refreshed: Vec<bool> = (0..4).map(|_| controller.tick(0.25).bonds_refreshed).collect();
        assert_eq!(refreshed, vec![false, true, false, true]);
        assert_eq!(renderer.bond_rerenders(), 2);

        controller.stop_auto_rotation();
        controller.tick(0.25);
        controller.tick(0.25);
        assert_eq!(renderer.bond_rerenders(), 2);
    }

    #[test]
    fn refresh_timer_keeps_running_during_pause() {
        let renderer = RecordingRenderer::new();
        let config = AlignmentConfigBuilder::new()
            .rotation_speed(180.0)
            .pause_duration(1.0)
            .bond_refresh_interval(2.0)
            .build()
            .unwrap();
        let mut controller = AlignmentController::new(config).with_renderer(renderer.clone());
        controller.initialize_for_molecule(keto_fragment()).unwrap();

        // Half turn after 1 s; pause 1 s; the first turning frame after that refreshes.
        assert_eq!(controller.tick(1.0).paused_at, Some(HALF_TURN));
        assert!(controller.tick(1.0).resumed);
        assert_eq!(renderer.bond_rerenders(), 0);
        assert!(controller.tick(0.25).bonds_refreshed);
    }

    #[test]
    fn manual_control_resumes_after_inactivity() {
        let mut controller = AlignmentController::new(spin_config(30.0));
        controller.initialize_for_molecule(keto_fragment()).unwrap();

        controller.notify_interaction();
        assert_eq!(controller.state(), ControllerState::ManualControl);
        controller.tick(4.0);
        controller.notify_interaction();
        controller.tick(4.5);
        assert_eq!(controller.state(), ControllerState::ManualControl);
        let events = controller.tick(0.5);
        assert!(events.auto_rotation_restarted);
        assert_eq!(controller.state(), ControllerState::Rotating);
        assert_eq!(controller.rotation_angle(), 0.0);
    }

    #[test]
    fn manual_rotation_pivots_on_anchor_and_relabels() {
        let renderer = RecordingRenderer::new();
        let config = AlignmentConfigBuilder::new().auto_rotation(false).build().unwrap();
        let mut controller = AlignmentController::new(config).with_renderer(renderer.clone());
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        let anchor_before = controller.anchor_position().unwrap();

        controller.rotate_around_anchor_euler(0.0, 90.0);
        assert!((controller.anchor_position().unwrap() - anchor_before).norm() < TOL);
        assert_eq!(renderer.bond_rerenders(), 1);
        assert_eq!(controller.labels(), controller.classify_all().as_slice());
        for (i, label) in controller.labels().iter().enumerate() {
            assert_eq!(*label, controller.classify_bond(i));
        }
    }

    #[test]
    fn manual_rotation_leaves_state_to_notify_interaction() {
        let mut controller = AlignmentController::new(spin_config(30.0));
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        assert_eq!(controller.state(), ControllerState::Rotating);

        controller.rotate_around_anchor_euler(15.0, 0.0);
        assert_eq!(controller.state(), ControllerState::Rotating);

        controller.notify_interaction();
        controller.rotate_around_anchor_euler(15.0, 0.0);
        assert_eq!(controller.state(), ControllerState::ManualControl);
    }

    #[test]
    fn calls_before_initialization_are_harmless() {
        let mut controller = AlignmentController::default();
        assert_eq!(controller.classify_bond(0), BondStereo::None);
        assert!(controller.classify_all().is_empty());
        assert!(controller.atom_depth(0).is_none());
        controller.rotate_around_anchor_euler(10.0, 10.0);
        controller.start_auto_rotation();
        assert_eq!(controller.tick(0.1), TickEvents::default());
        assert_eq!(controller.state(), ControllerState::Uninitialized);
    }

    #[test]
    fn destroyed_controller_refuses_new_molecules() {
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(water()).unwrap();
        controller.destroy();
        assert_eq!(controller.state(), ControllerState::Destroyed);
        assert!(controller.plane().is_none());
        assert!(matches!(
            controller.initialize_for_molecule(water()),
            Err(EngineError::Destroyed)
        ));
        controller.tick(1.0);
        controller.start_auto_rotation();
        assert_eq!(controller.state(), ControllerState::Destroyed);
    }

    #[test]
    fn crossing_points_report_bonds_through_the_plane() {
        let mut m = Molecule::new("crossing chain");
        let a = m.add_atom("C", Point3::new(0.0, 0.0, -1.0));
        let b = m.add_atom("C", Point3::new(0.0, 0.0, 1.0));
        let c = m.add_atom("C", Point3::new(3.0, 0.0, 1.0));
        m.add_bond(a, b, BondOrder::Single, BondStereo::None).unwrap();
        m.add_bond(b, c, BondOrder::Single, BondStereo::None).unwrap();

        let mut controller = AlignmentController::new(
            AlignmentConfigBuilder::new().auto_rotation(false).build().unwrap(),
        );
        controller.initialize_for_molecule(m).unwrap();
        let plane = *controller.plane().unwrap();
        for (bond, point) in controller.crossing_points() {
            assert!(plane.depth_of(&point).abs() < 1e-9, "bond {}", bond);
        }
    }

    #[test]
    fn invalid_tick_steps_are_ignored() {
        let mut controller = AlignmentController::default();
        controller.initialize_for_molecule(keto_fragment()).unwrap();
        assert_eq!(controller.tick(0.0), TickEvents::default());
        assert_eq!(controller.tick(-1.0), TickEvents::default());
        assert_eq!(controller.tick(f64::NAN), TickEvents::default());
        assert_eq!(controller.rotation_angle(), 0.0);
    }
}
