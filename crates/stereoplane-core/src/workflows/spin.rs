use super::align::AlignmentReport;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondStereo;
use crate::engine::config::{AlignmentConfig, ConfigError};
use crate::engine::controller::{AlignmentController, ControllerState};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scene::{FixedViewer, RecordingRenderer};
use nalgebra::Vector3;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct SpinSettings {
    /// Simulated time, in seconds.
    pub duration: f64,
    /// Length of one frame, in seconds.
    pub frame_dt: f64,
    /// Camera direction; `None` skips camera alignment.
    pub viewer_forward: Option<Vector3<f64>>,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            // One full turn at the default speed plus both dwells.
            duration: 14.0,
            frame_dt: 1.0 / 60.0,
            viewer_forward: Some(Vector3::z()),
        }
    }
}

impl SpinSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_dt.is_finite() && self.frame_dt > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "frame_dt",
                reason: format!("must be a positive number of seconds, got {}", self.frame_dt),
            });
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "duration",
                reason: format!("must be a non-negative number of seconds, got {}", self.duration),
            });
        }
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        (self.duration / self.frame_dt).ceil() as u64
    }
}

/// Bond labels at one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinFrame {
    pub time: f64,
    pub angle: f64,
    pub state: ControllerState,
    pub labels: Vec<BondStereo>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinEvent {
    Paused { time: f64, mark: f64 },
    Resumed { time: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinReport {
    pub alignment: AlignmentReport,
    /// The labels at rest followed by one frame per bond refresh.
    pub frames: Vec<SpinFrame>,
    pub events: Vec<SpinEvent>,
    pub ticks: u64,
    pub bond_rerenders: usize,
    /// Whether the plane was exactly the same after the last frame as before the first.
    pub plane_stable: bool,
}

impl SpinReport {
    /// Number of label changes between consecutive frames, summed over bonds.
    pub fn label_flips(&self) -> usize {
        self.frames
            .windows(2)
            .map(|w| {
                w[0].labels
                    .iter()
                    .zip(&w[1].labels)
                    .filter(|(a, b)| a != b)
                    .count()
            })
            .sum()
    }
}

/// Aligns `molecule` and lets it turn for `settings.duration` seconds.
///
/// Auto rotation is forced on regardless of `config.rotation.enabled`.
///
/// # Arguments
///
/// * `molecule` - The molecule to spin.
/// * `config` - Plane and rotation parameters.
/// * `settings` - Simulated duration, frame length and camera direction.
/// * `reporter` - Receives one task increment per frame.
///
/// # Return
///
/// The alignment at rest, the label timeline and the pause events.
#[instrument(skip_all, name = "spin_workflow")]
pub fn run(
    molecule: impl Into<Arc<Molecule>>,
    config: &AlignmentConfig,
    settings: &SpinSettings,
    reporter: &ProgressReporter,
) -> Result<SpinReport, EngineError> {
    settings.validate()?;

    // === Phase 1: Fix the plane ===
    reporter.report(Progress::PhaseStart { name: "Alignment" });
    let mut config = config.clone();
    config.rotation.enabled = true;
    let renderer = RecordingRenderer::new();
    let mut controller = AlignmentController::new(config).with_renderer(renderer.clone());
    if let Some(forward) = settings.viewer_forward {
        controller = controller.with_viewer(FixedViewer::new(forward));
    }
    controller.initialize_for_molecule(molecule)?;
    let alignment = AlignmentReport::capture(&controller)?;
    let initial_plane = controller.plane().copied();
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Rotate ===
    let total = settings.frame_count();
    reporter.report(Progress::PhaseStart { name: "Rotation" });
    reporter.report(Progress::TaskStart { total_steps: total });

    let mut frames = vec![SpinFrame {
        time: 0.0,
        angle: controller.rotation_angle(),
        state: controller.state(),
        labels: controller.labels().to_vec(),
    }];
    let mut events = Vec::new();

    for tick in 1..=total {
        let time = tick as f64 * settings.frame_dt;
        let outcome = controller.tick(settings.frame_dt);
        if let Some(mark) = outcome.paused_at {
            debug!(time, mark, "Rotation paused.");
            reporter.message(format!("Paused at {:.0}° (t = {:.2} s)", mark, time));
            events.push(SpinEvent::Paused { time, mark });
        }
        if outcome.resumed {
            debug!(time, "Rotation resumed.");
            events.push(SpinEvent::Resumed { time });
        }
        if outcome.bonds_refreshed {
            frames.push(SpinFrame {
                time,
                angle: controller.rotation_angle(),
                state: controller.state(),
                labels: controller.labels().to_vec(),
            });
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let report = SpinReport {
        alignment,
        frames,
        events,
        ticks: total,
        bond_rerenders: renderer.bond_rerenders(),
        plane_stable: controller.plane().copied() == initial_plane,
    };
    info!(
        frames = report.frames.len(),
        pauses = report.events.len(),
        flips = report.label_flips(),
        "Spin complete."
    );
    Ok(report)
}
