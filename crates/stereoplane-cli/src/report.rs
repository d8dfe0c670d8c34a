//! TOML reports and console summaries for `align` and `spin`.

use crate::error::{CliError, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use stereoplane::engine::controller::FitPath;
use stereoplane::engine::fitting::NormalSource;
use stereoplane::workflows::align::AlignmentReport;
use stereoplane::workflows::spin::{SpinEvent, SpinReport};
use tracing::info;

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct FitSection {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_score: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bond_score: Option<usize>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct PlaneSection {
    pub point: [f64; 3],
    pub normal: [f64; 3],
    pub anchor: usize,
    pub radius: f64,
    pub depth_threshold: f64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct BondEntry {
    pub index: usize,
    pub atom_a: usize,
    pub atom_b: usize,
    pub stereo: &'static str,
}

#[derive(Serialize, Debug)]
pub struct CrossingEntry {
    pub bond: usize,
    pub point: [f64; 3],
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct AlignmentDocument {
    pub molecule: String,
    pub formula: String,
    pub atom_depths: Vec<f64>,
    pub fit: FitSection,
    pub plane: PlaneSection,
    pub bonds: Vec<BondEntry>,
    pub crossings: Vec<CrossingEntry>,
}

#[derive(Serialize, Debug)]
pub struct FrameEntry {
    pub time: f64,
    pub angle: f64,
    pub state: String,
    pub labels: Vec<&'static str>,
}

#[derive(Serialize, Debug)]
pub struct EventEntry {
    pub kind: &'static str,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<f64>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct SpinSummary {
    pub ticks: u64,
    pub bond_rerenders: usize,
    pub label_flips: usize,
    pub plane_stable: bool,
}

#[derive(Serialize, Debug)]
pub struct SpinDocument {
    pub summary: SpinSummary,
    pub alignment: AlignmentDocument,
    pub events: Vec<EventEntry>,
    pub frames: Vec<FrameEntry>,
}

fn source_name(source: NormalSource) -> &'static str {
    match source {
        NormalSource::SmallestEigenvector => "smallest-eigenvector",
        NormalSource::DominantPlane => "dominant-plane",
        NormalSource::WorldAxis => "world-axis",
        NormalSource::DegenerateFallback => "degenerate-fallback",
    }
}

impl From<&FitPath> for FitSection {
    fn from(path: &FitPath) -> Self {
        match path {
            FitPath::Rule(rule) => Self {
                method: "rule",
                rule: Some(rule.clone()),
                normal_source: None,
                atom_score: None,
                bond_score: None,
            },
            FitPath::General {
                source,
                atom_score,
                bond_score,
            } => Self {
                method: "general",
                rule: None,
                normal_source: Some(source_name(*source)),
                atom_score: Some(*atom_score),
                bond_score: Some(*bond_score),
            },
        }
    }
}

impl From<&AlignmentReport> for AlignmentDocument {
    fn from(report: &AlignmentReport) -> Self {
        Self {
            molecule: report.molecule.clone(),
            formula: report.formula.clone(),
            atom_depths: report.atom_depths.clone(),
            fit: (&report.fit_path).into(),
            plane: PlaneSection {
                point: report.plane_point.coords.into(),
                normal: report.plane_normal.into(),
                anchor: report.anchor,
                radius: report.radius,
                depth_threshold: report.depth_threshold,
            },
            bonds: report
                .bonds
                .iter()
                .map(|b| BondEntry {
                    index: b.bond,
                    atom_a: b.atom_a,
                    atom_b: b.atom_b,
                    stereo: b.stereo.symbol(),
                })
                .collect(),
            crossings: report
                .crossings
                .iter()
                .map(|(bond, p)| CrossingEntry {
                    bond: *bond,
                    point: p.coords.into(),
                })
                .collect(),
        }
    }
}

impl From<&SpinReport> for SpinDocument {
    fn from(report: &SpinReport) -> Self {
        Self {
            summary: SpinSummary {
                ticks: report.ticks,
                bond_rerenders: report.bond_rerenders,
                label_flips: report.label_flips(),
                plane_stable: report.plane_stable,
            },
            alignment: (&report.alignment).into(),
            events: report
                .events
                .iter()
                .map(|e| match *e {
                    SpinEvent::Paused { time, mark } => EventEntry {
                        kind: "paused",
                        time,
                        mark: Some(mark),
                    },
                    SpinEvent::Resumed { time } => EventEntry {
                        kind: "resumed",
                        time,
                        mark: None,
                    },
                })
                .collect(),
            frames: report
                .frames
                .iter()
                .map(|f| FrameEntry {
                    time: f.time,
                    angle: f.angle,
                    state: format!("{:?}", f.state),
                    labels: f.labels.iter().map(|l| l.symbol()).collect(),
                })
                .collect(),
        }
    }
}

pub fn to_toml(document: &impl Serialize) -> Result<String> {
    toml::to_string_pretty(document).map_err(|e| CliError::Other(e.into()))
}

pub fn write_report(path: &Path, document: &impl Serialize) -> Result<()> {
    let content = to_toml(document)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!("Report written to {:?}", path);
    Ok(())
}

pub fn alignment_summary(report: &AlignmentReport) -> String {
    let mut out = String::new();
    let fit = FitSection::from(&report.fit_path);
    let _ = writeln!(out, "Molecule: {} ({})", report.molecule, report.formula);
    match &fit.rule {
        Some(rule) => {
            let _ = writeln!(out, "Plane:    rule '{}'", rule);
        }
        None => {
            let _ = writeln!(
                out,
                "Plane:    general fit ({}, {} atoms / {} bonds in plane)",
                fit.normal_source.unwrap_or("unknown"),
                fit.atom_score.unwrap_or(0),
                fit.bond_score.unwrap_or(0)
            );
        }
    }
    let p = report.plane_point;
    let n = report.plane_normal;
    let _ = writeln!(out, "  point   ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
    let _ = writeln!(out, "  normal  ({:.3}, {:.3}, {:.3})", n.x, n.y, n.z);
    let _ = writeln!(
        out,
        "  anchor  atom {}, radius {:.3} Å, threshold {:.3} Å",
        report.anchor + 1,
        report.radius,
        report.depth_threshold
    );
    let _ = writeln!(out, "Bonds:");
    for b in &report.bonds {
        let _ = writeln!(
            out,
            "  {:>3}  {:>3}-{:<3} {}",
            b.bond + 1,
            b.atom_a + 1,
            b.atom_b + 1,
            b.stereo.symbol()
        );
    }
    let (plain, wedge, dash) = report.label_counts();
    let _ = write!(out, "{} plain, {} wedge, {} dash", plain, wedge, dash);
    out
}

/// One line per refresh at which at least one label changed.
pub fn spin_timeline(report: &SpinReport) -> String {
    let mut out = String::new();
    let mut previous: Option<&[_]> = None;
    for frame in &report.frames {
        if previous == Some(frame.labels.as_slice()) {
            continue;
        }
        let labels: Vec<&str> = frame.labels.iter().map(|l| l.symbol()).collect();
        let _ = writeln!(
            out,
            "t={:>7.2}s  {:>6.1}°  {}",
            frame.time,
            frame.angle,
            labels.join(" ")
        );
        previous = Some(frame.labels.as_slice());
    }
    for event in &report.events {
        match event {
            SpinEvent::Paused { time, mark } => {
                let _ = writeln!(out, "paused at {:.0}° (t={:.2}s)", mark, time);
            }
            SpinEvent::Resumed { time } => {
                let _ = writeln!(out, "resumed (t={:.2}s)", time);
            }
        }
    }
    let _ = write!(
        out,
        "{} frames, {} label flips, plane {}",
        report.frames.len(),
        report.label_flips(),
        if report.plane_stable { "stable" } else { "MOVED" }
    );
    out
}
