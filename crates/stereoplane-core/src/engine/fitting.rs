//! # Plane Fitter
//!
//! Chooses the viewing-plane normal for a molecule.
//!
//! ## Algorithm
//!
//! The fitter does not minimize squared distances. It builds a small, ordered list of
//! candidate normals and keeps the one under which the most atoms of the fitting subset
//! lie within the depth threshold of the plane through `center`:
//!
//! 1. `c1`: smallest-eigenvalue direction of the scatter matrix (inverse iteration)
//! 2. `c2`: normal of the plane spanned by the two largest-eigenvalue directions
//! 3. `±X`, `±Y`, `±Z`
//!
//! Candidates are scored in the order `c1, -c1, c2, -c2, +X, -X, +Y, -Y, +Z, -Z`. A
//! candidate replaces the current best only if it puts strictly more atoms in the plane,
//! or the same number of atoms and strictly more bonds (both ends taken from the full
//! atom set). Remaining ties keep the earlier candidate.
//!
//! Eigen-derived candidates that come out degenerate are skipped; the axis candidates are
//! always scored, so a result exists for any input.

use crate::core::geometry::covariance::Covariance;
use crate::core::models::topology::Bond;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Distance below which all atoms count as collinear (Angstroms).
const COLLINEAR_TOLERANCE: f64 = 1e-6;

/// Where a candidate normal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalSource {
    SmallestEigenvector,
    DominantPlane,
    WorldAxis,
    /// Single-atom or collinear molecule; the normal is fixed to +Z.
    DegenerateFallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub normal: Vector3<f64>,
    pub source: NormalSource,
}

/// Inputs of one fit.
#[derive(Debug, Clone, Copy)]
pub struct FitInput<'a> {
    /// The fitting subset (carbon atoms when present).
    pub points: &'a [Point3<f64>],
    /// Point the candidate planes pass through.
    pub center: Point3<f64>,
    /// Scale of the molecule; the depth threshold is `reference_radius × factor`.
    pub reference_radius: f64,
    /// Positions of every atom, indexed by atom id, for bond scoring.
    pub all_positions: &'a [Point3<f64>],
    pub bonds: &'a [Bond],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFit {
    pub normal: Vector3<f64>,
    pub source: NormalSource,
    pub atom_score: usize,
    pub bond_score: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFitter {
    depth_threshold_factor: f64,
}

impl PlaneFitter {
    pub fn new(depth_threshold_factor: f64) -> Self {
        Self {
            depth_threshold_factor,
        }
    }

    pub fn depth_threshold_factor(&self) -> f64 {
        self.depth_threshold_factor
    }

    /// Builds the ordered candidate list for a point set.
    pub fn candidates(points: &[Point3<f64>], center: &Point3<f64>) -> Vec<Candidate> {
        let covariance = Covariance::from_points(points, center);
        let mut candidates = Vec::with_capacity(10);

        let eigen = [
            (covariance.smallest_eigenvector(), NormalSource::SmallestEigenvector),
            (covariance.dominant_plane_normal(), NormalSource::DominantPlane),
        ];
        for (normal, source) in eigen {
            match normal {
                Some(n) => {
                    candidates.push(Candidate { normal: n, source });
                    candidates.push(Candidate { normal: -n, source });
                }
                None => debug!(?source, "Skipping degenerate eigen candidate."),
            }
        }

        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            candidates.push(Candidate {
                normal: axis,
                source: NormalSource::WorldAxis,
            });
            candidates.push(Candidate {
                normal: -axis,
                source: NormalSource::WorldAxis,
            });
        }
        candidates
    }

    /// Counts fitting-subset atoms and bonds within `threshold` of the plane through
    /// `input.center` with the given normal.
    pub fn score(input: &FitInput<'_>, normal: &Vector3<f64>, threshold: f64) -> (usize, usize) {
        let in_plane = |p: &Point3<f64>| (p - input.center).dot(normal).abs() < threshold;

        let atom_score = input.points.iter().filter(|p| in_plane(p)).count();
        let bond_score = input
            .bonds
            .iter()
            .filter(|bond| {
                match (
                    input.all_positions.get(bond.atom_a),
                    input.all_positions.get(bond.atom_b),
                ) {
                    (Some(a), Some(b)) => in_plane(a) && in_plane(b),
                    _ => false,
                }
            })
            .count();
        (atom_score, bond_score)
    }

    /// Runs candidate generation, scoring and selection.
    pub fn fit(&self, input: &FitInput<'_>) -> PlaneFit {
        let threshold = input.reference_radius * self.depth_threshold_factor;

        if is_collinear(input.all_positions) {
            let normal = Vector3::z();
            let (atom_score, bond_score) = Self::score(input, &normal, threshold);
            debug!("Atoms are collinear or single; using +Z as the plane normal.");
            return PlaneFit {
                normal,
                source: NormalSource::DegenerateFallback,
                atom_score,
                bond_score,
                threshold,
            };
        }

        let mut best: Option<PlaneFit> = None;
        for candidate in Self::candidates(input.points, &input.center) {
            let (atom_score, bond_score) = Self::score(input, &candidate.normal, threshold);
            debug!(
                normal = ?candidate.normal,
                source = ?candidate.source,
                atom_score,
                bond_score,
                "Scored candidate normal."
            );
            let better = match &best {
                None => true,
                Some(b) => {
                    atom_score > b.atom_score
                        || (atom_score == b.atom_score && bond_score > b.bond_score)
                }
            };
            if better {
                best = Some(PlaneFit {
                    normal: candidate.normal,
                    source: candidate.source,
                    atom_score,
                    bond_score,
                    threshold,
                });
            }
        }

        // The axis candidates are always present, so `best` is always set here.
        best.unwrap_or(PlaneFit {
            normal: Vector3::z(),
            source: NormalSource::DegenerateFallback,
            atom_score: 0,
            bond_score: 0,
            threshold,
        })
    }
}

/// `true` if the points are empty, a single point, or all on one line.
pub fn is_collinear(points: &[Point3<f64>]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let Some(far) = points
        .iter()
        .map(|p| p - first)
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
    else {
        return true;
    };
    let Some(axis) = far.try_normalize(COLLINEAR_TOLERANCE) else {
        return true;
    };
    points
        .iter()
        .all(|p| (p - first).cross(&axis).norm() < COLLINEAR_TOLERANCE)
}
