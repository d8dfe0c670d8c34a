//! # Plane Rules
//!
//! Hand-authored plane setups for common teaching molecules.
//!
//! A [`PlaneRule`] turns a molecule and its current world positions into a
//! [`PlaneSetup`] (plane point, anchor atom, plane normal) without running the general
//! fitter. Rules are looked up by lowercase molecule name in a [`PlaneRuleRegistry`];
//! names without a rule fall through to the general fitter.
//!
//! | Names | Plane point | Anchor | Normal |
//! |---|---|---|---|
//! | water | O | O | (H1 − O) × (H2 − O) |
//! | ethanol | midpoint of the two C | first C | (C2 − C1) × (O − C1) |
//! | benzene | mean of the six C | first C | (C2 − C1) × (C3 − C1) |
//! | methane | C | C | (H1 − C) × (H2 − C) |
//! | propanon, propanone, acetone | C bonded to O | same C | (O − Cm) × (C′ − Cm) |
//! | ammonia | N | N | (H1 − N) × (H2 − N) |
//!
//! Where a rule needs "the" O, N or C it takes the first such atom in file order; H1 and
//! H2 are the first two hydrogens.

use crate::core::models::ids::AtomIndex;
use crate::core::models::molecule::{Molecule, mean_position};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RuleError {
    #[error("expected exactly {expected} {element} atom(s), found {found}")]
    WrongCount {
        element: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("at least {required} {element} atom(s) required, found {found}")]
    TooFew {
        element: &'static str,
        required: usize,
        found: usize,
    },
    #[error("reference atoms are collinear, no plane normal can be derived")]
    DegenerateNormal,
    #[error("atom {0} has no world position")]
    MissingPosition(AtomIndex),
}

/// Result of a rule: where the plane sits, which atom anchors rotation, and its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSetup {
    pub centroid: Point3<f64>,
    pub anchor: AtomIndex,
    /// Unit normal.
    pub normal: Vector3<f64>,
}

/// Strategy computing a [`PlaneSetup`] from a molecule and its world positions.
pub trait PlaneRule: Send + Sync {
    fn apply(
        &self,
        molecule: &Molecule,
        positions: &[Point3<f64>],
    ) -> Result<PlaneSetup, RuleError>;
}

impl<F> PlaneRule for F
where
    F: Fn(&Molecule, &[Point3<f64>]) -> Result<PlaneSetup, RuleError> + Send + Sync,
{
    fn apply(
        &self,
        molecule: &Molecule,
        positions: &[Point3<f64>],
    ) -> Result<PlaneSetup, RuleError> {
        self(molecule, positions)
    }
}

/// Name-keyed collection of plane rules.
#[derive(Clone)]
pub struct PlaneRuleRegistry {
    rules: HashMap<String, Arc<dyn PlaneRule>>,
}

impl PlaneRuleRegistry {
    /// An empty registry; every molecule goes through the general fitter.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::empty();
        registry.register("water", water);
        registry.register("ethanol", ethanol);
        registry.register("benzene", benzene);
        registry.register("methane", methane);
        let carbonyl: Arc<dyn PlaneRule> = Arc::new(propanone);
        for name in ["propanon", "propanone", "acetone"] {
            registry.register_shared(name, carbonyl.clone());
        }
        registry.register("ammonia", ammonia);
        registry
    }

    /// Registers (or replaces) the rule for `name`. Names are matched case-insensitively.
    pub fn register(&mut self, name: &str, rule: impl PlaneRule + 'static) {
        self.register_shared(name, Arc::new(rule));
    }

    pub fn register_shared(&mut self, name: &str, rule: Arc<dyn PlaneRule>) {
        self.rules.insert(normalize_name(name), rule);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PlaneRule>> {
        self.rules.get(&normalize_name(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(&normalize_name(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PlaneRuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

impl fmt::Debug for PlaneRuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaneRuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn indices_of(molecule: &Molecule, element: &str) -> Vec<AtomIndex> {
    molecule
        .atoms()
        .iter()
        .filter(|a| a.element == element)
        .map(|a| a.id)
        .collect()
}

fn position(positions: &[Point3<f64>], index: AtomIndex) -> Result<Point3<f64>, RuleError> {
    positions
        .get(index)
        .copied()
        .ok_or(RuleError::MissingPosition(index))
}

fn require_at_least(
    found: &[AtomIndex],
    element: &'static str,
    required: usize,
) -> Result<(), RuleError> {
    if found.len() < required {
        Err(RuleError::TooFew {
            element,
            required,
            found: found.len(),
        })
    } else {
        Ok(())
    }
}

fn require_exactly(
    found: &[AtomIndex],
    element: &'static str,
    expected: usize,
) -> Result<(), RuleError> {
    if found.len() != expected {
        Err(RuleError::WrongCount {
            element,
            expected,
            found: found.len(),
        })
    } else {
        Ok(())
    }
}

fn normal_from(v1: Vector3<f64>, v2: Vector3<f64>) -> Result<Vector3<f64>, RuleError> {
    let n = v1.cross(&v2);
    if !n.iter().all(|c| c.is_finite()) {
        return Err(RuleError::DegenerateNormal);
    }
    n.try_normalize(1e-12).ok_or(RuleError::DegenerateNormal)
}

/// A heavy atom at the center with the plane through it and two hydrogens.
///
/// The first atom of `center_element` is the center; with several candidates this picks a
/// different atom than a last-match scan would.
fn center_with_two_hydrogens(
    molecule: &Molecule,
    positions: &[Point3<f64>],
    center_element: &'static str,
) -> Result<PlaneSetup, RuleError> {
    let centers = indices_of(molecule, center_element);
    require_at_least(&centers, center_element, 1)?;
    let hydrogens = indices_of(molecule, "H");
    require_at_least(&hydrogens, "H", 2)?;

    let center = centers[0];
    let c = position(positions, center)?;
    let h1 = position(positions, hydrogens[0])?;
    let h2 = position(positions, hydrogens[1])?;
    Ok(PlaneSetup {
        centroid: c,
        anchor: center,
        normal: normal_from(h1 - c, h2 - c)?,
    })
}

fn water(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    center_with_two_hydrogens(molecule, positions, "O")
}

fn methane(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    center_with_two_hydrogens(molecule, positions, "C")
}

fn ammonia(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    center_with_two_hydrogens(molecule, positions, "N")
}

fn ethanol(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    let carbons = indices_of(molecule, "C");
    require_exactly(&carbons, "C", 2)?;
    let oxygens = indices_of(molecule, "O");
    require_at_least(&oxygens, "O", 1)?;

    let c1 = position(positions, carbons[0])?;
    let c2 = position(positions, carbons[1])?;
    let o = position(positions, oxygens[0])?;
    Ok(PlaneSetup {
        centroid: nalgebra::center(&c1, &c2),
        anchor: carbons[0],
        normal: normal_from(c2 - c1, o - c1)?,
    })
}

fn benzene(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    let carbons = indices_of(molecule, "C");
    require_exactly(&carbons, "C", 6)?;

    let ring = carbons
        .iter()
        .map(|&i| position(positions, i))
        .collect::<Result<Vec<_>, _>>()?;
    let centroid = mean_position(ring.iter().copied()).ok_or(RuleError::TooFew {
        element: "C",
        required: 6,
        found: 0,
    })?;
    Ok(PlaneSetup {
        centroid,
        anchor: carbons[0],
        normal: normal_from(ring[1] - ring[0], ring[2] - ring[0])?,
    })
}

fn propanone(molecule: &Molecule, positions: &[Point3<f64>]) -> Result<PlaneSetup, RuleError> {
    let carbons = indices_of(molecule, "C");
    require_exactly(&carbons, "C", 3)?;
    let oxygens = indices_of(molecule, "O");
    require_at_least(&oxygens, "O", 1)?;
    let oxygen = oxygens[0];

    let middle = molecule
        .neighbors(oxygen)
        .into_iter()
        .find(|n| carbons.contains(n))
        .unwrap_or(carbons[1]);
    let other = carbons
        .iter()
        .copied()
        .find(|&c| c != middle)
        .ok_or(RuleError::WrongCount {
            element: "C",
            expected: 3,
            found: carbons.len(),
        })?;

    let cm = position(positions, middle)?;
    let o = position(positions, oxygen)?;
    let c_other = position(positions, other)?;
    Ok(PlaneSetup {
        centroid: cm,
        anchor: middle,
        normal: normal_from(o - cm, c_other - cm)?,
    })
}
