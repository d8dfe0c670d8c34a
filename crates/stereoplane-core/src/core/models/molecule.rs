use super::atom::Atom;
use super::ids::AtomIndex;
use super::topology::{Bond, BondOrder, BondStereo};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MoleculeError {
    #[error("Bond {bond} references atom {atom}, but the molecule only has {atom_count} atoms")]
    InvalidAtomReference {
        bond: usize,
        atom: AtomIndex,
        atom_count: usize,
    },
    #[error("Bond {bond} connects atom {atom} to itself")]
    SelfBond { bond: usize, atom: AtomIndex },
    #[error("Atom at index {index} carries id {id}; atom ids must equal their index")]
    NonDenseId { index: usize, id: AtomIndex },
    #[error("Atom {atom} has a non-finite position")]
    NonFinitePosition { atom: AtomIndex },
}

/// A small molecule: named, ordered atoms and the bonds between them.
///
/// Atom ids are dense 0-based indices equal to their position in [`atoms`](Self::atoms).
/// The only way to add atoms is [`add_atom`](Self::add_atom), which assigns ids itself,
/// and [`add_bond`](Self::add_bond) rejects references to atoms that do not exist, so a
/// molecule built through this API always satisfies the invariant. Values built by other
/// means (struct literals in tests, deserialization) can be re-checked with
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub formula: Option<String>,
    pub pubchem_cid: Option<u64>,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends an atom and returns its id.
    pub fn add_atom(&mut self, element: &str, position: Point3<f64>) -> AtomIndex {
        let id = self.atoms.len();
        self.atoms.push(Atom::new(id, element, position));
        id
    }

    /// Appends a bond between two existing atoms.
    ///
    /// # Errors
    ///
    /// Returns [`MoleculeError::InvalidAtomReference`] if either atom does not exist and
    /// [`MoleculeError::SelfBond`] if both ends are the same atom.
    pub fn add_bond(
        &mut self,
        atom_a: AtomIndex,
        atom_b: AtomIndex,
        order: BondOrder,
        stereo_hint: BondStereo,
    ) -> Result<(), MoleculeError> {
        let bond = self.bonds.len();
        for atom in [atom_a, atom_b] {
            if atom >= self.atoms.len() {
                return Err(MoleculeError::InvalidAtomReference {
                    bond,
                    atom,
                    atom_count: self.atoms.len(),
                });
            }
        }
        if atom_a == atom_b {
            return Err(MoleculeError::SelfBond { bond, atom: atom_a });
        }
        self.bonds
            .push(Bond::new(atom_a, atom_b, order).with_stereo_hint(stereo_hint));
        Ok(())
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, id: AtomIndex) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Mean position of all atoms, or `None` for an empty molecule.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        mean_position(self.atoms.iter().map(|a| a.position))
    }

    /// Translates every atom so the molecule's centroid sits at the origin.
    pub fn center_at_origin(&mut self) {
        if let Some(centroid) = self.centroid() {
            let offset = centroid.coords;
            for atom in &mut self.atoms {
                atom.position -= offset;
            }
        }
    }

    pub fn carbon_indices(&self) -> Vec<AtomIndex> {
        self.atoms
            .iter()
            .filter(|a| a.is_carbon())
            .map(|a| a.id)
            .collect()
    }

    /// Ids of atoms that share a bond with `id`, in bond order.
    pub fn neighbors(&self, id: AtomIndex) -> Vec<AtomIndex> {
        self.bonds.iter().filter_map(|b| b.other(id)).collect()
    }

    /// Computes a Hill-system formula (C, then H, then the rest alphabetically).
    ///
    /// Without carbon every element is listed alphabetically, hydrogen included.
    pub fn hill_formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(c) = counts.remove("C") {
            push("C", c);
            if let Some(h) = counts.remove("H") {
                push("H", h);
            }
        }
        for (symbol, count) in counts {
            push(symbol, count);
        }
        formula
    }

    /// The source-provided formula, or the computed Hill formula when none was given.
    pub fn display_formula(&self) -> String {
        match &self.formula {
            Some(f) if !f.trim().is_empty() => f.clone(),
            _ => self.hill_formula(),
        }
    }

    /// Re-checks that atom ids are dense, that every position is finite and that every
    /// bond resolves to two distinct atoms.
    pub fn validate(&self) -> Result<(), MoleculeError> {
        for (index, atom) in self.atoms.iter().enumerate() {
            if atom.id != index {
                return Err(MoleculeError::NonDenseId { index, id: atom.id });
            }
            if !atom.position.iter().all(|c| c.is_finite()) {
                return Err(MoleculeError::NonFinitePosition { atom: index });
            }
        }
        for (index, bond) in self.bonds.iter().enumerate() {
            for atom in [bond.atom_a, bond.atom_b] {
                if atom >= self.atoms.len() {
                    return Err(MoleculeError::InvalidAtomReference {
                        bond: index,
                        atom,
                        atom_count: self.atoms.len(),
                    });
                }
            }
            if bond.atom_a == bond.atom_b {
                return Err(MoleculeError::SelfBond {
                    bond: index,
                    atom: bond.atom_a,
                });
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn push_raw_bond(&mut self, bond: Bond) {
        self.bonds.push(bond);
    }
}

/// Arithmetic mean of a set of points, `None` if the set is empty.
pub fn mean_position(points: impl IntoIterator<Item = Point3<f64>>) -> Option<Point3<f64>> {
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    (count > 0).then(|| Point3::from(sum / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> Molecule {
        let mut m = Molecule::new("ethanol");
        let c1 = m.add_atom("C", Point3::new(0.0, 0.0, 0.0));
        let c2 = m.add_atom("C", Point3::new(1.5, 0.0, 0.0));
        let o = m.add_atom("O", Point3::new(2.0, 1.4, 0.0));
        let h = m.add_atom("H", Point3::new(2.9, 1.4, 0.0));
        m.add_bond(c1, c2, BondOrder::Single, BondStereo::None)
            .unwrap();
        m.add_bond(c2, o, BondOrder::Single, BondStereo::None)
            .unwrap();
        m.add_bond(o, h, BondOrder::Single, BondStereo::None)
            .unwrap();
        m
    }

    #[test]
    fn add_atom_assigns_dense_ids() {
        let m = ethanol();
        for (i, atom) in m.atoms().iter().enumerate() {
            assert_eq!(atom.id, i);
        }
        assert_eq!(m.atom(2).unwrap().element, "O");
        assert!(m.atom(10).is_none());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_finite_positions() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut m = ethanol();
            m.add_atom("H", Point3::new(3.5, 0.0, bad));
            assert_eq!(
                m.validate(),
                Err(MoleculeError::NonFinitePosition { atom: 4 })
            );
        }
    }

    #[test]
    fn add_bond_rejects_missing_atoms_and_self_bonds() {
        let mut m = ethanol();
        let err = m
            .add_bond(0, 9, BondOrder::Single, BondStereo::None)
            .unwrap_err();
        assert_eq!(
            err,
            MoleculeError::InvalidAtomReference {
                bond: 3,
                atom: 9,
                atom_count: 4
            }
        );
        let err = m
            .add_bond(1, 1, BondOrder::Single, BondStereo::None)
            .unwrap_err();
        assert_eq!(err, MoleculeError::SelfBond { bond: 3, atom: 1 });
        assert_eq!(m.bonds().len(), 3);
    }

    #[test]
    fn validate_detects_dangling_bond_references() {
        let mut m = ethanol();
        m.push_raw_bond(Bond::new(0, 17, BondOrder::Single));
        assert!(matches!(
            m.validate(),
            Err(MoleculeError::InvalidAtomReference { atom: 17, .. })
        ));
    }

    #[test]
    fn centroid_is_mean_of_all_atoms() {
        let m = ethanol();
        let c = m.centroid().unwrap();
        assert!((c.x - 6.4 / 4.0).abs() < 1e-12);
        assert!((c.y - 2.8 / 4.0).abs() < 1e-12);
        assert!(Molecule::new("empty").centroid().is_none());
    }

    #[test]
    fn center_at_origin_moves_centroid_to_origin() {
        let mut m = ethanol();
        m.center_at_origin();
        let c = m.centroid().unwrap();
        assert!(c.coords.norm() < 1e-12);
    }

    #[test]
    fn carbon_indices_and_neighbors_follow_topology() {
        let m = ethanol();
        assert_eq!(m.carbon_indices(), vec![0, 1]);
        assert_eq!(m.neighbors(1), vec![0, 2]);
        assert_eq!(m.neighbors(3), vec![2]);
    }

    #[test]
    fn hill_formula_orders_carbon_hydrogen_then_alphabetical() {
        let mut m = ethanol();
        for _ in 0..5 {
            m.add_atom("H", Point3::origin());
        }
        assert_eq!(m.hill_formula(), "C2H6O");

        let mut water = Molecule::new("water");
        water.add_atom("O", Point3::origin());
        water.add_atom("H", Point3::origin());
        water.add_atom("H", Point3::origin());
        assert_eq!(water.hill_formula(), "H2O");
    }

    #[test]
    fn display_formula_prefers_source_formula() {
        let mut m = ethanol();
        assert_eq!(m.display_formula(), "C2HO");
        m.formula = Some("C2H6O".to_string());
        assert_eq!(m.display_formula(), "C2H6O");
    }

    #[test]
    fn mean_position_of_empty_set_is_none() {
        assert!(mean_position(std::iter::empty()).is_none());
        let p = mean_position([Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 2.0, 0.0)]).unwrap();
        assert_eq!(p, Point3::new(2.0, 1.0, 0.0));
    }
}
