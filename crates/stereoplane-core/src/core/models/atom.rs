use super::ids::AtomIndex;
use crate::core::elements::{self, Element};
use nalgebra::Point3;

/// Represents a single atom of a molecule.
///
/// Atoms are immutable once parsed. The `id` doubles as the atom's index in
/// [`Molecule::atoms`](super::molecule::Molecule::atoms), which is what bonds
/// refer to and what the classifier uses to index world positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Dense 0-based id, equal to the atom's position in the molecule.
    pub id: AtomIndex,
    /// The normalized element symbol (e.g., "C", "Cl").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom`, normalizing the element symbol.
    ///
    /// # Arguments
    ///
    /// * `id` - The dense index of the atom inside its molecule.
    /// * `element` - The element symbol in any letter case.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(id: AtomIndex, element: &str, position: Point3<f64>) -> Self {
        Self {
            id,
            element: elements::normalize_symbol(element),
            position,
        }
    }

    /// Returns `true` if this is a carbon atom.
    pub fn is_carbon(&self) -> bool {
        self.element == "C"
    }

    /// Returns `true` if this is a hydrogen atom.
    pub fn is_hydrogen(&self) -> bool {
        self.element == "H"
    }

    /// Looks up the element data for this atom, falling back to the unknown element.
    pub fn element_data(&self) -> &'static Element {
        elements::lookup_or_fallback(&self.element)
    }
}
