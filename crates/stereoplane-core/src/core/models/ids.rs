/// Index of an atom inside its molecule. Equal to the atom's `id` and to its
/// position in the atom list.
pub type AtomIndex = usize;

/// Index of a bond inside its molecule's bond list.
pub type BondIndex = usize;
