use super::ids::AtomIndex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = 4,
}

impl BondOrder {
    /// Maps a molfile bond type to an order, clamping out-of-range values into 1..=4.
    pub fn from_molfile_code(code: i32) -> Self {
        match code.clamp(1, 4) {
            1 => Self::Single,
            2 => Self::Double,
            3 => Self::Triple,
            _ => Self::Aromatic,
        }
    }

    pub fn molfile_code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// Stereo label of a bond relative to the viewing plane.
///
/// `Up` is drawn as a wedge (toward the viewer), `Down` as a dashed bond (away from
/// the viewer) and `None` as a plain cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
}

impl BondStereo {
    /// Maps the molfile bond stereo column (1 = wedge, 6 = hash) to a label.
    pub fn from_molfile_code(code: i32) -> Self {
        match code {
            1 => Self::Up,
            6 => Self::Down,
            _ => Self::None,
        }
    }

    pub fn molfile_code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Up => 1,
            Self::Down => 6,
        }
    }

    /// Short drawing name used in reports ("plain", "wedge", "dash").
    pub fn symbol(self) -> &'static str {
        match self {
            Self::None => "plain",
            Self::Up => "wedge",
            Self::Down => "dash",
        }
    }
}

impl fmt::Display for BondStereo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "None",
                Self::Up => "Up",
                Self::Down => "Down",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom_a: AtomIndex,       // first atom, by dense index
    pub atom_b: AtomIndex,       // second atom, by dense index
    pub order: BondOrder,        // bond order as given by the source
    pub stereo_hint: BondStereo, // source-provided stereo, never authoritative
}

impl Bond {
    pub fn new(atom_a: AtomIndex, atom_b: AtomIndex, order: BondOrder) -> Self {
        Self {
            atom_a,
            atom_b,
            order,
            stereo_hint: BondStereo::None,
        }
    }

    pub fn with_stereo_hint(mut self, hint: BondStereo) -> Self {
        self.stereo_hint = hint;
        self
    }

    pub fn contains(&self, atom: AtomIndex) -> bool {
        self.atom_a == atom || self.atom_b == atom
    }

    /// Returns the partner of `atom` in this bond, if `atom` is one of its ends.
    pub fn other(&self, atom: AtomIndex) -> Option<AtomIndex> {
        if self.atom_a == atom {
            Some(self.atom_b)
        } else if self.atom_b == atom {
            Some(self.atom_a)
        } else {
            None
        }
    }
}
