use phf::{Map, phf_map};

/// Static display data for a chemical element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub name: &'static str,
    pub atomic_number: u8,
    /// CPK color as linear RGB in `[0, 1]`.
    pub cpk_color: [f32; 3],
    /// Van der Waals radius in Angstroms.
    pub vdw_radius: f64,
    /// Covalent radius in Angstroms.
    pub covalent_radius: f64,
}

/// Element returned for symbols that are not in the table.
pub static UNKNOWN_ELEMENT: Element = Element {
    symbol: "X",
    name: "Unknown",
    atomic_number: 0,
    cpk_color: [1.0, 0.0, 1.0],
    vdw_radius: 1.5,
    covalent_radius: 1.0,
};

static ELEMENTS: Map<&'static str, Element> = phf_map! {
    "H" => Element { symbol: "H", name: "Hydrogen", atomic_number: 1, cpk_color: [0.85, 0.85, 0.85], vdw_radius: 1.20, covalent_radius: 0.31 },
    "B" => Element { symbol: "B", name: "Boron", atomic_number: 5, cpk_color: [1.0, 0.7, 0.7], vdw_radius: 1.92, covalent_radius: 0.84 },
    "C" => Element { symbol: "C", name: "Carbon", atomic_number: 6, cpk_color: [0.3, 0.3, 0.3], vdw_radius: 1.70, covalent_radius: 0.76 },
    "N" => Element { symbol: "N", name: "Nitrogen", atomic_number: 7, cpk_color: [0.2, 0.4, 0.9], vdw_radius: 1.55, covalent_radius: 0.71 },
    "O" => Element { symbol: "O", name: "Oxygen", atomic_number: 8, cpk_color: [0.9, 0.2, 0.2], vdw_radius: 1.52, covalent_radius: 0.66 },
    "F" => Element { symbol: "F", name: "Fluorine", atomic_number: 9, cpk_color: [0.5, 0.9, 0.5], vdw_radius: 1.47, covalent_radius: 0.57 },
    "P" => Element { symbol: "P", name: "Phosphorus", atomic_number: 15, cpk_color: [1.0, 0.5, 0.0], vdw_radius: 1.80, covalent_radius: 1.07 },
    "S" => Element { symbol: "S", name: "Sulfur", atomic_number: 16, cpk_color: [1.0, 1.0, 0.2], vdw_radius: 1.80, covalent_radius: 1.05 },
    "Cl" => Element { symbol: "Cl", name: "Chlorine", atomic_number: 17, cpk_color: [0.2, 0.9, 0.2], vdw_radius: 1.75, covalent_radius: 1.02 },
    "Fe" => Element { symbol: "Fe", name: "Iron", atomic_number: 26, cpk_color: [0.88, 0.4, 0.2], vdw_radius: 2.00, covalent_radius: 1.32 },
    "Cu" => Element { symbol: "Cu", name: "Copper", atomic_number: 29, cpk_color: [0.78, 0.5, 0.2], vdw_radius: 1.96, covalent_radius: 1.22 },
    "Zn" => Element { symbol: "Zn", name: "Zinc", atomic_number: 30, cpk_color: [0.49, 0.5, 0.69], vdw_radius: 2.01, covalent_radius: 1.22 },
    "Br" => Element { symbol: "Br", name: "Bromine", atomic_number: 35, cpk_color: [0.65, 0.16, 0.16], vdw_radius: 1.85, covalent_radius: 1.20 },
    "I" => Element { symbol: "I", name: "Iodine", atomic_number: 53, cpk_color: [0.58, 0.0, 0.58], vdw_radius: 1.98, covalent_radius: 1.39 },
};

/// Normalizes an element symbol to its canonical case ("CL" -> "Cl", "c" -> "C").
pub fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn lookup(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.get(normalize_symbol(symbol).as_str())
}

pub fn lookup_or_fallback(symbol: &str) -> &'static Element {
    lookup(symbol).unwrap_or(&UNKNOWN_ELEMENT)
}

/// Returns `true` if the symbol names an element in the table.
pub fn is_known(symbol: &str) -> bool {
    lookup(symbol).is_some()
}
