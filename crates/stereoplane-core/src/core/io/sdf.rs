use crate::core::io::traits::MolecularFile;
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::models::topology::{BondOrder, BondStereo};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

/// How many leading lines are searched for the counts line.
const COUNTS_LINE_SEARCH_WINDOW: usize = 10;

pub const CID_TAG: &str = "PUBCHEM_COMPOUND_CID";
pub const FORMULA_TAG: &str = "PUBCHEM_MOLECULAR_FORMULA";

/// Header lines and SD data items of a molfile record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SdfMetadata {
    /// Lines preceding the counts line (title, program/timestamp, comment).
    pub header_lines: Vec<String>,
    /// `> <TAG>` data items in file order.
    pub data_items: Vec<(String, String)>,
}

impl SdfMetadata {
    pub fn title(&self) -> Option<&str> {
        self.header_lines
            .first()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn data_item(&self, tag: &str) -> Option<&str> {
        self.data_items
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: SdfParseErrorKind },
    #[error("Unsupported molfile: {0}")]
    Unsupported(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),
}

#[derive(Debug, Error)]
pub enum SdfParseErrorKind {
    #[error("Invalid integer in {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float in {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Non-finite value in {field} (value: '{value}')")]
    NonFiniteCoordinate { field: &'static str, value: String },
    #[error("Required field {field} is missing")]
    MissingField { field: &'static str },
    #[error("Unexpected end of file inside the {block} block")]
    UnexpectedEof { block: &'static str },
    #[error("Atom index {index} is out of range")]
    AtomIndexOutOfRange { index: i64 },
}

fn parse_int(token: &str, field: &'static str, line: usize) -> Result<i64, SdfError> {
    token.trim().parse().map_err(|_| SdfError::Parse {
        line,
        kind: SdfParseErrorKind::InvalidInt {
            field,
            value: token.trim().into(),
        },
    })
}

/// Parses a coordinate. `nan` and `inf` are valid `f64` literals but never valid positions.
fn parse_float(token: &str, field: &'static str, line: usize) -> Result<f64, SdfError> {
    let token = token.trim();
    let value: f64 = token.parse().map_err(|_| SdfError::Parse {
        line,
        kind: SdfParseErrorKind::InvalidFloat {
            field,
            value: token.into(),
        },
    })?;
    if !value.is_finite() {
        return Err(SdfError::Parse {
            line,
            kind: SdfParseErrorKind::NonFiniteCoordinate {
                field,
                value: token.into(),
            },
        });
    }
    Ok(value)
}

/// Splits a V2000 line into its leading 3-character integer fields.
///
/// Falls back to whitespace splitting for hand-written files whose columns drift.
fn integer_fields(line: &str, count: usize) -> Vec<&str> {
    let fixed: Option<Vec<&str>> = (0..count)
        .map(|i| line.get(i * 3..i * 3 + 3))
        .collect();
    match fixed {
        Some(fields) if fields.iter().all(|f| f.trim().parse::<i64>().is_ok()) => fields,
        _ => line.split_whitespace().take(count).collect(),
    }
}

pub struct SdfFile;

impl SdfFile {
    /// Parses a molfile held in memory.
    pub fn parse_str(content: &str) -> Result<(Molecule, SdfMetadata), SdfError> {
        let mut reader = content.as_bytes();
        Self::read_from(&mut reader)
    }

    /// Renders a molecule as a molfile string.
    pub fn render(molecule: &Molecule) -> Result<String, SdfError> {
        let mut buf = Vec::new();
        Self::write_molecule_to(molecule, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn read_bond_line(
        molecule: &mut Molecule,
        text: &str,
        line: usize,
        atom_count: usize,
    ) -> Result<(), SdfError> {
        let fields = integer_fields(text, 4);
        if fields.len() < 3 {
            return Err(SdfError::Parse {
                line,
                kind: SdfParseErrorKind::MissingField { field: "bond type" },
            });
        }
        let mut ends = [0usize; 2];
        for (slot, token) in ends.iter_mut().zip(&fields[..2]) {
            let serial = parse_int(token, "bond atom", line)?;
            if serial < 1 || serial as usize > atom_count {
                return Err(SdfError::Parse {
                    line,
                    kind: SdfParseErrorKind::AtomIndexOutOfRange { index: serial },
                });
            }
            *slot = serial as usize - 1;
        }
        let order = BondOrder::from_molfile_code(parse_int(fields[2], "bond type", line)? as i32);
        let stereo = match fields.get(3) {
            Some(token) => BondStereo::from_molfile_code(parse_int(token, "bond stereo", line)? as i32),
            None => BondStereo::None,
        };
        molecule.add_bond(ends[0], ends[1], order, stereo)?;
        Ok(())
    }
}

impl MolecularFile for SdfFile {
    type Metadata = SdfMetadata;
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r').to_string();
            if line.trim() == "$$$$" {
                break;
            }
            lines.push(line);
        }

        let counts_index = lines
            .iter()
            .take(COUNTS_LINE_SEARCH_WINDOW)
            .position(|l| l.contains("V2000") || l.contains("V3000"))
            .ok_or_else(|| SdfError::MissingRecord("counts line (V2000)".into()))?;
        let counts_line = &lines[counts_index];
        if counts_line.contains("V3000") {
            return Err(SdfError::Unsupported(
                "V3000 connection tables are not supported".into(),
            ));
        }

        let counts = integer_fields(counts_line, 2);
        if counts.len() < 2 {
            return Err(SdfError::Parse {
                line: counts_index + 1,
                kind: SdfParseErrorKind::MissingField { field: "bond count" },
            });
        }
        let atom_count = parse_int(counts[0], "atom count", counts_index + 1)?.max(0) as usize;
        let bond_count = parse_int(counts[1], "bond count", counts_index + 1)?.max(0) as usize;
        if atom_count == 0 {
            return Err(SdfError::MissingRecord("atom block".into()));
        }

        let mut metadata = SdfMetadata {
            header_lines: lines[..counts_index].to_vec(),
            ..Default::default()
        };
        let mut molecule = Molecule::new(metadata.title().unwrap_or("Unknown"));

        let mut cursor = counts_index + 1;
        for _ in 0..atom_count {
            let text = lines.get(cursor).ok_or(SdfError::Parse {
                line: cursor + 1,
                kind: SdfParseErrorKind::UnexpectedEof { block: "atom" },
            })?;
            let line = cursor + 1;
            let parts: Vec<&str> = text.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(SdfError::Parse {
                    line,
                    kind: SdfParseErrorKind::MissingField { field: "element symbol" },
                });
            }
            let x = parse_float(parts[0], "x coordinate", line)?;
            let y = parse_float(parts[1], "y coordinate", line)?;
            let z = parse_float(parts[2], "z coordinate", line)?;
            molecule.add_atom(parts[3], Point3::new(x, y, z));
            cursor += 1;
        }

        for _ in 0..bond_count {
            let text = lines.get(cursor).ok_or(SdfError::Parse {
                line: cursor + 1,
                kind: SdfParseErrorKind::UnexpectedEof { block: "bond" },
            })?;
            Self::read_bond_line(&mut molecule, text, cursor + 1, atom_count)?;
            cursor += 1;
        }

        let mut pending_tag: Option<String> = None;
        let mut value_lines: Vec<&str> = Vec::new();
        for text in lines.iter().skip(cursor) {
            if let Some(tag) = &pending_tag {
                if text.trim().is_empty() {
                    metadata
                        .data_items
                        .push((tag.clone(), value_lines.join("\n")));
                    pending_tag = None;
                    value_lines.clear();
                } else {
                    value_lines.push(text.trim());
                }
            } else if text.starts_with('>') {
                pending_tag = text
                    .split_once('<')
                    .and_then(|(_, rest)| rest.split_once('>'))
                    .map(|(tag, _)| tag.to_string());
            }
        }
        if let Some(tag) = pending_tag {
            metadata.data_items.push((tag, value_lines.join("\n")));
        }

        if let Some(cid) = metadata.data_item(CID_TAG) {
            molecule.pubchem_cid = cid.trim().parse().ok();
        }
        if let Some(formula) = metadata.data_item(FORMULA_TAG) {
            molecule.formula = Some(formula.trim().to_string());
        }

        debug!(
            atoms = molecule.atoms().len(),
            bonds = molecule.bonds().len(),
            data_items = metadata.data_items.len(),
            "Parsed molfile record."
        );
        Ok((molecule, metadata))
    }

    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let title = metadata.title().unwrap_or(&molecule.name);
        writeln!(writer, "{}", title)?;
        writeln!(
            writer,
            "{}",
            metadata
                .header_lines
                .get(1)
                .map_or("  stereoplane", String::as_str)
        )?;
        writeln!(
            writer,
            "{}",
            metadata.header_lines.get(2).map_or("", String::as_str)
        )?;
        writeln!(
            writer,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            molecule.atoms().len(),
            molecule.bonds().len()
        )?;

        for atom in molecule.atoms() {
            writeln!(
                writer,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                atom.position.x, atom.position.y, atom.position.z, atom.element
            )?;
        }
        for bond in molecule.bonds() {
            writeln!(
                writer,
                "{:>3}{:>3}{:>3}{:>3}",
                bond.atom_a + 1,
                bond.atom_b + 1,
                bond.order.molfile_code(),
                bond.stereo_hint.molfile_code()
            )?;
        }
        writeln!(writer, "M  END")?;

        for (tag, value) in &metadata.data_items {
            writeln!(writer, "> <{}>", tag)?;
            writeln!(writer, "{}", value)?;
            writeln!(writer)?;
        }
        writeln!(writer, "$$$$")?;
        Ok(())
    }

    fn write_molecule_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut data_items = Vec::new();
        if let Some(cid) = molecule.pubchem_cid {
            data_items.push((CID_TAG.to_string(), cid.to_string()));
        }
        if let Some(formula) = &molecule.formula {
            data_items.push((FORMULA_TAG.to_string(), formula.clone()));
        }
        let metadata = SdfMetadata {
            header_lines: vec![molecule.name.clone()],
            data_items,
        };
        Self::write_to(molecule, &metadata, writer)
    }
}
