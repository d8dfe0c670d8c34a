use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Invalid vector '{0}'. Expected three comma-separated numbers (e.g., '0,0,1').")]
    InvalidVector(String),

    #[error("Invalid number '{value}' for '{key}'.")]
    InvalidNumber { key: String, value: String },

    #[error("Invalid boolean '{value}' for '{key}'. Expected 'true' or 'false'.")]
    InvalidBool { key: String, value: String },

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// A molecule given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoleculeRef {
    /// A file on disk.
    Path(PathBuf),
    /// A name to look up in the local store.
    Name(String),
}

const MOLFILE_EXTENSIONS: [&str; 2] = ["sdf", "mol"];

/// Anything that looks like a path (separator or molfile extension) or exists on disk
/// is a path; everything else is a store name.
pub fn parse_molecule_ref(input: &str) -> Result<MoleculeRef, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "molecule",
            input: input.to_string(),
        });
    }
    let path = Path::new(trimmed);
    let has_molfile_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MOLFILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    if trimmed.contains(['/', '\\']) || has_molfile_extension || path.is_file() {
        Ok(MoleculeRef::Path(path.to_path_buf()))
    } else {
        Ok(MoleculeRef::Name(trimmed.to_string()))
    }
}

pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            input: input.to_string(),
        });
    }
    Ok((key, value.trim()))
}

pub fn parse_vector3(input: &str) -> Result<[f64; 3], ParseError> {
    let cleaned = input.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<f64> = cleaned
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::InvalidVector(input.to_string()))?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(ParseError::InvalidVector(input.to_string())),
    }
}

pub fn parse_f64(key: &str, value: &str) -> Result<f64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
