use thiserror::Error;

use super::config::ConfigError;
use super::rules::RuleError;
use crate::core::models::molecule::MoleculeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Molecule '{name}' has no atoms")]
    EmptyMolecule { name: String },

    #[error("Molecule is structurally invalid: {source}")]
    InvalidMolecule {
        #[from]
        source: MoleculeError,
    },

    #[error("Plane rule '{rule}' cannot be applied: {source}")]
    Rule {
        rule: String,
        #[source]
        source: RuleError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("The alignment controller has been destroyed")]
    Destroyed,

    #[error("Internal logic error: {0}")]
    Internal(String),
}
