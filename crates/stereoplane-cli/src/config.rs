//! Layered configuration for the `align` and `spin` commands.
//!
//! Precedence, highest first: explicit CLI flags, `-S key=value` pairs, the TOML file
//! given with `-c`, built-in defaults.

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::build_config;
pub use models::AppConfig;
