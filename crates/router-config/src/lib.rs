// router-config/src/lib.rs

//! Configuration for the liquidity router.
//!
//! TOML files with `${VAR}` environment substitution, environment
//! overrides for common settings, and validation of the planner and
//! ingestion bounds.

use thiserror::Error;

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{Config, IngestSettings, PlannerSettings, RouterSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}
