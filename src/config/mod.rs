//! Configuration module.
//!
//! Loads coordinator settings from a TOML file.

mod settings;

pub use settings::*;
