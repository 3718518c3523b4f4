//! Configuration for map generation and networking.
//!
//! Runtime-tunable settings persisted to disk as RON files, with defaults
//! matching the shipped campaign balance. Forward/backward compatible
//! serialization: unknown fields are ignored, missing sections fall back
//! to defaults.

mod config;
mod error;

pub use config::{Config, DebugConfig, GenerationConfig, JaggedRngMode, NetworkConfig};
pub use error::ConfigError;
