//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Campaign map generation parameters.
    pub generation: GenerationConfig,
    /// Network/replication settings.
    pub network: NetworkConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Which random stream the jagged connection paths draw from.
///
/// The path geometry is also used for point-near-path tests, so drawing
/// from the synced stream keeps those tests identical on every peer.
/// `Cosmetic` uses a locally derived stream and leaves the synced stream
/// untouched, at the cost of per-peer path geometry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JaggedRngMode {
    /// Draw from the synced stream (peer-identical geometry).
    #[default]
    Synced,
    /// Draw from a seed-derived local stream (synced stream untouched).
    Cosmetic,
}

/// Campaign map generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of Voronoi sites to sample.
    pub site_count: usize,
    /// Minimum pairwise distance between sites; also the minimum edge
    /// length below which no branch nodes are added.
    pub min_distance: f32,
    /// Smallest random target size for a cell group.
    pub group_size_min: i32,
    /// Largest random target size for a cell group (inclusive).
    pub group_size_max: i32,
    /// Minimum spacing between branch nodes on the same edge.
    pub branch_spacing: f32,
    /// Per-hop difficulty increase range (min, max).
    pub difficulty_increase: (f32, f32),
    /// Randomized cutoff range (min, max) above which difficulty resets.
    pub difficulty_cutoff: (f32, f32),
    /// Difficulty value the accumulator resets to past the cutoff.
    pub difficulty_floor: f32,
    /// Random stream used for jagged connection paths.
    pub jagged_rng: JaggedRngMode,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            site_count: 50,
            min_distance: 50.0,
            group_size_min: 1,
            group_size_max: 6,
            branch_spacing: 25.0,
            difficulty_increase: (5.0, 10.0),
            difficulty_cutoff: (80.0, 100.0),
            difficulty_floor: 10.0,
            jagged_rng: JaggedRngMode::Synced,
        }
    }
}

/// Network/replication settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Simulation tick rate (Hz).
    pub tick_rate: u32,
    /// How long a client-side prediction lives before it is kept as
    /// confirmed, in seconds.
    pub correction_delay_secs: f32,
    /// Interval between periodic full-state broadcasts for drift
    /// correction, in ticks.
    pub drift_broadcast_ticks: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            correction_delay_secs: 1.0,
            drift_broadcast_ticks: 600,
        }
    }
}

impl NetworkConfig {
    /// The prediction reset window expressed in ticks.
    pub fn correction_delay_ticks(&self) -> u32 {
        (self.correction_delay_secs * self.tick_rate as f32).ceil() as u32
    }
}

/// Debug/development settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(!ron_str.is_empty());
        assert!(ron_str.contains("site_count: 50"));
        assert!(ron_str.contains("tick_rate: 60"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        // Config missing the `network` section entirely
        let ron_str = "(generation: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.generation.site_count = 80;
        config.network.tick_rate = 30;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.generation.min_distance = 75.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().generation.min_distance, 75.0);
    }

    #[test]
    fn test_correction_delay_ticks() {
        let net = NetworkConfig::default();
        // 1.0 s at 60 Hz.
        assert_eq!(net.correction_delay_ticks(), 60);

        let net = NetworkConfig {
            tick_rate: 30,
            correction_delay_secs: 0.5,
            ..Default::default()
        };
        assert_eq!(net.correction_delay_ticks(), 15);
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
