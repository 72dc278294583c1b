//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Denoise filter settings
    #[serde(default)]
    pub denoise: DenoiseConfig,
    /// Time and zone binning settings
    #[serde(default)]
    pub binning: BinningConfig,
    /// Metric zone grid settings
    #[serde(default)]
    pub grid: GridConfig,
    /// Feature aggregation settings
    #[serde(default)]
    pub aggregate: AggregateConfig,
}

/// Denoise configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Geometric filter speed ceiling (m/s)
    pub speed_threshold_a: f64,
    /// Geometric filter turn angle floor (degrees)
    pub angle_threshold: f64,
    /// Geometric filter gap floor (seconds)
    pub time_threshold: f64,
    /// Median filter window width (rows)
    pub window_size: usize,
    /// Median filter speed ceiling (m/s)
    pub speed_threshold_b: f64,
    /// Devices must keep more than this many pings
    pub min_points_per_device: usize,
    /// Write delta columns alongside denoised pings
    pub retain_deltas: bool,
}

/// Binning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Width of a time-of-day bin (minutes)
    pub time_bin_minutes: u32,
    /// Zone id marking pings outside coverage
    pub zone_sentinel_value: i32,
    /// Rows handed to the zone assigner per chunk
    pub chunk_rows: usize,
}

/// Zone grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Square cell side (Web-Mercator meters)
    pub cell_size_m: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Prior probability of walking attached to every zone
    pub prior_walk: f64,
    /// Prior probability of driving attached to every zone
    pub prior_car: f64,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            speed_threshold_a: 30.0,
            angle_threshold: 30.0,
            time_threshold: 10.0,
            window_size: 5,
            speed_threshold_b: 40.0,
            min_points_per_device: 3,
            retain_deltas: true,
        }
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            time_bin_minutes: 60,
            zone_sentinel_value: -1,
            chunk_rows: 5_000_000,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size_m: 2000.0,
            min_lat: 45.42,
            max_lat: 46.88,
            min_lon: 13.38,
            max_lon: 16.61,
        }
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            prior_walk: 0.5,
            prior_car: 0.5,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), crate::Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(crate::Error::Config(format!("{} must be a positive number, got {}", name, value)))
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let d = &self.denoise;
        positive("speed_threshold_a", d.speed_threshold_a)?;
        positive("speed_threshold_b", d.speed_threshold_b)?;
        positive("time_threshold", d.time_threshold)?;
        if !(0.0..180.0).contains(&d.angle_threshold) {
            return Err(crate::Error::Config(format!(
                "angle_threshold must be in [0, 180), got {}", d.angle_threshold
            )));
        }
        if d.window_size == 0 {
            return Err(crate::Error::Config("window_size must be > 0".to_string()));
        }

        let b = &self.binning;
        if !(1..=1440).contains(&b.time_bin_minutes) {
            return Err(crate::Error::Config(format!(
                "time_bin_minutes must be in [1, 1440], got {}", b.time_bin_minutes
            )));
        }
        if b.chunk_rows == 0 {
            return Err(crate::Error::Config("chunk_rows must be > 0".to_string()));
        }
        // Zone ids handed out by assigners are non-negative
        if b.zone_sentinel_value >= 0 {
            return Err(crate::Error::Config(format!(
                "zone_sentinel_value must be negative, got {}", b.zone_sentinel_value
            )));
        }

        let g = &self.grid;
        positive("cell_size_m", g.cell_size_m)?;
        if !(-90.0..=90.0).contains(&g.min_lat) || !(-90.0..=90.0).contains(&g.max_lat) || g.min_lat >= g.max_lat {
            return Err(crate::Error::Config(format!(
                "grid latitude bounds must be ordered within [-90, 90], got [{}, {}]", g.min_lat, g.max_lat
            )));
        }
        if !(-180.0..=180.0).contains(&g.min_lon) || !(-180.0..=180.0).contains(&g.max_lon) || g.min_lon >= g.max_lon {
            return Err(crate::Error::Config(format!(
                "grid longitude bounds must be ordered within [-180, 180], got [{}, {}]", g.min_lon, g.max_lon
            )));
        }

        let a = &self.aggregate;
        if !(0.0..=1.0).contains(&a.prior_walk) || !(0.0..=1.0).contains(&a.prior_car) {
            return Err(crate::Error::Config(format!(
                "zone priors must be in [0, 1], got walk={} car={}", a.prior_walk, a.prior_car
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".mobility_features").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.denoise.speed_threshold_a, 30.0);
        assert_eq!(config.denoise.speed_threshold_b, 40.0);
        assert_eq!(config.binning.zone_sentinel_value, -1);
        assert_eq!(config.binning.time_bin_minutes, 60);
    }

    #[test]
    fn test_denoise_config_defaults() {
        let denoise = DenoiseConfig::default();
        assert_eq!(denoise.angle_threshold, 30.0);
        assert_eq!(denoise.time_threshold, 10.0);
        assert_eq!(denoise.window_size, 5);
        assert_eq!(denoise.min_points_per_device, 3);
        assert!(denoise.retain_deltas);
    }

    #[test]
    fn test_config_serialization() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[denoise]"));
        assert!(toml.contains("[binning]"));
        assert!(toml.contains("[grid]"));
        assert!(toml.contains("[aggregate]"));
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.denoise.window_size = 9;
        original.binning.time_bin_minutes = 30;
        original.aggregate.prior_walk = 0.7;

        original.save(&config_path).expect("Failed to save config");
        assert!(config_path.exists());

        let loaded = Config::load(&config_path).expect("Failed to load config");
        assert_eq!(loaded.denoise.window_size, 9);
        assert_eq!(loaded.binning.time_bin_minutes, 30);
        assert_eq!(loaded.aggregate.prior_walk, 0.7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(&PathBuf::from("/tmp/nonexistent_mobility_config_12345.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[denoise]
speed_threshold_a = 50.0
speed_threshold_b = 50.0
"#;
        let config: Config = toml::from_str(partial).expect("partial config should parse");
        assert_eq!(config.denoise.speed_threshold_a, 50.0);
        assert_eq!(config.denoise.window_size, 5);
        assert_eq!(config.binning.chunk_rows, 5_000_000);
        assert_eq!(config.grid.cell_size_m, 2000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_parsing() {
        let result: Result<Config, _> = toml::from_str("this is not valid toml {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.denoise.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_speed() {
        let mut config = Config::default();
        config.denoise.speed_threshold_a = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.denoise.speed_threshold_b = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_time_bin_range() {
        let mut config = Config::default();
        config.binning.time_bin_minutes = 0;
        assert!(config.validate().is_err());
        config.binning.time_bin_minutes = 1441;
        assert!(config.validate().is_err());
        config.binning.time_bin_minutes = 1440;
        assert!(config.validate().is_ok());
        config.binning.time_bin_minutes = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_grid_bounds() {
        let mut config = Config::default();
        config.grid.min_lat = 47.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.grid.max_lon = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sentinel_must_not_collide_with_zone_ids() {
        let mut config = Config::default();
        config.binning.zone_sentinel_value = 0;
        assert!(config.validate().is_err());

        config.binning.zone_sentinel_value = 17;
        assert!(config.validate().is_err());

        config.binning.zone_sentinel_value = -9999;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_zero_sentinel() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("sentinel.toml");
        std::fs::write(&config_path, "[binning]\nzone_sentinel_value = 0\n").expect("Failed to write config");
        assert!(matches!(Config::load(&config_path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_priors() {
        let mut config = Config::default();
        config.aggregate.prior_car = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_invalid_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("bad_config.toml");
        std::fs::write(&config_path, "[binning]\nchunk_rows = 0\n").expect("Failed to write config");
        assert!(Config::load(&config_path).is_err());
    }
}
