//! External configuration: the small set of tunables exposed as settings
//! keys (worker pool sizes, thumbnail output directory, date format,
//! auto-name digit count), grounded on a plain serde-derived config
//! struct with a `Default` impl providing the out-of-the-box values,
//! rather than the original's `GSettings`/`.viking` key-value store (no
//! GUI toolkit is in scope here).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime-tunable settings. Constructed via `Default` and then
/// overridden field-by-field, or deserialized whole from a settings
/// file with `serde_json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker count for the CPU-bound job pool; `None` means "number of
    /// cores", resolved at `BackgroundJobEngine::new` time.
    pub cpu_pool_size: Option<usize>,
    /// Worker count for the network-bound job pool (DEM tile fetches,
    /// remote imports).
    pub network_pool_size: usize,
    /// Where generated waypoint-image thumbnails are written.
    pub thumbnail_dir: PathBuf,
    /// `chrono::format::strftime` pattern used wherever a timestamp is
    /// rendered for display (export formats use their own fixed
    /// formats regardless of this setting).
    pub date_format: String,
    /// Digit width of the auto-assigned waypoint name suffix (e.g. `3`
    /// for `"Waypoint042"`).
    pub auto_name_digits: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cpu_pool_size: None,
            network_pool_size: 8,
            thumbnail_dir: PathBuf::from("thumbnails"),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            auto_name_digits: 3,
        }
    }
}

impl Settings {
    /// Resolve `cpu_pool_size`, falling back to the available
    /// parallelism of the host.
    pub fn resolved_cpu_pool_size(&self) -> usize {
        self.cpu_pool_size.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    pub fn load_from_json(data: &str) -> Result<Settings, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_documented_out_of_the_box_values() {
        let s = Settings::default();
        assert_eq!(s.network_pool_size, 8);
        assert_eq!(s.auto_name_digits, 3);
        assert!(s.cpu_pool_size.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let mut s = Settings::default();
        s.network_pool_size = 16;
        s.thumbnail_dir = PathBuf::from("/tmp/thumbs");
        let json = s.to_json().unwrap();
        let back = Settings::load_from_json(&json).unwrap();
        assert_eq!(back.network_pool_size, 16);
        assert_eq!(back.thumbnail_dir, PathBuf::from("/tmp/thumbs"));
    }

    #[test]
    fn missing_fields_in_json_fall_back_to_defaults() {
        let back = Settings::load_from_json("{}").unwrap();
        assert_eq!(back.auto_name_digits, 3);
    }

    #[test]
    fn resolved_cpu_pool_size_falls_back_to_available_parallelism() {
        let s = Settings::default();
        assert!(s.resolved_cpu_pool_size() >= 1);
    }
}
