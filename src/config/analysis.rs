use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_turn_directory")]
    pub turn_directory: String,
    #[serde(default = "default_snapshot_directory")]
    pub snapshot_directory: String,
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_max_jump_distance")]
    pub max_jump_distance: f64,
    #[serde(default = "default_max_starbase_hops")]
    pub max_starbase_hops: u32,
    #[serde(default = "default_forecast_turns")]
    pub forecast_turns: usize,
    #[serde(default = "default_mine_decay_rate")]
    pub mine_decay_rate: f64,
    #[serde(default = "default_sanity_check_from_turn")]
    pub sanity_check_from_turn: u32,
    #[serde(default = "default_sanity_check_margin")]
    pub sanity_check_margin: f64,
    #[serde(default = "default_sanity_check_min_sweepers")]
    pub sanity_check_min_sweepers: usize,
}

fn default_turn_directory() -> String {
    "./turns".to_string()
}
fn default_snapshot_directory() -> String {
    "./snapshots".to_string()
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_max_jump_distance() -> f64 {
    81.5
}
fn default_max_starbase_hops() -> u32 {
    3
}
fn default_forecast_turns() -> usize {
    10
}
fn default_mine_decay_rate() -> f64 {
    0.05
}
fn default_sanity_check_from_turn() -> u32 {
    4
}
fn default_sanity_check_margin() -> f64 {
    200.0
}
fn default_sanity_check_min_sweepers() -> usize {
    2
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            turn_directory: default_turn_directory(),
            snapshot_directory: default_snapshot_directory(),
            max_snapshots: default_max_snapshots(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            max_jump_distance: default_max_jump_distance(),
            max_starbase_hops: default_max_starbase_hops(),
            forecast_turns: default_forecast_turns(),
            mine_decay_rate: default_mine_decay_rate(),
            sanity_check_from_turn: default_sanity_check_from_turn(),
            sanity_check_margin: default_sanity_check_margin(),
            sanity_check_min_sweepers: default_sanity_check_min_sweepers(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: AnalysisConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        if self.max_jump_distance <= 0.0 {
            errors.push(format!(
                "max_jump_distance must be > 0.0, got {}. Example: max_jump_distance = 81.5",
                self.max_jump_distance
            ));
        }

        if self.max_starbase_hops == 0 {
            errors.push(format!(
                "max_starbase_hops must be > 0, got {}. Example: max_starbase_hops = 3",
                self.max_starbase_hops
            ));
        }

        if self.forecast_turns == 0 {
            errors.push(format!(
                "forecast_turns must be > 0, got {}. Example: forecast_turns = 10",
                self.forecast_turns
            ));
        }

        if !(0.0..1.0).contains(&self.mine_decay_rate) {
            errors.push(format!(
                "mine_decay_rate must be in [0.0, 1.0), got {}. Example: mine_decay_rate = 0.05",
                self.mine_decay_rate
            ));
        }

        if self.sanity_check_margin < 0.0 {
            errors.push(format!(
                "sanity_check_margin must be >= 0.0, got {}. Example: sanity_check_margin = 200.0",
                self.sanity_check_margin
            ));
        }

        if self.sanity_check_min_sweepers == 0 {
            errors.push(format!(
                "sanity_check_min_sweepers must be > 0, got {}. Example: sanity_check_min_sweepers = 2",
                self.sanity_check_min_sweepers
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"json\"",
                valid_formats, self.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
