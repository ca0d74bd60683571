//! Game configuration - rules, levels, worker roster and event catalog.
//!
//! The engine consumes these as already-typed values. They are normally
//! loaded from JSON (see `data/game_config.json`); `GameConfig::default()`
//! carries the same content so a session can run with no file at all.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::{
    duration_secs, secs_to_duration, EventCatalog, EventDefinition, Worker, WorkerAttribute,
};

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}

/// Global gameplay numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Service time for a worker that does not match the request
    pub base_service_ms: u64,
    /// Fraction of the base time saved on a perfect match, in `[0, 1)`
    pub perfect_match_factor: f64,
    /// Score added each time a request is served
    pub score_per_event: u32,
    /// Requests allowed on the board at once; spawns beyond this are skipped
    pub max_active_requests: usize,
    /// Default spawn cadence for levels that do not set one (seconds)
    pub spawn_interval_min: f64,
    pub spawn_interval_max: f64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            base_service_ms: 5000,
            perfect_match_factor: 0.5,
            score_per_event: 1,
            max_active_requests: 10,
            spawn_interval_min: 3.0,
            spawn_interval_max: 7.0,
        }
    }
}

impl GameRules {
    pub fn base_service_time(&self) -> Duration {
        Duration::from_millis(self.base_service_ms)
    }

    pub fn default_cadence(&self) -> SpawnCadence {
        SpawnCadence::Range {
            min: self.spawn_interval_min,
            max: self.spawn_interval_max,
        }
    }
}

/// How often requests appear, in seconds.
///
/// Written either as a single number (fixed rate) or as `{ "min", "max" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpawnCadence {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl SpawnCadence {
    /// Inclusive interval bounds in seconds
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            SpawnCadence::Fixed(secs) => (secs, secs),
            SpawnCadence::Range { min, max } => (min, max),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = self.bounds();
        let representable = secs_to_duration(min).is_some() && secs_to_duration(max).is_some();
        if !representable || min <= 0.0 || min > max {
            return Err(ConfigError::invalid(format!(
                "spawn interval must satisfy 0 < min <= max, got [{}, {}]",
                min, max
            )));
        }
        Ok(())
    }
}

/// One playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(with = "duration_secs")]
    pub time_limit: Duration,
    pub target_count: u32,
    /// Overrides the rules' default cadence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<SpawnCadence>,
    /// Overrides the rules' concurrency cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
    /// Fixed RNG seed for reproducible spawns; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl LevelConfig {
    pub fn new(id: u32, time_limit: Duration, target_count: u32) -> Self {
        Self {
            id,
            name: format!("Level {}", id),
            time_limit,
            target_count,
            spawn: None,
            max_concurrent: None,
            seed: None,
        }
    }

    pub fn with_spawn(mut self, cadence: SpawnCadence) -> Self {
        self.spawn = Some(cadence);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = Some(max);
        self
    }

    pub fn cadence(&self, rules: &GameRules) -> SpawnCadence {
        self.spawn.unwrap_or_else(|| rules.default_cadence())
    }

    pub fn concurrency_cap(&self, rules: &GameRules) -> usize {
        self.max_concurrent.unwrap_or(rules.max_active_requests)
    }
}

/// Everything a session needs, as loaded from one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub rules: GameRules,
    pub levels: Vec<LevelConfig>,
    pub workers: Vec<Worker>,
    pub events: EventCatalog,
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded config from {}: {} levels, {} workers, {} event types",
            path.display(),
            config.levels.len(),
            config.workers.len(),
            config.events.len()
        );
        Ok(config)
    }

    pub fn level(&self, id: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.rules;
        if !(0.0..1.0).contains(&rules.perfect_match_factor) {
            return Err(ConfigError::invalid(format!(
                "perfect_match_factor must be within [0, 1), got {}",
                rules.perfect_match_factor
            )));
        }
        if rules.base_service_ms == 0 {
            return Err(ConfigError::invalid("base_service_ms must be positive"));
        }
        rules.default_cadence().validate()?;

        if self.levels.is_empty() {
            return Err(ConfigError::invalid("at least one level must be configured"));
        }
        let mut level_ids = HashSet::new();
        for level in &self.levels {
            if !level_ids.insert(level.id) {
                return Err(ConfigError::invalid(format!("duplicate level id {}", level.id)));
            }
            if level.time_limit.is_zero() {
                return Err(ConfigError::invalid(format!(
                    "level {} has a zero time limit",
                    level.id
                )));
            }
            if let Some(cadence) = &level.spawn {
                cadence.validate()?;
            }
        }

        if self.workers.is_empty() {
            return Err(ConfigError::invalid("at least one worker must be configured"));
        }
        let mut worker_ids = HashSet::new();
        for worker in &self.workers {
            if !worker_ids.insert(&worker.id) {
                return Err(ConfigError::invalid(format!("duplicate worker id {}", worker.id)));
            }
            if worker.cooldown_max.is_zero() {
                return Err(ConfigError::invalid(format!(
                    "worker {} must have a positive cooldown",
                    worker.id
                )));
            }
        }

        if self.events.is_empty() {
            return Err(ConfigError::invalid("at least one event type must be configured"));
        }
        let mut event_ids = HashSet::new();
        for event in self.events.iter() {
            if !event_ids.insert(&event.id) {
                return Err(ConfigError::invalid(format!("duplicate event id {}", event.id)));
            }
            if event.required_attributes.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "event {} has no required attributes",
                    event.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        use WorkerAttribute::*;

        Self {
            rules: GameRules::default(),
            levels: vec![
                LevelConfig {
                    name: "Morning Round".into(),
                    ..LevelConfig::new(1, Duration::from_secs(60), 5)
                },
                LevelConfig {
                    name: "Busy Afternoon".into(),
                    spawn: Some(SpawnCadence::Range { min: 2.0, max: 5.0 }),
                    ..LevelConfig::new(2, Duration::from_secs(90), 12)
                },
                LevelConfig {
                    name: "Night Shift".into(),
                    spawn: Some(SpawnCadence::Fixed(2.0)),
                    max_concurrent: Some(8),
                    ..LevelConfig::new(3, Duration::from_secs(120), 25)
                },
            ],
            workers: vec![
                Worker::new("Worker-A", Strong, Duration::from_secs(3)).with_name("Da Li"),
                Worker::new("Worker-B", Talkative, Duration::from_secs(4)).with_name("Xiao Mei"),
                Worker::new("Worker-C", Smart, Duration::from_secs(5)).with_name("Lao Zhang"),
            ],
            events: EventCatalog::new(vec![
                EventDefinition::new("E-01", &[Strong]).with_display(
                    "Getting Around",
                    "Carrying heavy things, helping up after a fall",
                    "#d97706",
                ),
                EventDefinition::new("E-02", &[Talkative]).with_display(
                    "Company",
                    "A chat to pass the time, reading the paper aloud",
                    "#16a34a",
                ),
                EventDefinition::new("E-03", &[Smart]).with_display(
                    "Home Repairs",
                    "Changing a light bulb, fixing a leaking pipe",
                    "#2563eb",
                ),
                EventDefinition::new("E-04", &[Talkative]).with_display(
                    "Doctor Visit",
                    "Going along to the clinic, reassurance",
                    "#16a34a",
                ),
                EventDefinition::new("E-05", &[Strong, Smart]).with_display(
                    "Health Emergency",
                    "Sudden illness or fainting",
                    "#dc2626",
                ),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED_JSON: &str = include_str!("../../../data/game_config.json");

    #[test]
    fn test_default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_bundled_config_matches_default() {
        let bundled = GameConfig::from_json_str(BUNDLED_JSON).unwrap();
        assert_eq!(bundled, GameConfig::default());
    }

    #[test]
    fn test_spawn_cadence_shapes() {
        let fixed: SpawnCadence = serde_json::from_str("5.0").unwrap();
        assert_eq!(fixed, SpawnCadence::Fixed(5.0));
        assert_eq!(fixed.bounds(), (5.0, 5.0));

        let range: SpawnCadence = serde_json::from_str(r#"{ "min": 3, "max": 7 }"#).unwrap();
        assert_eq!(range.bounds(), (3.0, 7.0));
    }

    #[test]
    fn test_level_falls_back_to_rules() {
        let rules = GameRules::default();
        let level = LevelConfig::new(1, Duration::from_secs(10), 1);
        assert_eq!(level.cadence(&rules), SpawnCadence::Range { min: 3.0, max: 7.0 });
        assert_eq!(level.concurrency_cap(&rules), 10);

        let level = level.with_spawn(SpawnCadence::Fixed(1.0)).with_max_concurrent(2);
        assert_eq!(level.cadence(&rules), SpawnCadence::Fixed(1.0));
        assert_eq!(level.concurrency_cap(&rules), 2);
    }

    #[test]
    fn test_rejects_inverted_spawn_range() {
        let mut config = GameConfig::default();
        config.levels[0].spawn = Some(SpawnCadence::Range { min: 7.0, max: 3.0 });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_empty_requirements() {
        let mut config = GameConfig::default();
        config.events = EventCatalog::new(vec![EventDefinition::new("E-01", &[])]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_duplicate_worker() {
        let mut config = GameConfig::default();
        let dup = config.workers[0].clone();
        config.workers.push(dup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate worker id Worker-A"));
    }

    #[test]
    fn test_rejects_out_of_range_factor() {
        let mut config = GameConfig::default();
        config.rules.perfect_match_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_factor_that_removes_service_time() {
        let mut config = GameConfig::default();
        config.rules.perfect_match_factor = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        config.rules.perfect_match_factor = 0.99;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unrepresentable_spawn_interval() {
        let mut config = GameConfig::default();
        config.levels[0].spawn = Some(SpawnCadence::Range { min: 1.0, max: 1e300 });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        config.levels[0].spawn = Some(SpawnCadence::Fixed(f64::INFINITY));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_JSON).unwrap();
        value["levels"][0]["spawn"] = serde_json::json!({ "min": 1, "max": 1e300 });
        let err = GameConfig::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_oversized_durations_are_parse_errors() {
        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_JSON).unwrap();
        value["levels"][0]["time_limit"] = serde_json::json!(1e20);
        let err = GameConfig::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));

        let mut value: serde_json::Value = serde_json::from_str(BUNDLED_JSON).unwrap();
        value["workers"][0]["cooldown"] = serde_json::json!(1e30);
        let err = GameConfig::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GameConfig::load("/nonexistent/carecrew.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
