use crate::error::ConfigError;
use crate::pipeline::services::angle_extractor::{AngleMode, DEFAULT_MIN_CONFIDENCE, ExtractionOptions};
use crate::pipeline::services::correctness::{ProfileRegistry, ProfileSettings};
use crate::pipeline::types::ExerciseKind;
use config::{Config, Environment, File};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE: &str = "formcheck";
pub const ENV_PREFIX: &str = "FORMCHECK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Exercise scored when a session starts without naming one.
    pub exercise: String,
    pub min_confidence: f64,
    pub angle_mode: AngleMode,
    /// Leave frames with an unobserved joint out of the session counters.
    pub exclude_low_confidence_frames: bool,
    pub refresh_hz: u32,
    pub update_buffer_size: usize,
    pub command_buffer_size: usize,
    pub replay_path: Option<PathBuf>,
    pub replay_loop: bool,
    pub history_limit: usize,
    pub log_level: String,
    pub profiles: IndexMap<String, ProfileSettings>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            exercise: "pushups".to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            angle_mode: AngleMode::Raw,
            exclude_low_confidence_frames: false,
            refresh_hz: 60,
            update_buffer_size: 64,
            command_buffer_size: 8,
            replay_path: None,
            replay_loop: false,
            history_limit: 5,
            log_level: "info".to_string(),
            profiles: IndexMap::new(),
        }
    }
}

impl Configuration {
    /// Defaults, then `formcheck.{toml,json,yaml}` if present, then
    /// `FORMCHECK_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let configuration: Configuration = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(
                "Minimum confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.refresh_hz == 0 {
            return Err(ConfigError::Invalid(
                "Refresh rate must be greater than 0".to_string(),
            ));
        }

        if self.update_buffer_size == 0 || self.command_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "Channel buffer sizes must be greater than 0".to_string(),
            ));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "History limit must be greater than 0".to_string(),
            ));
        }

        for (name, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("Profile '{}': {}", name, e)))?;
        }

        Ok(())
    }

    pub fn exercise_kind(&self) -> ExerciseKind {
        ExerciseKind::parse(&self.exercise)
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            min_confidence: self.min_confidence,
            mode: self.angle_mode,
        }
    }

    pub fn profile_registry(&self) -> ProfileRegistry {
        ProfileRegistry::default().with_settings(&self.profiles)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_hz.max(1) as f64)
    }
}
