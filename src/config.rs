//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Triage pipeline configuration.
///
/// Static, recognized options only — nothing here mutates at runtime.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Model identifier passed to the LLM provider.
    pub model: String,
    /// Path of the JSON file backing the memory store.
    pub memory_path: PathBuf,
    /// Maximum interaction records kept per sender.
    pub max_history: usize,
    /// Complaints below this confidence escalate to a human.
    pub complaint_confidence_threshold: f32,
    /// Angry/urgent tones below this confidence escalate to a human.
    pub urgency_confidence_threshold: f32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            memory_path: PathBuf::from("memory.json"),
            max_history: 5,
            complaint_confidence_threshold: 0.8,
            urgency_confidence_threshold: 0.7,
        }
    }
}

impl TriageConfig {
    /// Build configuration from `MAIL_TRIAGE_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; a variable that is set but
    /// unparsable is rejected rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            model: std::env::var("MAIL_TRIAGE_MODEL").unwrap_or(defaults.model),
            memory_path: std::env::var("MAIL_TRIAGE_MEMORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.memory_path),
            max_history: env_parse("MAIL_TRIAGE_MAX_HISTORY", defaults.max_history)?,
            complaint_confidence_threshold: env_parse(
                "MAIL_TRIAGE_COMPLAINT_THRESHOLD",
                defaults.complaint_confidence_threshold,
            )?,
            urgency_confidence_threshold: env_parse(
                "MAIL_TRIAGE_URGENCY_THRESHOLD",
                defaults.urgency_confidence_threshold,
            )?,
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        Err(_) => Ok(default),
    }
}
