//! Optional global defaults: agent-wide settings outside the forwarder definition.

use crate::error::{GenerateError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "fatal"];
const OVERFLOW_ACTIONS: [&str; 3] = ["block", "drop_oldest_chunk", "throw_exception"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalDefaults {
    /// Fallback agent log level when `LOG_LEVEL` is unset in the agent's env.
    #[serde(default, rename = "logLevel", alias = "log_level", alias = "loglevel")]
    pub log_level: Option<String>,

    #[serde(default)]
    pub buffer: Option<BufferTuning>,
}

/// Overrides applied to every output buffer. Unset fields keep the
/// per-output-kind defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferTuning {
    #[serde(default)]
    pub chunk_limit_size: Option<String>,
    #[serde(default)]
    pub total_limit_size: Option<String>,
    #[serde(default)]
    pub overflow_action: Option<String>,
    #[serde(default)]
    pub flush_thread_count: Option<u32>,
    #[serde(default)]
    pub flush_interval: Option<String>,
    #[serde(default)]
    pub retry_wait: Option<String>,
    #[serde(default)]
    pub retry_max_interval: Option<String>,
}

impl GlobalDefaults {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(GenerateError::InvalidDefaults(format!(
                    "unknown log level {:?}",
                    level
                )));
            }
        }

        let Some(buffer) = &self.buffer else {
            return Ok(());
        };
        if let Some(action) = &buffer.overflow_action {
            if !OVERFLOW_ACTIONS.contains(&action.as_str()) {
                return Err(GenerateError::InvalidDefaults(format!(
                    "unknown buffer overflow action {:?}",
                    action
                )));
            }
        }
        if buffer.flush_thread_count == Some(0) {
            return Err(GenerateError::InvalidDefaults(
                "buffer flush thread count must be positive".to_string(),
            ));
        }
        for (field, value) in [
            ("chunkLimitSize", &buffer.chunk_limit_size),
            ("totalLimitSize", &buffer.total_limit_size),
            ("flushInterval", &buffer.flush_interval),
            ("retryWait", &buffer.retry_wait),
            ("retryMaxInterval", &buffer.retry_max_interval),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() || v.chars().any(char::is_whitespace) {
                    return Err(GenerateError::InvalidDefaults(format!(
                        "buffer {} must be a single token, got {:?}",
                        field, v
                    )));
                }
            }
        }
        Ok(())
    }
}
