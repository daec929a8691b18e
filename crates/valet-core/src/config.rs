use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ValetError};
use crate::types::AutonomyLevel;

/// Top-level configuration for the Valet dispatcher.
///
/// Loaded from `~/.valet/config.toml` by default. Each section corresponds
/// to one subsystem. Malformed values that would leave the scheduler
/// unable to start are rejected by [`ValetConfig::validate`], which is
/// fatal at initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValetConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl ValetConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ValetConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the scheduler or router cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_seconds == 0 {
            return Err(ValetError::Config(
                "scheduler.tick_seconds must be at least 1".to_string(),
            ));
        }
        if self.dispatch.invoke_timeout_seconds == 0 {
            return Err(ValetError::Config(
                "dispatch.invoke_timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.analytics.window_days == 0 {
            return Err(ValetError::Config(
                "analytics.window_days must be at least 1".to_string(),
            ));
        }
        parse_daily_time(&self.scheduler.daily_summary_time)?;
        Ok(())
    }
}

/// Parse a `HH:MM` fire time into `(hour, minute)`.
///
/// Malformed times are a configuration error, fatal at startup.
pub fn parse_daily_time(s: &str) -> Result<(u8, u8)> {
    let invalid = || ValetError::Config(format!("invalid daily time '{}': expected HH:MM", s));
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    let hour: u8 = h.parse().map_err(|_| invalid())?;
    let minute: u8 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the external activity sink.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.valet/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Interactive dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Default per-call budget for a provider invocation, in seconds.
    pub invoke_timeout_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            invoke_timeout_seconds: 10,
        }
    }
}

/// Background rule scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Uniform polling period at which every rule's due-ness is evaluated.
    pub tick_seconds: u64,
    /// How long shutdown waits for in-flight rules before abandoning them.
    pub shutdown_grace_seconds: u64,
    /// Process-wide autonomy level at startup.
    pub autonomy: AutonomyLevel,
    /// Interval for the unread-inbox check rule.
    pub inbox_check_minutes: u64,
    /// Interval for the pattern analysis rule.
    pub pattern_analysis_minutes: u64,
    /// Interval for the media cleanup rule.
    pub media_cleanup_minutes: u64,
    /// Fire time (HH:MM, UTC) for the daily summary rule.
    pub daily_summary_time: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 1,
            shutdown_grace_seconds: 5,
            autonomy: AutonomyLevel::Normal,
            inbox_check_minutes: 15,
            pattern_analysis_minutes: 60,
            media_cleanup_minutes: 1440,
            daily_summary_time: "18:00".to_string(),
        }
    }
}

/// Proactive notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Token-bucket limit on deliveries per minute.
    pub max_per_minute: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { max_per_minute: 10 }
    }
}

/// Analytics thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Snapshot window in days.
    pub window_days: u32,
    /// Minimum occurrences before a time cluster counts as a pattern.
    pub pattern_min_count: u32,
    /// Unread emails past this count trigger a backlog suggestion.
    pub unread_backlog_threshold: u32,
    /// Recent media items past this count trigger a cleanup suggestion.
    pub media_cleanup_threshold: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            pattern_min_count: 3,
            unread_backlog_threshold: 10,
            media_cleanup_threshold: 50,
        }
    }
}
