//! Core domain types shared across the Valet workspace.
//!
//! Defines timestamps, autonomy levels, activity events, and the uniform
//! execution result returned by every capability invocation.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Time
// =============================================================================

/// Unix timestamp in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    /// Hour of day (0-23) in UTC.
    pub fn hour(&self) -> u8 {
        use chrono::Timelike;
        self.to_datetime().hour() as u8
    }

    /// Day of week, 0 = Monday .. 6 = Sunday.
    pub fn weekday(&self) -> u8 {
        use chrono::Datelike;
        self.to_datetime().weekday().num_days_from_monday() as u8
    }

    /// Civil date (UTC) this timestamp falls on.
    pub fn date(&self) -> chrono::NaiveDate {
        self.to_datetime().date_naive()
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Process-wide autonomy setting controlling background behavior.
///
/// Read by the rule scheduler on every tick; changing the level takes
/// effect on the next tick, never retroactively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    /// No rules run automatically; manual trigger only.
    Minimal,
    /// The default rule set runs at configured intervals.
    #[default]
    Normal,
    /// Default rules plus raised suggestion sensitivity.
    Maximum,
}

impl fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutonomyLevel::Minimal => write!(f, "minimal"),
            AutonomyLevel::Normal => write!(f, "normal"),
            AutonomyLevel::Maximum => write!(f, "maximum"),
        }
    }
}

impl std::str::FromStr for AutonomyLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(AutonomyLevel::Minimal),
            "normal" => Ok(AutonomyLevel::Normal),
            "maximum" => Ok(AutonomyLevel::Maximum),
            _ => Err(format!("Unknown autonomy level: {}", s)),
        }
    }
}

/// Category of an activity event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Mail,
    Messaging,
    Media,
    Task,
    Suggestion,
    System,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Mail => write!(f, "mail"),
            EventCategory::Messaging => write!(f, "messaging"),
            EventCategory::Media => write!(f, "media"),
            EventCategory::Task => write!(f, "task"),
            EventCategory::Suggestion => write!(f, "suggestion"),
            EventCategory::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for EventCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mail" => Ok(EventCategory::Mail),
            "messaging" => Ok(EventCategory::Messaging),
            "media" => Ok(EventCategory::Media),
            "task" => Ok(EventCategory::Task),
            "suggestion" => Ok(EventCategory::Suggestion),
            "system" => Ok(EventCategory::System),
            _ => Err(format!("Unknown event category: {}", s)),
        }
    }
}

/// Outcome classification of a dispatched intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure,
    NeedsConfirmation,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failure => write!(f, "failure"),
            ExecutionStatus::NeedsConfirmation => write!(f, "needs_confirmation"),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// Result returned synchronously by every capability invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub message: String,
    pub payload: Option<serde_json::Value>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            message: message.into(),
            payload: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failure,
            message: message.into(),
            payload: None,
        }
    }

    pub fn needs_confirmation(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::NeedsConfirmation,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// An immutable record of something that happened.
///
/// Used both as audit log and analytics input. Append-only; never mutated
/// or deleted by the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub timestamp: Timestamp,
    /// Capability name, or "system" for events the core emits itself.
    pub source: String,
    pub category: EventCategory,
    pub title: String,
    pub content: String,
    /// Opaque to the core; collaborators attach what they need.
    pub metadata: HashMap<String, String>,
}

impl ActivityEvent {
    /// Build an event stamped with the given time.
    pub fn new(
        timestamp: Timestamp,
        source: impl Into<String>,
        category: EventCategory,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            source: source.into(),
            category,
            title: title.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
