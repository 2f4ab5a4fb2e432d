//! Thing — physical devices and services, represented by their status.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod events;

/// Lifecycle status of a thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThingStatus {
    Uninitialized,
    Initializing,
    Unknown,
    Online,
    Offline,
    Removing,
    Removed,
}

impl ThingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initializing => "INITIALIZING",
            Self::Unknown => "UNKNOWN",
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Removing => "REMOVING",
            Self::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for ThingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refinement explaining why a thing is in its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThingStatusDetail {
    None,
    HandlerMissingError,
    HandlerInitializingError,
    CommunicationError,
    ConfigurationError,
    BridgeOffline,
    Disabled,
}

/// Status plus detail plus an optional human readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingStatusInfo {
    pub status: ThingStatus,
    pub status_detail: ThingStatusDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ThingStatusInfo {
    #[must_use]
    pub fn new(status: ThingStatus) -> Self {
        Self {
            status,
            status_detail: ThingStatusDetail::None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: ThingStatusDetail) -> Self {
        self.status_detail = detail;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
