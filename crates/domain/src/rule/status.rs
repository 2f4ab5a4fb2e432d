//! Rule lifecycle status, status details, and template instantiation state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, ValidationError};

/// Lifecycle status of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleStatus {
    Uninitialized,
    Initializing,
    Idle,
    Running,
}

impl RuleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Initializing => "INITIALIZING",
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refinement explaining why a rule is in its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatusDetail {
    None,
    HandlerMissingError,
    HandlerInitializingError,
    ConfigurationError,
    TemplateMissingError,
    TemplatePending,
    InvalidRule,
    Disabled,
}

impl RuleStatusDetail {
    /// Stable numeric code, kept identical across releases.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::HandlerMissingError => 1,
            Self::HandlerInitializingError => 2,
            Self::ConfigurationError => 3,
            Self::TemplateMissingError => 4,
            Self::TemplatePending => 5,
            Self::InvalidRule => 6,
            Self::Disabled => 7,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::HandlerMissingError => "HANDLER_MISSING_ERROR",
            Self::HandlerInitializingError => "HANDLER_INITIALIZING_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::TemplateMissingError => "TEMPLATE_MISSING_ERROR",
            Self::TemplatePending => "TEMPLATE_PENDING",
            Self::InvalidRule => "INVALID_RULE",
            Self::Disabled => "DISABLED",
        }
    }

    /// Whether this detail may accompany `status`.
    ///
    /// An uninitialized rule can be in any detail. While initializing or
    /// idle, only template instantiation may still be outstanding. A running
    /// rule carries no detail.
    #[must_use]
    pub fn is_valid_for(self, status: RuleStatus) -> bool {
        match status {
            RuleStatus::Uninitialized => true,
            RuleStatus::Initializing | RuleStatus::Idle => {
                matches!(self, Self::None | Self::TemplatePending)
            }
            RuleStatus::Running => matches!(self, Self::None),
        }
    }
}

impl fmt::Display for RuleStatusDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a rule's run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatusInfo {
    pub status: RuleStatus,
    pub status_detail: RuleStatusDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleStatusInfo {
    /// # Errors
    ///
    /// [`ValidationError::InvalidStatusDetail`] when the pair is outside the
    /// validity table of [`RuleStatusDetail::is_valid_for`].
    pub fn new(status: RuleStatus, detail: RuleStatusDetail) -> Result<Self, HearthError> {
        if detail.is_valid_for(status) {
            Ok(Self {
                status,
                status_detail: detail,
                description: None,
            })
        } else {
            Err(ValidationError::InvalidStatusDetail { status, detail }.into())
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where a rule stands relative to the template it was created from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateState {
    #[default]
    NoTemplate,
    Pending,
    TemplateMissing,
    Instantiated,
}

impl TemplateState {
    /// Lenient reader: trims, ignores case, and maps anything unknown to
    /// [`NoTemplate`](Self::NoTemplate).
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "template-missing" => Self::TemplateMissing,
            "instantiated" => Self::Instantiated,
            _ => Self::NoTemplate,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoTemplate => "no-template",
            Self::Pending => "pending",
            Self::TemplateMissing => "template-missing",
            Self::Instantiated => "instantiated",
        }
    }
}

impl fmt::Display for TemplateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
