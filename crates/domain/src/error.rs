//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error; the [`HearthError`] umbrella
//! converts from all of them via `#[from]` so callers can use `?` regardless
//! of which layer produced the failure.

use crate::rule::status::{RuleStatus, RuleStatusDetail};

/// Top-level error for the hearth workspace.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// A payload, discriminator, or topic could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// User-supplied configuration is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A referenced element does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A domain invariant was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures while reconstructing typed values or events from the wire form.
///
/// Producers are trusted, so these indicate a programming error on the
/// producing side and are surfaced to the caller of decode rather than
/// handled defensively.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The type discriminator is not registered with the codec.
    #[error("unknown value kind `{kind}`")]
    UnknownKind { kind: String },

    /// The canonical string form does not parse as the named kind.
    #[error("`{input}` is not a valid {kind} value")]
    MalformedValue { kind: &'static str, input: String },

    /// The event type string does not name a known event.
    #[error("unknown event type `{event_type}`")]
    UnknownEventType { event_type: String },

    /// The topic does not have the segments the event kind requires.
    #[error("malformed topic `{topic}`")]
    MalformedTopic { topic: String },

    /// The JSON payload does not match the expected bean.
    #[error("malformed event payload")]
    MalformedPayload(#[from] serde_json::Error),
}

impl DecodeError {
    #[must_use]
    pub fn malformed_value(kind: &'static str, input: impl Into<String>) -> Self {
        Self::MalformedValue {
            kind,
            input: input.into(),
        }
    }
}

/// Failures while interpreting user-supplied configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Expire duration given in both the value string and the `duration` key.
    #[error("expire duration for item `{item}` is specified in both the value string and the configuration")]
    DuplicateDuration { item: String },

    /// Expire value given in both the value string and a structured key.
    #[error("expire value for item `{item}` is specified in both the value string and the configuration")]
    DuplicateValue { item: String },

    /// Both `command` and `state` keys present.
    #[error("expire configuration for item `{item}` contains both command and state")]
    ConflictingValue { item: String },

    /// The duration string does not parse.
    #[error("`{input}` is not a valid duration")]
    InvalidDuration { input: String },

    /// The duration parsed but is not strictly positive.
    #[error("expire duration for item `{item}` must be positive")]
    NonPositiveDuration { item: String },

    /// The expiry value does not parse against the item's accepted kinds.
    #[error("`{input}` does not represent a valid {channel} for item `{item}`")]
    InvalidValue {
        item: String,
        channel: &'static str,
        input: String,
    },

    /// Keys outside the closed expire key set.
    #[error("expire configuration for item `{item}` contains unknown keys: {keys:?}")]
    UnknownKeys { item: String, keys: Vec<String> },

    /// A trigger module lacks a required configuration key.
    #[error("trigger module `{module}` is missing required key `{key}`")]
    MissingModuleConfig { module: String, key: String },

    /// The module type uid does not name a known trigger kind.
    #[error("`{type_uid}` is not a known trigger module type")]
    UnknownModuleType { type_uid: String },

    /// The wildcard pattern did not compile.
    #[error("`{pattern}` is not a valid topic pattern")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The item kind name is not part of the vocabulary.
    #[error("unknown item kind `{kind}`")]
    UnknownItemKind { kind: String },
}

/// A lookup failed because the element is not registered.
#[derive(Debug, thiserror::Error)]
#[error("{entity} `{name}` does not exist")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub name: String,
}

impl NotFoundError {
    #[must_use]
    pub fn item(name: impl Into<String>) -> Self {
        Self {
            entity: "item",
            name: name.into(),
        }
    }

    #[must_use]
    pub fn metadata(key: impl Into<String>) -> Self {
        Self {
            entity: "metadata",
            name: key.into(),
        }
    }
}

/// A domain invariant was violated.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Rules must carry a non-empty uid.
    #[error("rule uid must not be empty")]
    EmptyRuleUid,

    /// The status detail is outside the validity table for the status.
    #[error("status detail `{detail}` is not valid for status `{status}`")]
    InvalidStatusDetail {
        status: RuleStatus,
        detail: RuleStatusDetail,
    },

    /// Registries keep one element per identifier.
    #[error("{entity} `{name}` is already registered")]
    AlreadyRegistered { entity: &'static str, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_with_item_name() {
        let err = NotFoundError::item("Bedroom_Light");
        assert_eq!(err.to_string(), "item `Bedroom_Light` does not exist");
    }

    #[test]
    fn should_keep_inner_message_through_umbrella() {
        let err: HearthError = DecodeError::UnknownKind {
            kind: "Color".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown value kind `Color`");
    }

    #[test]
    fn should_name_offending_keys() {
        let err = ConfigurationError::UnknownKeys {
            item: "Sensor".to_string(),
            keys: vec!["durration".to_string()],
        };
        assert!(err.to_string().contains("durration"));
    }
}
