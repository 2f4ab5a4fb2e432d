//! Item — the addressable entities of the home model and their value
//! vocabularies.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::id::ItemName;
use crate::value::{Value, ValueCodec, kind};

pub mod events;

/// The value vocabulary an item speaks.
///
/// The accepted kind slices are ordered: parsers run front to back, so the
/// kind listed first wins when a text form is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Switch,
    Contact,
    Dimmer,
    Number,
    String,
    DateTime,
    Rollershutter,
    /// Aggregates members; speaks the vocabulary of its base kind, if any.
    Group { base: Option<Box<ItemKind>> },
}

impl ItemKind {
    /// Bare kind name, without any group base.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Switch => "Switch",
            Self::Contact => "Contact",
            Self::Dimmer => "Dimmer",
            Self::Number => "Number",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Rollershutter => "Rollershutter",
            Self::Group { .. } => "Group",
        }
    }

    /// Value kinds accepted as state, in parse order.
    #[must_use]
    pub fn accepted_state_kinds(&self) -> &[&'static str] {
        match self {
            Self::Switch => &[kind::ON_OFF, kind::UN_DEF],
            Self::Contact => &[kind::OPEN_CLOSED, kind::UN_DEF],
            Self::Dimmer => &[kind::PERCENT, kind::ON_OFF, kind::UN_DEF],
            Self::Number => &[kind::DECIMAL, kind::UN_DEF],
            Self::String => &[kind::STRING, kind::DATE_TIME, kind::UN_DEF],
            Self::DateTime => &[kind::DATE_TIME, kind::UN_DEF],
            Self::Rollershutter => &[kind::PERCENT, kind::UP_DOWN, kind::UN_DEF],
            Self::Group { base } => base.as_ref().map_or(&[], |base| base.accepted_state_kinds()),
        }
    }

    /// Value kinds accepted as commands, in parse order.
    #[must_use]
    pub fn accepted_command_kinds(&self) -> &[&'static str] {
        match self {
            Self::Switch => &[kind::ON_OFF, kind::REFRESH],
            Self::Contact => &[kind::REFRESH],
            Self::Dimmer => &[kind::PERCENT, kind::ON_OFF, kind::REFRESH],
            Self::Number => &[kind::DECIMAL, kind::REFRESH],
            Self::String => &[kind::STRING, kind::REFRESH],
            Self::DateTime => &[kind::DATE_TIME, kind::REFRESH],
            Self::Rollershutter => &[kind::UP_DOWN, kind::PERCENT, kind::REFRESH],
            Self::Group { base } => base
                .as_ref()
                .map_or(&[], |base| base.accepted_command_kinds()),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group { base: Some(base) } => write!(f, "Group:{base}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for ItemKind {
    type Err = ConfigurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Some(base) = input.strip_prefix("Group:") {
            return Ok(Self::Group {
                base: Some(Box::new(base.parse()?)),
            });
        }
        match input {
            "Switch" => Ok(Self::Switch),
            "Contact" => Ok(Self::Contact),
            "Dimmer" => Ok(Self::Dimmer),
            "Number" => Ok(Self::Number),
            "String" => Ok(Self::String),
            "DateTime" => Ok(Self::DateTime),
            "Rollershutter" => Ok(Self::Rollershutter),
            "Group" => Ok(Self::Group { base: None }),
            _ => Err(ConfigurationError::UnknownItemKind {
                kind: input.to_string(),
            }),
        }
    }
}

/// An addressable item of the home model.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: ItemName,
    pub kind: ItemKind,
    pub label: Option<String>,
}

impl Item {
    #[must_use]
    pub fn new(name: impl Into<ItemName>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parse `input` against the accepted state kinds, first match wins.
    #[must_use]
    pub fn parse_state(&self, codec: &ValueCodec, input: &str) -> Option<Value> {
        parse_first(codec, self.kind.accepted_state_kinds(), input)
    }

    /// Parse `input` against the accepted command kinds, first match wins.
    #[must_use]
    pub fn parse_command(&self, codec: &ValueCodec, input: &str) -> Option<Value> {
        parse_first(codec, self.kind.accepted_command_kinds(), input)
    }
}

fn parse_first(codec: &ValueCodec, kinds: &[&str], input: &str) -> Option<Value> {
    kinds.iter().find_map(|kind| codec.parse(kind, input).ok())
}
