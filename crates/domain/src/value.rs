//! Value — the state and command vocabulary shared by items and events.
//!
//! A [`Value`] travels through the event bus as a `(kind, text)` pair; the
//! [`ValueCodec`] turns that pair back into a typed value and is open for
//! extension with custom kinds.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::DecodeError;

/// Wire names for the built-in value kinds.
pub mod kind {
    pub const ON_OFF: &str = "OnOff";
    pub const OPEN_CLOSED: &str = "OpenClosed";
    pub const UP_DOWN: &str = "UpDown";
    pub const PERCENT: &str = "Percent";
    pub const DECIMAL: &str = "Decimal";
    pub const STRING: &str = "String";
    pub const DATE_TIME: &str = "DateTime";
    pub const UN_DEF: &str = "UnDef";
    pub const REFRESH: &str = "Refresh";
}

/// Binary switch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOff {
    On,
    Off,
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "ON",
            Self::Off => "OFF",
        })
    }
}

impl FromStr for OnOff {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(DecodeError::malformed_value(kind::ON_OFF, input)),
        }
    }
}

/// Contact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenClosed {
    Open,
    Closed,
}

impl fmt::Display for OpenClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        })
    }
}

impl FromStr for OpenClosed {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(DecodeError::malformed_value(kind::OPEN_CLOSED, input)),
        }
    }
}

/// Rollershutter travel command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpDown {
    Up,
    Down,
}

impl fmt::Display for UpDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        })
    }
}

impl FromStr for UpDown {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            _ => Err(DecodeError::malformed_value(kind::UP_DOWN, input)),
        }
    }
}

/// The two flavours of "no value": never initialized vs. explicitly cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnDefKind {
    Undef,
    Null,
}

impl fmt::Display for UnDefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Undef => "UNDEF",
            Self::Null => "NULL",
        })
    }
}

impl FromStr for UnDefKind {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "UNDEF" => Ok(Self::Undef),
            "NULL" => Ok(Self::Null),
            _ => Err(DecodeError::malformed_value(kind::UN_DEF, input)),
        }
    }
}

/// A typed item state or command.
///
/// The textual form produced by [`Display`](fmt::Display) is what event
/// payloads carry; every built-in kind parses its own output back losslessly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    OnOff(OnOff),
    OpenClosed(OpenClosed),
    UpDown(UpDown),
    /// Percentage in `0..=100`.
    Percent(f64),
    /// Finite decimal number.
    Decimal(f64),
    String(String),
    DateTime(DateTime<Utc>),
    UnDef(UnDefKind),
    /// Command asking an item to re-read its state from the source.
    Refresh,
}

impl Value {
    /// Wire name of this value's kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OnOff(_) => kind::ON_OFF,
            Self::OpenClosed(_) => kind::OPEN_CLOSED,
            Self::UpDown(_) => kind::UP_DOWN,
            Self::Percent(_) => kind::PERCENT,
            Self::Decimal(_) => kind::DECIMAL,
            Self::String(_) => kind::STRING,
            Self::DateTime(_) => kind::DATE_TIME,
            Self::UnDef(_) => kind::UN_DEF,
            Self::Refresh => kind::REFRESH,
        }
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff(value) => value.fmt(f),
            Self::OpenClosed(value) => value.fmt(f),
            Self::UpDown(value) => value.fmt(f),
            Self::Percent(value) | Self::Decimal(value) => value.fmt(f),
            Self::String(value) => f.write_str(value),
            Self::DateTime(value) => f.write_str(&value.to_rfc3339()),
            Self::UnDef(value) => value.fmt(f),
            Self::Refresh => f.write_str("REFRESH"),
        }
    }
}

/// Parser for one value kind.
pub type ValueParser = fn(&str) -> Result<Value, DecodeError>;

/// Registry mapping kind names to parsers.
///
/// [`ValueCodec::default`] knows every built-in kind; additional kinds can be
/// registered at composition time and take part in item and event decoding
/// like the built-ins do.
#[derive(Clone)]
pub struct ValueCodec {
    parsers: HashMap<&'static str, ValueParser>,
}

impl Default for ValueCodec {
    fn default() -> Self {
        let mut codec = Self {
            parsers: HashMap::new(),
        };
        codec.register(kind::ON_OFF, parse_on_off);
        codec.register(kind::OPEN_CLOSED, parse_open_closed);
        codec.register(kind::UP_DOWN, parse_up_down);
        codec.register(kind::PERCENT, parse_percent);
        codec.register(kind::DECIMAL, parse_decimal);
        codec.register(kind::STRING, parse_string);
        codec.register(kind::DATE_TIME, parse_date_time);
        codec.register(kind::UN_DEF, parse_un_def);
        codec.register(kind::REFRESH, parse_refresh);
        codec
    }
}

impl ValueCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser, replacing any previous one for the same kind.
    pub fn register(&mut self, kind: &'static str, parser: ValueParser) {
        self.parsers.insert(kind, parser);
    }

    /// Parse `input` as a value of the named kind.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownKind`] when no parser is registered for `kind`,
    /// or the parser's own error when the text does not belong to the kind.
    pub fn parse(&self, kind: &str, input: &str) -> Result<Value, DecodeError> {
        let parser = self
            .parsers
            .get(kind)
            .ok_or_else(|| DecodeError::UnknownKind {
                kind: kind.to_string(),
            })?;
        parser(input)
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.parsers.keys().collect();
        kinds.sort_unstable();
        f.debug_struct("ValueCodec").field("kinds", &kinds).finish()
    }
}

fn parse_on_off(input: &str) -> Result<Value, DecodeError> {
    input.parse().map(Value::OnOff)
}

fn parse_open_closed(input: &str) -> Result<Value, DecodeError> {
    input.parse().map(Value::OpenClosed)
}

fn parse_up_down(input: &str) -> Result<Value, DecodeError> {
    input.parse().map(Value::UpDown)
}

fn parse_percent(input: &str) -> Result<Value, DecodeError> {
    let number: f64 = input
        .parse()
        .map_err(|_| DecodeError::malformed_value(kind::PERCENT, input))?;
    if number.is_finite() && (0.0..=100.0).contains(&number) {
        Ok(Value::Percent(number))
    } else {
        Err(DecodeError::malformed_value(kind::PERCENT, input))
    }
}

fn parse_decimal(input: &str) -> Result<Value, DecodeError> {
    let number: f64 = input
        .parse()
        .map_err(|_| DecodeError::malformed_value(kind::DECIMAL, input))?;
    if number.is_finite() {
        Ok(Value::Decimal(number))
    } else {
        Err(DecodeError::malformed_value(kind::DECIMAL, input))
    }
}

fn parse_string(input: &str) -> Result<Value, DecodeError> {
    Ok(Value::String(input.to_string()))
}

fn parse_date_time(input: &str) -> Result<Value, DecodeError> {
    DateTime::parse_from_rfc3339(input)
        .map(|parsed| Value::DateTime(parsed.with_timezone(&Utc)))
        .map_err(|_| DecodeError::malformed_value(kind::DATE_TIME, input))
}

fn parse_un_def(input: &str) -> Result<Value, DecodeError> {
    input.parse().map(Value::UnDef)
}

fn parse_refresh(input: &str) -> Result<Value, DecodeError> {
    if input == "REFRESH" {
        Ok(Value::Refresh)
    } else {
        Err(DecodeError::malformed_value(kind::REFRESH, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_builtin_values() {
        let codec = ValueCodec::default();
        let values = [
            Value::OnOff(OnOff::On),
            Value::OpenClosed(OpenClosed::Closed),
            Value::UpDown(UpDown::Down),
            Value::Percent(42.5),
            Value::Decimal(-3.25),
            Value::string("hello world"),
            Value::DateTime("2026-01-15T08:30:00Z".parse().unwrap()),
            Value::UnDef(UnDefKind::Null),
            Value::Refresh,
        ];
        for value in values {
            let parsed = codec.parse(value.kind(), &value.to_string()).unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn should_reject_unknown_kind() {
        let codec = ValueCodec::default();
        let err = codec.parse("Color", "120,100,100").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKind { kind } if kind == "Color"));
    }

    #[test]
    fn should_reject_out_of_range_percent() {
        let codec = ValueCodec::default();
        assert!(codec.parse(kind::PERCENT, "101").is_err());
        assert!(codec.parse(kind::PERCENT, "-1").is_err());
        assert!(codec.parse(kind::PERCENT, "NaN").is_err());
        assert!(codec.parse(kind::PERCENT, "100").is_ok());
    }

    #[test]
    fn should_reject_non_finite_decimal() {
        let codec = ValueCodec::default();
        assert!(codec.parse(kind::DECIMAL, "inf").is_err());
        assert!(codec.parse(kind::DECIMAL, "twelve").is_err());
        assert!(codec.parse(kind::DECIMAL, "12.75").is_ok());
    }

    #[test]
    fn should_normalize_date_time_to_utc() {
        let codec = ValueCodec::default();
        let parsed = codec
            .parse(kind::DATE_TIME, "2026-01-15T10:30:00+02:00")
            .unwrap();
        assert_eq!(
            parsed,
            Value::DateTime("2026-01-15T08:30:00Z".parse().unwrap())
        );
    }

    #[test]
    fn should_support_custom_kinds() {
        fn parse_color(input: &str) -> Result<Value, DecodeError> {
            if input.split(',').count() == 3 {
                Ok(Value::string(input))
            } else {
                Err(DecodeError::malformed_value("Color", input))
            }
        }

        let mut codec = ValueCodec::default();
        codec.register("Color", parse_color);
        assert_eq!(
            codec.parse("Color", "120,100,100").unwrap(),
            Value::string("120,100,100")
        );
        assert!(codec.parse("Color", "120").is_err());
    }
}
