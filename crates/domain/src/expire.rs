//! Expire — per-item expiry settings parsed from `expire` metadata.
//!
//! The metadata value reads `<duration>[,[command=|state=]<value>]`. The
//! structured configuration may carry the same settings under explicit keys,
//! plus flags controlling which events re-arm the timer.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::configuration::Configuration;
use crate::error::{ConfigurationError, HearthError};
use crate::item::Item;
use crate::value::{UnDefKind, Value, ValueCodec};

/// Metadata namespace the expiry settings live under.
pub const METADATA_NAMESPACE: &str = "expire";

const CONFIG_DURATION: &str = "duration";
const CONFIG_COMMAND: &str = "command";
const CONFIG_STATE: &str = "state";
const CONFIG_IGNORE_STATE_UPDATES: &str = "ignoreStateUpdates";
const CONFIG_IGNORE_COMMANDS: &str = "ignoreCommands";

const KNOWN_KEYS: [&str; 5] = [
    CONFIG_DURATION,
    CONFIG_COMMAND,
    CONFIG_STATE,
    CONFIG_IGNORE_STATE_UPDATES,
    CONFIG_IGNORE_COMMANDS,
];

const COMMAND_PREFIX: &str = "command=";
const STATE_PREFIX: &str = "state=";

/// What to apply to an item when its timer runs out.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpireAction {
    Command(Value),
    State(Value),
}

impl ExpireAction {
    /// The value this action applies, whichever channel it uses.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Command(value) | Self::State(value) => value,
        }
    }
}

/// Parsed expiry settings for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpireConfig {
    pub duration: Duration,
    pub action: ExpireAction,
    pub ignore_state_updates: bool,
    pub ignore_commands: bool,
}

impl ExpireConfig {
    /// Parse the metadata value string and its structured configuration.
    ///
    /// The value is matched against the item's accepted kinds, so the same
    /// text means different things on different items.
    ///
    /// # Errors
    ///
    /// A [`ConfigurationError`] naming the offending part: duration or value
    /// given twice, command and state given together, a duration that is not
    /// strictly positive, a value outside the item's vocabulary, or keys
    /// outside the known set.
    pub fn parse(
        item: &Item,
        config_string: &str,
        configuration: &Configuration,
        codec: &ValueCodec,
    ) -> Result<Self, HearthError> {
        let (duration_part, value_part) = match config_string.split_once(',') {
            Some((duration, value)) => (duration.trim(), value.trim()),
            None => (config_string.trim(), ""),
        };

        let configured_duration = configuration.string(CONFIG_DURATION);
        let duration_text = if duration_part.is_empty() {
            configured_duration.unwrap_or_default()
        } else {
            if configured_duration.is_some() {
                return Err(ConfigurationError::DuplicateDuration {
                    item: item.name.to_string(),
                }
                .into());
            }
            duration_part.to_string()
        };
        let duration = parse_duration(&duration_text)?;
        if duration.is_zero() {
            return Err(ConfigurationError::NonPositiveDuration {
                item: item.name.to_string(),
            }
            .into());
        }

        let ignore_state_updates = configuration
            .boolean(CONFIG_IGNORE_STATE_UPDATES)
            .unwrap_or(false);
        let ignore_commands = configuration.boolean(CONFIG_IGNORE_COMMANDS).unwrap_or(false);

        let mut command_text = configuration.string(CONFIG_COMMAND);
        let mut state_text = configuration.string(CONFIG_STATE);
        if !value_part.is_empty() {
            if command_text.is_some() || state_text.is_some() {
                return Err(ConfigurationError::DuplicateValue {
                    item: item.name.to_string(),
                }
                .into());
            }
            if let Some(rest) = value_part.strip_prefix(COMMAND_PREFIX) {
                command_text = Some(rest.to_string());
            } else {
                let rest = value_part.strip_prefix(STATE_PREFIX).unwrap_or(value_part);
                state_text = Some(rest.to_string());
            }
        }
        if command_text.is_some() && state_text.is_some() {
            return Err(ConfigurationError::ConflictingValue {
                item: item.name.to_string(),
            }
            .into());
        }

        let action = if let Some(text) = command_text {
            let value =
                item.parse_command(codec, &text)
                    .ok_or_else(|| ConfigurationError::InvalidValue {
                        item: item.name.to_string(),
                        channel: "command",
                        input: text.clone(),
                    })?;
            ExpireAction::Command(value)
        } else if let Some(text) = state_text {
            let value =
                item.parse_state(codec, &text)
                    .ok_or_else(|| ConfigurationError::InvalidValue {
                        item: item.name.to_string(),
                        channel: "state",
                        input: text.clone(),
                    })?;
            ExpireAction::State(unquote_undef_literals(value))
        } else {
            ExpireAction::State(Value::UnDef(UnDefKind::Undef))
        };

        let mut unknown: Vec<String> = configuration
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(key))
            .map(ToString::to_string)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(ConfigurationError::UnknownKeys {
                item: item.name.to_string(),
                keys: unknown,
            }
            .into());
        }

        Ok(Self {
            duration,
            action,
            ignore_state_updates,
            ignore_commands,
        })
    }
}

/// Single-quoted `'NULL'` and `'UNDEF'` are escapes for the plain strings,
/// so string items can expire to those words instead of to no value.
fn unquote_undef_literals(value: Value) -> Value {
    match value {
        Value::String(text) if text == "'NULL'" => Value::string("NULL"),
        Value::String(text) if text == "'UNDEF'" => Value::string("UNDEF"),
        other => other,
    }
}

/// Parse a duration in either shorthand (`1d1h15m30s`) or ISO-8601
/// (`PT1H15M30S`) form.
///
/// # Errors
///
/// [`ConfigurationError::InvalidDuration`] when the text fits neither form.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigurationError> {
    let input = input.trim();
    if input.starts_with(['P', 'p']) {
        parse_iso_duration(input)
    } else {
        humantime::parse_duration(input).map_err(|_| invalid_duration(input))
    }
}

fn parse_iso_duration(input: &str) -> Result<Duration, ConfigurationError> {
    const SECONDS_PER_UNIT: [(usize, u64); 4] = [(1, 86_400), (2, 3_600), (3, 60), (4, 1)];

    let captures = iso_matcher()
        .captures(input)
        .ok_or_else(|| invalid_duration(input))?;
    let mut duration = Duration::ZERO;
    let mut any_unit = false;
    for (group, seconds) in SECONDS_PER_UNIT {
        if let Some(figure) = captures.get(group) {
            let amount: u64 = figure
                .as_str()
                .parse()
                .map_err(|_| invalid_duration(input))?;
            let seconds = amount
                .checked_mul(seconds)
                .ok_or_else(|| invalid_duration(input))?;
            duration = duration
                .checked_add(Duration::from_secs(seconds))
                .ok_or_else(|| invalid_duration(input))?;
            any_unit = true;
        }
    }
    if any_unit {
        Ok(duration)
    } else {
        Err(invalid_duration(input))
    }
}

fn iso_matcher() -> &'static Regex {
    static MATCHER: OnceLock<Regex> = OnceLock::new();
    MATCHER.get_or_init(|| {
        Regex::new(r"^[Pp](?:(\d+)[Dd])?(?:[Tt](?:(\d+)[Hh])?(?:(\d+)[Mm])?(?:(\d+)[Ss])?)?$")
            .expect("valid duration pattern")
    })
}

fn invalid_duration(input: &str) -> ConfigurationError {
    ConfigurationError::InvalidDuration {
        input: input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::value::OnOff;

    fn switch() -> Item {
        Item::new("porch_lamp", ItemKind::Switch)
    }

    fn parse(item: &Item, value: &str, configuration: Configuration) -> Result<ExpireConfig, HearthError> {
        ExpireConfig::parse(item, value, &configuration, &ValueCodec::default())
    }

    fn parse_err(item: &Item, value: &str, configuration: Configuration) -> ConfigurationError {
        match parse(item, value, configuration).unwrap_err() {
            HearthError::Configuration(err) => err,
            other => panic!("expected a configuration error, got {other}"),
        }
    }

    #[test]
    fn should_parse_shorthand_and_iso_durations() {
        assert_eq!(
            parse_duration("1d1h15m30s").unwrap(),
            Duration::from_secs(86_400 + 3_600 + 900 + 30)
        );
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(
            parse_duration("PT1H15M30S").unwrap(),
            Duration::from_secs(4_530)
        );
        assert_eq!(
            parse_duration("P2DT3H4M5S").unwrap(),
            Duration::from_secs(183_845)
        );
        assert_eq!(parse_duration("pt1h").unwrap(), Duration::from_secs(3_600));
        for bad in ["", "P", "PT", "soon", "P1Y"] {
            assert!(parse_duration(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn should_default_to_reverting_to_undef() {
        let config = parse(&switch(), "1h", Configuration::new()).unwrap();
        assert_eq!(config.duration, Duration::from_secs(3_600));
        assert_eq!(
            config.action,
            ExpireAction::State(Value::UnDef(UnDefKind::Undef))
        );
        assert!(!config.ignore_state_updates);
        assert!(!config.ignore_commands);
    }

    #[test]
    fn should_take_duration_from_the_configuration_key() {
        let config = parse(
            &switch(),
            "",
            Configuration::new().with("duration", "30m"),
        )
        .unwrap();
        assert_eq!(config.duration, Duration::from_secs(1_800));
    }

    #[test]
    fn should_reject_duration_given_twice() {
        let err = parse_err(
            &switch(),
            "1h",
            Configuration::new().with("duration", "30m"),
        );
        assert!(matches!(err, ConfigurationError::DuplicateDuration { .. }));
    }

    #[test]
    fn should_reject_zero_and_missing_durations() {
        assert!(matches!(
            parse_err(&switch(), "0s", Configuration::new()),
            ConfigurationError::NonPositiveDuration { .. }
        ));
        assert!(matches!(
            parse_err(&switch(), "", Configuration::new()),
            ConfigurationError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn should_parse_command_values() {
        let config = parse(&switch(), "1h,command=OFF", Configuration::new()).unwrap();
        assert_eq!(config.action, ExpireAction::Command(Value::OnOff(OnOff::Off)));

        let config = parse(
            &switch(),
            "1h",
            Configuration::new().with("command", "OFF"),
        )
        .unwrap();
        assert_eq!(config.action, ExpireAction::Command(Value::OnOff(OnOff::Off)));
    }

    #[test]
    fn should_parse_state_values_with_and_without_prefix() {
        let dimmer = Item::new("hall", ItemKind::Dimmer);
        let config = parse(&dimmer, "5m,state=0", Configuration::new()).unwrap();
        assert_eq!(config.action, ExpireAction::State(Value::Percent(0.0)));

        let config = parse(&dimmer, "5m,0", Configuration::new()).unwrap();
        assert_eq!(config.action, ExpireAction::State(Value::Percent(0.0)));
    }

    #[test]
    fn should_reject_value_given_twice() {
        let err = parse_err(
            &switch(),
            "1h,OFF",
            Configuration::new().with("state", "ON"),
        );
        assert!(matches!(err, ConfigurationError::DuplicateValue { .. }));
    }

    #[test]
    fn should_reject_command_and_state_together() {
        let err = parse_err(
            &switch(),
            "1h",
            Configuration::new().with("command", "OFF").with("state", "ON"),
        );
        assert!(matches!(err, ConfigurationError::ConflictingValue { .. }));
    }

    #[test]
    fn should_reject_values_outside_the_item_vocabulary() {
        let err = parse_err(&switch(), "1h,command=OPEN", Configuration::new());
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue { channel: "command", .. }
        ));

        let err = parse_err(&switch(), "1h,BANANA", Configuration::new());
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue { channel: "state", .. }
        ));
    }

    #[test]
    fn should_unquote_undef_literals_for_string_items() {
        let note = Item::new("note", ItemKind::String);
        let config = parse(&note, "1h,'NULL'", Configuration::new()).unwrap();
        assert_eq!(config.action, ExpireAction::State(Value::string("NULL")));

        let config = parse(&note, "1h,state='UNDEF'", Configuration::new()).unwrap();
        assert_eq!(config.action, ExpireAction::State(Value::string("UNDEF")));

        // quoting only means something on items that accept free strings
        let err = parse_err(&switch(), "1h,'NULL'", Configuration::new());
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn should_read_ignore_flags_with_string_coercion() {
        let config = parse(
            &switch(),
            "1h",
            Configuration::new()
                .with("ignoreStateUpdates", "true")
                .with("ignoreCommands", true),
        )
        .unwrap();
        assert!(config.ignore_state_updates);
        assert!(config.ignore_commands);
    }

    #[test]
    fn should_name_unknown_keys_after_other_checks() {
        let err = parse_err(
            &switch(),
            "1h",
            Configuration::new().with("durations", "5m").with("comand", "OFF"),
        );
        assert!(matches!(
            err,
            ConfigurationError::UnknownKeys { keys, .. }
                if keys == vec!["comand".to_string(), "durations".to_string()]
        ));

        // a malformed duration wins over the unknown key
        let err = parse_err(
            &switch(),
            "soon",
            Configuration::new().with("frobnicate", 1),
        );
        assert!(matches!(err, ConfigurationError::InvalidDuration { .. }));
    }
}
