//! Topic — hierarchical event addresses and glob-style filters.
//!
//! Topics are slash-separated paths under the `hearth/` root. The templates
//! below carry `{placeholder}` segments that the event factories fill in.

use regex::Regex;

use crate::error::{ConfigurationError, HearthError};
use crate::event::Event;

pub const ITEM_STATE_TOPIC: &str = "hearth/items/{itemName}/state";
pub const ITEM_COMMAND_TOPIC: &str = "hearth/items/{itemName}/command";
pub const ITEM_STATE_CHANGED_TOPIC: &str = "hearth/items/{itemName}/statechanged";
pub const GROUP_STATE_CHANGED_TOPIC: &str = "hearth/items/{itemName}/{memberName}/statechanged";
pub const ITEM_ADDED_TOPIC: &str = "hearth/items/{itemName}/added";
pub const ITEM_REMOVED_TOPIC: &str = "hearth/items/{itemName}/removed";
pub const ITEM_UPDATED_TOPIC: &str = "hearth/items/{itemName}/updated";
pub const THING_STATUS_TOPIC: &str = "hearth/things/{thingUID}/status";
pub const THING_STATUS_CHANGED_TOPIC: &str = "hearth/things/{thingUID}/statuschanged";

/// Glob-style filter over event topics.
///
/// `*` matches any run of characters and `?` matches exactly one; both cross
/// segment boundaries. A blank pattern matches every topic. Everything else
/// is taken literally.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    pattern: String,
    matcher: Option<Regex>,
}

impl TopicFilter {
    /// Compile a filter from its glob pattern.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPattern`] when the translated pattern
    /// does not compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self, HearthError> {
        let pattern = pattern.into();
        let trimmed = pattern.trim();
        let matcher = if trimmed.is_empty() {
            None
        } else {
            Some(compile(trimmed)?)
        };
        Ok(Self { pattern, matcher })
    }

    /// The glob pattern this filter was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this filter lets `topic` through.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        self.matcher
            .as_ref()
            .is_none_or(|matcher| matcher.is_match(topic))
    }

    /// Whether this filter lets `event` through.
    #[must_use]
    pub fn accepts(&self, event: &Event) -> bool {
        self.matches(&event.topic)
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigurationError> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '?' | '*' => {
                translated.push_str(&regex::escape(&literal));
                literal.clear();
                translated.push_str(if ch == '?' { "." } else { ".*?" });
            }
            _ => literal.push(ch),
        }
    }
    translated.push_str(&regex::escape(&literal));
    translated.push('$');
    Regex::new(&translated).map_err(|source| ConfigurationError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_everything_when_blank() {
        for pattern in ["", "   "] {
            let filter = TopicFilter::new(pattern).unwrap();
            assert!(filter.matches("hearth/items/kitchen/state"));
            assert!(filter.matches("anything at all"));
        }
    }

    #[test]
    fn should_match_literal_topics_exactly() {
        let filter = TopicFilter::new("hearth/items/kitchen/command").unwrap();
        assert!(filter.matches("hearth/items/kitchen/command"));
        assert!(!filter.matches("hearth/items/kitchen/state"));
        assert!(!filter.matches("hearth/items/kitchen/command/extra"));
    }

    #[test]
    fn should_expand_star_across_segments() {
        let filter = TopicFilter::new("hearth/items/*").unwrap();
        assert!(filter.matches("hearth/items/kitchen/state"));
        assert!(filter.matches("hearth/items/upstairs/lamp/statechanged"));
        assert!(!filter.matches("hearth/things/demo:sensor:1/status"));

        let filter = TopicFilter::new("hearth/things/*/status").unwrap();
        assert!(filter.matches("hearth/things/demo:sensor:1/status"));
        assert!(filter.matches("hearth/things/demo/sensor/status"));
    }

    #[test]
    fn should_match_exactly_one_char_for_question_mark() {
        let filter = TopicFilter::new("hearth/items/lamp?/state").unwrap();
        assert!(filter.matches("hearth/items/lamp1/state"));
        assert!(filter.matches("hearth/items/lampX/state"));
        assert!(!filter.matches("hearth/items/lamp/state"));
        assert!(!filter.matches("hearth/items/lamp42/state"));
    }

    #[test]
    fn should_escape_regex_metacharacters_in_literals() {
        let filter = TopicFilter::new("hearth/things/hue:bulb.1/*").unwrap();
        assert!(filter.matches("hearth/things/hue:bulb.1/status"));
        assert!(filter.matches("hearth/things/hue:bulb.1/statuschanged"));
        assert!(!filter.matches("hearth/things/hue:bulbX1/status"));
    }

    #[test]
    fn should_accept_events_by_topic() {
        let filter = TopicFilter::new("hearth/things/demo:sensor:1/*").unwrap();
        let event = Event::new(
            "hearth/things/demo:sensor:1/status",
            "ThingStatusInfoEvent",
            "{}",
        );
        assert!(filter.accepts(&event));
    }
}
