//! Typed item events and their envelope codec.
//!
//! [`ItemEventFactory`] is the only place that knows how item events look on
//! the wire: topics name the item, payloads carry `(kind, value)` pairs, and
//! the item name is recovered from the topic on the way back in.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, HearthError};
use crate::event::Event;
use crate::id::ItemName;
use crate::item::Item;
use crate::topic;
use crate::value::{Value, ValueCodec};

pub const ITEM_STATE_EVENT: &str = "ItemStateEvent";
pub const ITEM_COMMAND_EVENT: &str = "ItemCommandEvent";
pub const ITEM_STATE_CHANGED_EVENT: &str = "ItemStateChangedEvent";
pub const GROUP_ITEM_STATE_CHANGED_EVENT: &str = "GroupItemStateChangedEvent";
pub const ITEM_ADDED_EVENT: &str = "ItemAddedEvent";
pub const ITEM_REMOVED_EVENT: &str = "ItemRemovedEvent";
pub const ITEM_UPDATED_EVENT: &str = "ItemUpdatedEvent";

/// Wire form of an item inside lifecycle event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDto {
    pub name: ItemName,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            kind: item.kind.to_string(),
            label: item.label.clone(),
        }
    }
}

/// A decoded item event.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    State {
        item_name: ItemName,
        value: Value,
    },
    Command {
        item_name: ItemName,
        value: Value,
    },
    StateChanged {
        item_name: ItemName,
        value: Value,
        old_value: Value,
    },
    GroupStateChanged {
        item_name: ItemName,
        member_name: ItemName,
        value: Value,
        old_value: Value,
    },
    Added {
        item: ItemDto,
    },
    Removed {
        item: ItemDto,
    },
    Updated {
        item: ItemDto,
        old_item: ItemDto,
    },
}

impl ItemEvent {
    /// Name of the item this event is about.
    #[must_use]
    pub fn item_name(&self) -> &ItemName {
        match self {
            Self::State { item_name, .. }
            | Self::Command { item_name, .. }
            | Self::StateChanged { item_name, .. }
            | Self::GroupStateChanged { item_name, .. } => item_name,
            Self::Added { item } | Self::Removed { item } | Self::Updated { item, .. } => {
                &item.name
            }
        }
    }
}

#[derive(Deserialize)]
struct ValuePayload {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangedPayload {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    old_type: String,
    old_value: String,
}

/// Builds and parses item event envelopes.
#[derive(Debug, Clone, Default)]
pub struct ItemEventFactory {
    codec: ValueCodec,
}

impl ItemEventFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a codec carrying custom value kinds.
    #[must_use]
    pub fn with_codec(codec: ValueCodec) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    #[must_use]
    pub fn state_event(&self, item_name: &ItemName, value: &Value, source: Option<&str>) -> Event {
        let topic = topic::ITEM_STATE_TOPIC.replace("{itemName}", item_name.as_str());
        with_source(
            Event::new(topic, ITEM_STATE_EVENT, value_payload(value)),
            source,
        )
    }

    #[must_use]
    pub fn command_event(
        &self,
        item_name: &ItemName,
        value: &Value,
        source: Option<&str>,
    ) -> Event {
        let topic = topic::ITEM_COMMAND_TOPIC.replace("{itemName}", item_name.as_str());
        with_source(
            Event::new(topic, ITEM_COMMAND_EVENT, value_payload(value)),
            source,
        )
    }

    #[must_use]
    pub fn state_changed_event(
        &self,
        item_name: &ItemName,
        value: &Value,
        old_value: &Value,
    ) -> Event {
        let topic = topic::ITEM_STATE_CHANGED_TOPIC.replace("{itemName}", item_name.as_str());
        Event::new(
            topic,
            ITEM_STATE_CHANGED_EVENT,
            changed_payload(value, old_value),
        )
    }

    #[must_use]
    pub fn group_state_changed_event(
        &self,
        item_name: &ItemName,
        member_name: &ItemName,
        value: &Value,
        old_value: &Value,
    ) -> Event {
        let topic = topic::GROUP_STATE_CHANGED_TOPIC
            .replace("{itemName}", item_name.as_str())
            .replace("{memberName}", member_name.as_str());
        Event::new(
            topic,
            GROUP_ITEM_STATE_CHANGED_EVENT,
            changed_payload(value, old_value),
        )
    }

    #[must_use]
    pub fn added_event(&self, item: &Item) -> Event {
        let topic = topic::ITEM_ADDED_TOPIC.replace("{itemName}", item.name.as_str());
        Event::new(
            topic,
            ITEM_ADDED_EVENT,
            serde_json::json!(ItemDto::from(item)).to_string(),
        )
    }

    #[must_use]
    pub fn removed_event(&self, item: &Item) -> Event {
        let topic = topic::ITEM_REMOVED_TOPIC.replace("{itemName}", item.name.as_str());
        Event::new(
            topic,
            ITEM_REMOVED_EVENT,
            serde_json::json!(ItemDto::from(item)).to_string(),
        )
    }

    #[must_use]
    pub fn updated_event(&self, item: &Item, old_item: &Item) -> Event {
        let topic = topic::ITEM_UPDATED_TOPIC.replace("{itemName}", item.name.as_str());
        Event::new(
            topic,
            ITEM_UPDATED_EVENT,
            serde_json::json!([ItemDto::from(item), ItemDto::from(old_item)]).to_string(),
        )
    }

    /// Decode an envelope into a typed item event.
    ///
    /// # Errors
    ///
    /// A [`DecodeError`] variant when the type is unknown, the topic is
    /// missing its item segments, the payload is not the expected JSON, or
    /// the carried value does not parse as its declared kind.
    pub fn parse(&self, event: &Event) -> Result<ItemEvent, HearthError> {
        match event.event_type.as_str() {
            ITEM_STATE_EVENT => {
                let (item_name, value) = self.parse_value_event(event)?;
                Ok(ItemEvent::State { item_name, value })
            }
            ITEM_COMMAND_EVENT => {
                let (item_name, value) = self.parse_value_event(event)?;
                Ok(ItemEvent::Command { item_name, value })
            }
            ITEM_STATE_CHANGED_EVENT => {
                let item_name = item_name_from_topic(&event.topic)?;
                let (value, old_value) = self.parse_changed_payload(&event.payload)?;
                Ok(ItemEvent::StateChanged {
                    item_name,
                    value,
                    old_value,
                })
            }
            GROUP_ITEM_STATE_CHANGED_EVENT => {
                let (item_name, member_name) = group_names_from_topic(&event.topic)?;
                let (value, old_value) = self.parse_changed_payload(&event.payload)?;
                Ok(ItemEvent::GroupStateChanged {
                    item_name,
                    member_name,
                    value,
                    old_value,
                })
            }
            ITEM_ADDED_EVENT => {
                let item = parse_dto_payload(&event.payload)?;
                Ok(ItemEvent::Added { item })
            }
            ITEM_REMOVED_EVENT => {
                let item = parse_dto_payload(&event.payload)?;
                Ok(ItemEvent::Removed { item })
            }
            ITEM_UPDATED_EVENT => {
                let (item, old_item) = serde_json::from_str(&event.payload)
                    .map_err(DecodeError::MalformedPayload)?;
                Ok(ItemEvent::Updated { item, old_item })
            }
            other => Err(DecodeError::UnknownEventType {
                event_type: other.to_string(),
            }
            .into()),
        }
    }

    fn parse_value_event(&self, event: &Event) -> Result<(ItemName, Value), HearthError> {
        let item_name = item_name_from_topic(&event.topic)?;
        let payload: ValuePayload =
            serde_json::from_str(&event.payload).map_err(DecodeError::MalformedPayload)?;
        let value = self.codec.parse(&payload.kind, &payload.value)?;
        Ok((item_name, value))
    }

    fn parse_changed_payload(&self, payload: &str) -> Result<(Value, Value), HearthError> {
        let payload: ChangedPayload =
            serde_json::from_str(payload).map_err(DecodeError::MalformedPayload)?;
        let value = self.codec.parse(&payload.kind, &payload.value)?;
        let old_value = self.codec.parse(&payload.old_type, &payload.old_value)?;
        Ok((value, old_value))
    }
}

fn value_payload(value: &Value) -> String {
    serde_json::json!({
        "type": value.kind(),
        "value": value.to_string(),
    })
    .to_string()
}

fn changed_payload(value: &Value, old_value: &Value) -> String {
    serde_json::json!({
        "type": value.kind(),
        "value": value.to_string(),
        "oldType": old_value.kind(),
        "oldValue": old_value.to_string(),
    })
    .to_string()
}

fn parse_dto_payload(payload: &str) -> Result<ItemDto, DecodeError> {
    serde_json::from_str(payload).map_err(DecodeError::MalformedPayload)
}

fn item_name_from_topic(topic: &str) -> Result<ItemName, DecodeError> {
    let segments: Vec<&str> = topic.split('/').collect();
    match segments.as_slice() {
        ["hearth", "items", name, _] if !name.is_empty() => Ok(ItemName::from(*name)),
        _ => Err(DecodeError::MalformedTopic {
            topic: topic.to_string(),
        }),
    }
}

fn group_names_from_topic(topic: &str) -> Result<(ItemName, ItemName), DecodeError> {
    let segments: Vec<&str> = topic.split('/').collect();
    match segments.as_slice() {
        ["hearth", "items", name, member, "statechanged"]
            if !name.is_empty() && !member.is_empty() =>
        {
            Ok((ItemName::from(*name), ItemName::from(*member)))
        }
        _ => Err(DecodeError::MalformedTopic {
            topic: topic.to_string(),
        }),
    }
}

fn with_source(event: Event, source: Option<&str>) -> Event {
    match source {
        Some(source) => event.with_source(source),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::value::{OnOff, UnDefKind};

    fn factory() -> ItemEventFactory {
        ItemEventFactory::new()
    }

    #[test]
    fn should_build_state_event_envelope() {
        let event = factory().state_event(
            &ItemName::from("kitchen_lamp"),
            &Value::OnOff(OnOff::On),
            None,
        );
        assert_eq!(event.topic, "hearth/items/kitchen_lamp/state");
        assert_eq!(event.event_type, ITEM_STATE_EVENT);
        assert_eq!(event.source, None);
        let payload: serde_json::Value = serde_json::from_str(&event.payload).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"type": "OnOff", "value": "ON"})
        );
    }

    #[test]
    fn should_attach_source_to_command_events() {
        let event = factory().command_event(
            &ItemName::from("kitchen_lamp"),
            &Value::OnOff(OnOff::Off),
            Some("hearth.expire"),
        );
        assert_eq!(event.source.as_deref(), Some("hearth.expire"));
    }

    #[test]
    fn should_round_trip_state_changed_event() {
        let factory = factory();
        let event = factory.state_changed_event(
            &ItemName::from("hall"),
            &Value::Percent(30.0),
            &Value::Percent(70.0),
        );
        assert_eq!(event.topic, "hearth/items/hall/statechanged");
        let parsed = factory.parse(&event).unwrap();
        assert_eq!(
            parsed,
            ItemEvent::StateChanged {
                item_name: ItemName::from("hall"),
                value: Value::Percent(30.0),
                old_value: Value::Percent(70.0),
            }
        );
    }

    #[test]
    fn should_round_trip_group_state_changed_event() {
        let factory = factory();
        let event = factory.group_state_changed_event(
            &ItemName::from("downstairs"),
            &ItemName::from("kitchen_lamp"),
            &Value::OnOff(OnOff::On),
            &Value::UnDef(UnDefKind::Null),
        );
        assert_eq!(
            event.topic,
            "hearth/items/downstairs/kitchen_lamp/statechanged"
        );
        let parsed = factory.parse(&event).unwrap();
        let ItemEvent::GroupStateChanged {
            item_name,
            member_name,
            value,
            old_value,
        } = parsed
        else {
            panic!("expected a group state changed event");
        };
        assert_eq!(item_name, ItemName::from("downstairs"));
        assert_eq!(member_name, ItemName::from("kitchen_lamp"));
        assert_eq!(value, Value::OnOff(OnOff::On));
        assert_eq!(old_value, Value::UnDef(UnDefKind::Null));
    }

    #[test]
    fn should_round_trip_lifecycle_events() {
        let factory = factory();
        let old_item = Item::new("hall", ItemKind::Dimmer);
        let item = old_item.clone().with_label("Hallway");

        let added = factory.parse(&factory.added_event(&item)).unwrap();
        assert_eq!(
            added,
            ItemEvent::Added {
                item: ItemDto::from(&item)
            }
        );

        let updated = factory.parse(&factory.updated_event(&item, &old_item)).unwrap();
        assert_eq!(
            updated,
            ItemEvent::Updated {
                item: ItemDto::from(&item),
                old_item: ItemDto::from(&old_item),
            }
        );

        let removed = factory.parse(&factory.removed_event(&item)).unwrap();
        assert_eq!(removed.item_name(), &ItemName::from("hall"));
    }

    #[test]
    fn should_reject_unknown_event_type() {
        let event = Event::new("hearth/items/hall/state", "SomethingElseEvent", "{}");
        let err = factory().parse(&event).unwrap_err();
        assert!(matches!(
            err,
            HearthError::Decode(DecodeError::UnknownEventType { event_type })
                if event_type == "SomethingElseEvent"
        ));
    }

    #[test]
    fn should_reject_topics_missing_the_item_segment() {
        let event = Event::new(
            "hearth/items",
            ITEM_STATE_EVENT,
            r#"{"type":"OnOff","value":"ON"}"#,
        );
        let err = factory().parse(&event).unwrap_err();
        assert!(matches!(
            err,
            HearthError::Decode(DecodeError::MalformedTopic { .. })
        ));
    }

    #[test]
    fn should_reject_malformed_payloads() {
        let event = Event::new("hearth/items/hall/state", ITEM_STATE_EVENT, "not json");
        let err = factory().parse(&event).unwrap_err();
        assert!(matches!(
            err,
            HearthError::Decode(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn should_reject_values_that_do_not_parse_as_their_kind() {
        let event = Event::new(
            "hearth/items/hall/state",
            ITEM_STATE_EVENT,
            r#"{"type":"OnOff","value":"MAYBE"}"#,
        );
        let err = factory().parse(&event).unwrap_err();
        assert!(matches!(
            err,
            HearthError::Decode(DecodeError::MalformedValue { kind: "OnOff", .. })
        ));
    }
}
