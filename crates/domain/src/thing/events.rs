//! Typed thing status events and their envelope codec.

use crate::error::{DecodeError, HearthError};
use crate::event::Event;
use crate::id::ThingUid;
use crate::thing::ThingStatusInfo;
use crate::topic;

pub const THING_STATUS_INFO_EVENT: &str = "ThingStatusInfoEvent";
pub const THING_STATUS_INFO_CHANGED_EVENT: &str = "ThingStatusInfoChangedEvent";

/// A thing reported its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingStatusInfoEvent {
    pub thing_uid: ThingUid,
    pub info: ThingStatusInfo,
}

/// A thing's status moved from `old_info` to `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingStatusInfoChangedEvent {
    pub thing_uid: ThingUid,
    pub info: ThingStatusInfo,
    pub old_info: ThingStatusInfo,
}

#[must_use]
pub fn status_info_event(thing_uid: &ThingUid, info: &ThingStatusInfo) -> Event {
    let topic = topic::THING_STATUS_TOPIC.replace("{thingUID}", thing_uid.as_str());
    Event::new(
        topic,
        THING_STATUS_INFO_EVENT,
        serde_json::json!(info).to_string(),
    )
}

#[must_use]
pub fn status_info_changed_event(
    thing_uid: &ThingUid,
    info: &ThingStatusInfo,
    old_info: &ThingStatusInfo,
) -> Event {
    let topic = topic::THING_STATUS_CHANGED_TOPIC.replace("{thingUID}", thing_uid.as_str());
    Event::new(
        topic,
        THING_STATUS_INFO_CHANGED_EVENT,
        serde_json::json!([info, old_info]).to_string(),
    )
}

/// Decode a [`THING_STATUS_INFO_EVENT`] envelope.
///
/// # Errors
///
/// A [`DecodeError`] variant when the envelope carries another event type,
/// the topic is missing its thing segment, or the payload is malformed.
pub fn parse_status_info_event(event: &Event) -> Result<ThingStatusInfoEvent, HearthError> {
    expect_type(event, THING_STATUS_INFO_EVENT)?;
    let thing_uid = thing_uid_from_topic(&event.topic)?;
    let info = serde_json::from_str(&event.payload).map_err(DecodeError::MalformedPayload)?;
    Ok(ThingStatusInfoEvent { thing_uid, info })
}

/// Decode a [`THING_STATUS_INFO_CHANGED_EVENT`] envelope.
///
/// # Errors
///
/// Same conditions as [`parse_status_info_event`].
pub fn parse_status_info_changed_event(
    event: &Event,
) -> Result<ThingStatusInfoChangedEvent, HearthError> {
    expect_type(event, THING_STATUS_INFO_CHANGED_EVENT)?;
    let thing_uid = thing_uid_from_topic(&event.topic)?;
    let (info, old_info) =
        serde_json::from_str(&event.payload).map_err(DecodeError::MalformedPayload)?;
    Ok(ThingStatusInfoChangedEvent {
        thing_uid,
        info,
        old_info,
    })
}

fn expect_type(event: &Event, event_type: &str) -> Result<(), DecodeError> {
    if event.event_type == event_type {
        Ok(())
    } else {
        Err(DecodeError::UnknownEventType {
            event_type: event.event_type.clone(),
        })
    }
}

fn thing_uid_from_topic(topic: &str) -> Result<ThingUid, DecodeError> {
    let segments: Vec<&str> = topic.split('/').collect();
    match segments.as_slice() {
        ["hearth", "things", uid, _] if !uid.is_empty() => Ok(ThingUid::from(*uid)),
        _ => Err(DecodeError::MalformedTopic {
            topic: topic.to_string(),
        }),
    }
}
