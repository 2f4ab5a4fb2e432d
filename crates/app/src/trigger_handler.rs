//! Rule trigger handler reacting to thing status events.
//!
//! One handler instance serves one trigger module. It subscribes itself on
//! the bus, filtered down to the configured thing's status topics, and fires
//! its callback with the module outputs whenever the status constraints
//! match.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hearth_domain::error::{ConfigurationError, HearthError};
use hearth_domain::event::Event;
use hearth_domain::id::SubscriptionId;
use hearth_domain::rule::Module;
use hearth_domain::thing::ThingStatus;
use hearth_domain::thing::events::{
    THING_STATUS_INFO_CHANGED_EVENT, THING_STATUS_INFO_EVENT, parse_status_info_changed_event,
    parse_status_info_event,
};
use hearth_domain::topic::TopicFilter;

use crate::event_bus::EventBus;
use crate::ports::{EventSubscriber, SubscribedTypes, TriggerCallback, TriggerOutput};

/// Module type fired on every status report of the selected things.
pub const UPDATE_MODULE_TYPE_UID: &str = "hearth.ThingStatusUpdateTrigger";
/// Module type fired only when the status actually changes.
pub const CHANGE_MODULE_TYPE_UID: &str = "hearth.ThingStatusChangeTrigger";

pub const CFG_THING_UID: &str = "thingUID";
pub const CFG_STATUS: &str = "status";
pub const CFG_PREVIOUS_STATUS: &str = "previousStatus";

pub const OUT_STATUS: &str = "status";
pub const OUT_NEW_STATUS: &str = "newStatus";
pub const OUT_OLD_STATUS: &str = "oldStatus";
pub const OUT_EVENT: &str = "event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    Update,
    Change,
}

/// Bridges thing status events into rule trigger callbacks.
pub struct ThingStatusTriggerHandler {
    bus: Arc<EventBus>,
    module: Module,
    kind: TriggerKind,
    status: Option<String>,
    previous_status: Option<String>,
    callback: Mutex<Option<Arc<dyn TriggerCallback>>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl ThingStatusTriggerHandler {
    /// Build a handler for `module` and subscribe it on `bus`.
    ///
    /// The `thingUID` configuration value may carry `*` and `?` wildcards to
    /// select several things at once.
    ///
    /// # Errors
    ///
    /// A [`ConfigurationError`] when the module type is not one of the two
    /// trigger types, when `thingUID` is missing, or when the resulting topic
    /// pattern does not compile.
    pub fn from_module(bus: Arc<EventBus>, module: Module) -> Result<Arc<Self>, HearthError> {
        let kind = match module.type_uid.as_str() {
            UPDATE_MODULE_TYPE_UID => TriggerKind::Update,
            CHANGE_MODULE_TYPE_UID => TriggerKind::Change,
            _ => {
                return Err(ConfigurationError::UnknownModuleType {
                    type_uid: module.type_uid.clone(),
                }
                .into());
            }
        };
        let thing_uid = module.configuration.string(CFG_THING_UID).ok_or_else(|| {
            ConfigurationError::MissingModuleConfig {
                module: module.id.clone(),
                key: CFG_THING_UID.to_string(),
            }
        })?;
        let filter = TopicFilter::new(format!("hearth/things/{thing_uid}/*"))?;
        let types = SubscribedTypes::of([match kind {
            TriggerKind::Update => THING_STATUS_INFO_EVENT,
            TriggerKind::Change => THING_STATUS_INFO_CHANGED_EVENT,
        }]);

        let handler = Arc::new(Self {
            bus: bus.clone(),
            kind,
            status: module.configuration.string(CFG_STATUS),
            previous_status: module.configuration.string(CFG_PREVIOUS_STATUS),
            module,
            callback: Mutex::new(None),
            subscription: Mutex::new(None),
        });
        let id = bus.register(handler.clone(), types, Some(filter));
        *handler.subscription_lock() = Some(id);
        Ok(handler)
    }

    /// Attach the callback fired when the trigger matches.
    pub fn set_callback(&self, callback: Arc<dyn TriggerCallback>) {
        *self.callback_lock() = Some(callback);
    }

    /// Drop the bus subscription. Calling twice is harmless.
    pub fn dispose(&self) {
        if let Some(id) = self.subscription_lock().take() {
            self.bus.unregister(id);
        }
    }

    fn callback_lock(&self) -> MutexGuard<'_, Option<Arc<dyn TriggerCallback>>> {
        self.callback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscription_lock(&self) -> MutexGuard<'_, Option<SubscriptionId>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for ThingStatusTriggerHandler {
    fn receive(&self, event: &Event) -> Result<(), HearthError> {
        let Some(callback) = self.callback_lock().clone() else {
            return Ok(());
        };
        let mut outputs = HashMap::new();
        match self.kind {
            TriggerKind::Update if event.event_type == THING_STATUS_INFO_EVENT => {
                let parsed = parse_status_info_event(event)?;
                if status_matches(self.status.as_deref(), parsed.info.status) {
                    outputs.insert(
                        OUT_STATUS.to_string(),
                        TriggerOutput::Status(parsed.info.status),
                    );
                    outputs.insert(OUT_EVENT.to_string(), TriggerOutput::Event(event.clone()));
                }
            }
            TriggerKind::Change if event.event_type == THING_STATUS_INFO_CHANGED_EVENT => {
                let parsed = parse_status_info_changed_event(event)?;
                if status_matches(self.status.as_deref(), parsed.info.status)
                    && status_matches(self.previous_status.as_deref(), parsed.old_info.status)
                {
                    outputs.insert(
                        OUT_OLD_STATUS.to_string(),
                        TriggerOutput::Status(parsed.old_info.status),
                    );
                    outputs.insert(
                        OUT_NEW_STATUS.to_string(),
                        TriggerOutput::Status(parsed.info.status),
                    );
                    outputs.insert(OUT_EVENT.to_string(), TriggerOutput::Event(event.clone()));
                }
            }
            _ => {}
        }
        if !outputs.is_empty() {
            tracing::debug!(module = %self.module.id, topic = %event.topic, "trigger matched");
            callback.triggered(&self.module, outputs);
        }
        Ok(())
    }
}

/// An unset or blank constraint matches every status.
fn status_matches(expected: Option<&str>, actual: ThingStatus) -> bool {
    expected.is_none_or(|expected| {
        let expected = expected.trim();
        expected.is_empty() || expected == actual.as_str()
    })
}
