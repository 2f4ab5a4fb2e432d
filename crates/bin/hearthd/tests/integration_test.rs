//! End-to-end smoke tests for the fully wired daemon components.
//!
//! Each test wires the real event bus, registries, and services the way
//! `main` does, drives traffic through the bus, and watches what comes out
//! the other side. The expire tests run against the real timer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hearth_app::event_bus::EventBus;
use hearth_app::expire_manager::{self, ExpireManager};
use hearth_app::ports::{
    EventPublisher, EventSubscriber, SubscribedTypes, TriggerCallback, TriggerOutput,
};
use hearth_app::registry::{InMemoryItemRegistry, InMemoryMetadataRegistry};
use hearth_app::trigger_handler::{self, ThingStatusTriggerHandler};
use hearth_domain::configuration::Configuration;
use hearth_domain::error::HearthError;
use hearth_domain::event::Event;
use hearth_domain::expire::METADATA_NAMESPACE;
use hearth_domain::id::{ItemName, ThingUid};
use hearth_domain::item::events::{self as item_events, ItemEventFactory};
use hearth_domain::item::{Item, ItemKind};
use hearth_domain::metadata::{Metadata, MetadataKey};
use hearth_domain::rule::Module;
use hearth_domain::thing::events::status_info_changed_event;
use hearth_domain::thing::{ThingStatus, ThingStatusInfo};
use hearth_domain::value::{OnOff, Value};

/// Collects every event it receives.
#[derive(Default)]
struct CollectingSubscriber {
    events: Mutex<Vec<Event>>,
}

impl CollectingSubscriber {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn receive(&self, event: &Event) -> Result<(), HearthError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
struct CountingCallback {
    count: AtomicUsize,
}

impl TriggerCallback for CountingCallback {
    fn triggered(&self, _module: &Module, _outputs: std::collections::HashMap<String, TriggerOutput>) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// The fully wired stack minus the config file and signal handling.
struct Stack {
    bus: Arc<EventBus>,
    publisher: Arc<dyn EventPublisher>,
    items: Arc<InMemoryItemRegistry>,
    metadata: Arc<InMemoryMetadataRegistry>,
    manager: Arc<ExpireManager>,
    factory: ItemEventFactory,
    collector: Arc<CollectingSubscriber>,
}

fn stack() -> Stack {
    let bus = Arc::new(EventBus::new());
    let publisher: Arc<dyn EventPublisher> = bus.clone();
    let factory = ItemEventFactory::new();
    let items = Arc::new(InMemoryItemRegistry::new(publisher.clone(), factory.clone()));
    let metadata = Arc::new(InMemoryMetadataRegistry::new());

    let manager = ExpireManager::new(
        publisher.clone(),
        items.clone(),
        metadata.clone(),
        factory.clone(),
    );
    bus.register(manager.clone(), ExpireManager::subscribed_types(), None);
    items.add_listener(manager.clone());
    metadata.add_listener(manager.clone());

    let collector = Arc::new(CollectingSubscriber::default());
    bus.register(collector.clone(), SubscribedTypes::all(), None);

    Stack {
        bus,
        publisher,
        items,
        metadata,
        manager,
        factory,
        collector,
    }
}

async fn wait_for(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

fn expire_commands(collector: &CollectingSubscriber) -> Vec<Event> {
    collector
        .events()
        .into_iter()
        .filter(|event| {
            event.event_type == item_events::ITEM_COMMAND_EVENT
                && event.source.as_deref() == Some(expire_manager::EVENT_SOURCE)
        })
        .collect()
}

#[tokio::test]
async fn should_expire_a_switch_end_to_end() {
    let stack = stack();
    stack
        .items
        .add(Item::new("hall_light", ItemKind::Switch))
        .unwrap();
    stack
        .metadata
        .add(Metadata::new(
            MetadataKey::new(METADATA_NAMESPACE, "hall_light"),
            "1s,command=OFF",
        ))
        .unwrap();

    stack.manager.activate();
    stack.publisher.post(stack.factory.state_event(
        &ItemName::from("hall_light"),
        &Value::OnOff(OnOff::On),
        None,
    ));

    let fired = wait_for(Duration::from_secs(5), || {
        !expire_commands(&stack.collector).is_empty()
    })
    .await;
    stack.manager.deactivate();

    assert!(fired, "the expire command should be posted within the timeout");
    let commands = expire_commands(&stack.collector);
    assert_eq!(commands[0].topic, "hearth/items/hall_light/command");
}

#[tokio::test]
async fn should_not_expire_once_the_item_settles() {
    let stack = stack();
    stack
        .items
        .add(Item::new("hall_light", ItemKind::Switch))
        .unwrap();
    stack
        .metadata
        .add(Metadata::new(
            MetadataKey::new(METADATA_NAMESPACE, "hall_light"),
            "1s,command=OFF",
        ))
        .unwrap();

    stack.manager.activate();
    let name = ItemName::from("hall_light");
    stack
        .publisher
        .post(stack.factory.state_event(&name, &Value::OnOff(OnOff::On), None));
    // the expired value arrives before the deadline, disarming the timer
    stack
        .publisher
        .post(stack.factory.state_event(&name, &Value::OnOff(OnOff::Off), None));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    stack.manager.deactivate();

    assert!(expire_commands(&stack.collector).is_empty());
}

#[tokio::test]
async fn should_fire_status_triggers_through_the_bus() {
    let stack = stack();
    let module = Module::new("bridge-online", trigger_handler::CHANGE_MODULE_TYPE_UID)
        .with_configuration(
            Configuration::new()
                .with(trigger_handler::CFG_THING_UID, "hue:*")
                .with(trigger_handler::CFG_STATUS, "ONLINE"),
        );
    let handler = ThingStatusTriggerHandler::from_module(stack.bus.clone(), module).unwrap();
    let callback = Arc::new(CountingCallback::default());
    handler.set_callback(callback.clone());

    stack.bus.publish(&status_info_changed_event(
        &ThingUid::from("hue:bridge:1"),
        &ThingStatusInfo::new(ThingStatus::Online),
        &ThingStatusInfo::new(ThingStatus::Initializing),
    ));
    stack.bus.publish(&status_info_changed_event(
        &ThingUid::from("zwave:device:7"),
        &ThingStatusInfo::new(ThingStatus::Online),
        &ThingStatusInfo::new(ThingStatus::Offline),
    ));

    assert_eq!(callback.count.load(Ordering::SeqCst), 1);
    handler.dispose();
    assert_eq!(stack.bus.subscription_count(), 2);
}

#[tokio::test]
async fn should_keep_registry_traffic_visible_on_the_bus() {
    let stack = stack();
    stack
        .items
        .add(Item::new("hall_light", ItemKind::Switch).with_label("Hall light"))
        .unwrap();
    stack.items.remove(&ItemName::from("hall_light")).unwrap();

    let types: Vec<String> = stack
        .collector
        .events()
        .iter()
        .map(|event| event.event_type.clone())
        .collect();
    assert_eq!(
        types,
        vec![
            item_events::ITEM_ADDED_EVENT.to_string(),
            item_events::ITEM_REMOVED_EVENT.to_string(),
        ]
    );
}
