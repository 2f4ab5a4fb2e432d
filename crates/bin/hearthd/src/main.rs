//! # hearthd — hearth daemon
//!
//! Composition root that wires the event bus, registries, and services
//! together and runs the daemon.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Construct the event bus and in-memory registries
//! - Seed items and expire metadata from configuration
//! - Install the expire manager and thing status triggers
//! - Handle graceful shutdown (ctrl-c)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::collections::HashMap;
use std::sync::Arc;

use hearth_app::event_bus::EventBus;
use hearth_app::expire_manager::ExpireManager;
use hearth_app::ports::{
    EventPublisher, EventSubscriber, ItemRegistry, SubscribedTypes, TriggerCallback, TriggerOutput,
};
use hearth_app::registry::{InMemoryItemRegistry, InMemoryMetadataRegistry};
use hearth_app::trigger_handler::{self, ThingStatusTriggerHandler};
use hearth_domain::configuration::Configuration;
use hearth_domain::error::HearthError;
use hearth_domain::event::Event;
use hearth_domain::expire::METADATA_NAMESPACE;
use hearth_domain::id::ItemName;
use hearth_domain::item::events::ItemEventFactory;
use hearth_domain::item::{Item, ItemKind};
use hearth_domain::metadata::{Metadata, MetadataKey};
use hearth_domain::rule::Module;
use hearth_domain::value::{OnOff, Value};

use crate::config::Config;

const DEMO_ITEM: &str = "demo_switch";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    // Bus and registries
    let bus = Arc::new(EventBus::new());
    let publisher: Arc<dyn EventPublisher> = bus.clone();
    let factory = ItemEventFactory::new();
    let items = Arc::new(InMemoryItemRegistry::new(publisher.clone(), factory.clone()));
    let metadata = Arc::new(InMemoryMetadataRegistry::new());

    // Everything crossing the bus shows up in the logs.
    bus.register(Arc::new(EventLogger), SubscribedTypes::all(), None);

    // Expire manager
    let manager = ExpireManager::new(
        publisher.clone(),
        items.clone(),
        metadata.clone(),
        factory.clone(),
    );
    if config.expire.enabled {
        bus.register(manager.clone(), ExpireManager::subscribed_types(), None);
        items.add_listener(manager.clone());
        metadata.add_listener(manager.clone());
    }

    seed(&config, &items, &metadata)?;

    // Thing status triggers
    let mut handlers = Vec::new();
    for trigger in &config.triggers {
        let handler = ThingStatusTriggerHandler::from_module(bus.clone(), trigger_module(trigger))?;
        handler.set_callback(Arc::new(LoggingCallback));
        handlers.push(handler);
    }

    if config.expire.enabled {
        manager.activate();
    }
    if config.demo.enabled {
        run_demo(&publisher, &items, &metadata, &factory)?;
    }

    tracing::info!(
        items = items.len(),
        triggers = handlers.len(),
        "hearthd running, press ctrl-c to stop"
    );
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    manager.deactivate();
    for handler in &handlers {
        handler.dispose();
    }
    Ok(())
}

fn init_tracing(filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Register the configured items and their expire metadata.
fn seed(
    config: &Config,
    items: &InMemoryItemRegistry,
    metadata: &InMemoryMetadataRegistry,
) -> Result<(), HearthError> {
    for item_config in &config.items {
        let kind: ItemKind = item_config.kind.parse()?;
        let mut item = Item::new(item_config.name.as_str(), kind);
        if let Some(label) = &item_config.label {
            item = item.with_label(label);
        }
        items.add(item)?;
        if let Some(expire) = &item_config.expire {
            metadata.add(Metadata::new(
                MetadataKey::new(METADATA_NAMESPACE, item_config.name.as_str()),
                expire,
            ))?;
        }
    }
    Ok(())
}

fn trigger_module(trigger: &config::TriggerConfig) -> Module {
    let mut configuration =
        Configuration::new().with(trigger_handler::CFG_THING_UID, trigger.thing_uid.as_str());
    if let Some(status) = &trigger.status {
        configuration = configuration.with(trigger_handler::CFG_STATUS, status.as_str());
    }
    if let Some(previous) = &trigger.previous_status {
        configuration = configuration.with(trigger_handler::CFG_PREVIOUS_STATUS, previous.as_str());
    }
    let type_uid = match trigger.kind {
        config::TriggerKind::Update => trigger_handler::UPDATE_MODULE_TYPE_UID,
        config::TriggerKind::Change => trigger_handler::CHANGE_MODULE_TYPE_UID,
    };
    Module::new(trigger.id.as_str(), type_uid).with_configuration(configuration)
}

/// Seed a short-lived switch and turn it on, so a fresh install shows the
/// expiry cycle in its logs right away.
fn run_demo(
    publisher: &Arc<dyn EventPublisher>,
    items: &InMemoryItemRegistry,
    metadata: &InMemoryMetadataRegistry,
    factory: &ItemEventFactory,
) -> Result<(), HearthError> {
    let name = ItemName::from(DEMO_ITEM);
    if items.get(&name).is_err() {
        items.add(Item::new(DEMO_ITEM, ItemKind::Switch).with_label("Demo switch"))?;
        metadata.add(Metadata::new(
            MetadataKey::new(METADATA_NAMESPACE, DEMO_ITEM),
            "30s,command=OFF",
        ))?;
    }
    publisher.post(factory.command_event(&name, &Value::OnOff(OnOff::On), None));
    Ok(())
}

/// Logs every event crossing the bus.
struct EventLogger;

impl EventSubscriber for EventLogger {
    fn receive(&self, event: &Event) -> Result<(), HearthError> {
        tracing::info!(
            topic = %event.topic,
            kind = %event.event_type,
            source = event.source.as_deref().unwrap_or("-"),
            "event"
        );
        Ok(())
    }
}

/// Logs trigger firings; a rule engine would start rule runs here.
struct LoggingCallback;

impl TriggerCallback for LoggingCallback {
    fn triggered(&self, module: &Module, outputs: HashMap<String, TriggerOutput>) {
        let mut keys: Vec<&str> = outputs.keys().map(String::as_str).collect();
        keys.sort_unstable();
        tracing::info!(module = %module.id, outputs = ?keys, "trigger fired");
    }
}
