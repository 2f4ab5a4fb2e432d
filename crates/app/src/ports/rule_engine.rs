//! Rule engine ports — trigger firings from handlers into the engine.

use std::collections::HashMap;

use hearth_domain::event::Event;
use hearth_domain::rule::Module;
use hearth_domain::thing::ThingStatus;

/// One named output of a fired trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutput {
    Status(ThingStatus),
    Event(Event),
}

/// Receives trigger firings, usually to start a rule run.
pub trait TriggerCallback: Send + Sync {
    fn triggered(&self, module: &Module, outputs: HashMap<String, TriggerOutput>);
}
