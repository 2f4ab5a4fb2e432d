//! # hearth-domain
//!
//! Pure domain model for the hearth home automation event subsystem.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, configuration maps
//! - Define **Events** (immutable fact records: topic, type discriminator, payload)
//! - Define **Values** (the typed state/command vocabulary) and their codec
//! - Define **Items** (named state holders: switches, sensors, groups, …)
//! - Define **Things** (device-level entities with an online/offline lifecycle)
//! - Define **Metadata** (namespaced per-item configuration records)
//! - Define **Rules** (trigger → condition → action modules) and their status machines
//! - Define the **expire** metadata grammar (auto-reset of stale item state)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app` or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod configuration;
pub mod error;
pub mod id;

pub mod event;
pub mod expire;
pub mod item;
pub mod metadata;
pub mod rule;
pub mod thing;
pub mod topic;
pub mod value;
