//! Structured events emitted by mutating registry operations.
//!
//! The registry only needs an "emit" capability; where events go is up to
//! the host. Two sinks ship with the crate:
//!
//! - [`EventLog`]: keeps events in memory until drained.
//! - [`LogSink`]: forwards each event to the `log` facade as JSON.

use serde::{Deserialize, Serialize};

use crate::principal::Principal;

/// Log target used by [`LogSink`].
pub const EVENT_LOG_TARGET: &str = "agent_registry::event";

/// A state change, tagged by `type` when serialized.
///
/// ```json
/// { "type": "account-registered", "owner": "...", "agent": "...", "attestation_level": 1 }
/// { "type": "account-attested", "owner": "...", "attestor": "...", "new_attestation_level": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegistryEvent {
    /// A new owner/agent binding was created.
    AccountRegistered {
        owner: Principal,
        agent: Principal,
        attestation_level: u32,
    },
    /// An attestor signed an existing binding.
    AccountAttested {
        owner: Principal,
        attestor: Principal,
        new_attestation_level: u32,
    },
}

impl RegistryEvent {
    /// Return the stable `type` tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::AccountRegistered { .. } => "account-registered",
            Self::AccountAttested { .. } => "account-attested",
        }
    }

    /// The owner whose binding changed.
    pub fn owner(&self) -> &Principal {
        match self {
            Self::AccountRegistered { owner, .. } | Self::AccountAttested { owner, .. } => owner,
        }
    }
}

/// Destination for registry events.
pub trait EventSink {
    /// Deliver one event. Called exactly once per successful mutation.
    fn emit(&mut self, event: RegistryEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: RegistryEvent) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: RegistryEvent) {
        (**self).emit(event);
    }
}

// ── EventLog ──────────────────────────────────────────────────────────────────

/// In-memory event buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<RegistryEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// The most recent event.
    pub fn last(&self) -> Option<&RegistryEvent> {
        self.events.last()
    }

    /// Remove and return every buffered event.
    pub fn drain(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Return the number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` when no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }
}

// ── LogSink ───────────────────────────────────────────────────────────────────

/// Sink that writes each event to the `log` facade at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: RegistryEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!(target: EVENT_LOG_TARGET, "{json}"),
            Err(e) => log::warn!(
                target: EVENT_LOG_TARGET,
                "failed to encode {} event: {e}",
                event.as_tag()
            ),
        }
    }
}
