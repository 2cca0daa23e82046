//! FILENAME: app/src/events.rs
//! Session events and user-facing notifications.
//!
//! Observers register with `EventBus::subscribe` and are removed with
//! `unsubscribe`. Handlers run synchronously, in subscription order, on
//! the thread that drives the session.

use pivot_engine::{ChangeOrigin, ViewId};
use serde::{Deserialize, Serialize};

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl Default for NotificationLevel {
    fn default() -> Self {
        NotificationLevel::Info
    }
}

/// A transient message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Notification {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notification::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::new(NotificationLevel::Error, message)
    }
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A fact load finished and its table is now current.
    FactsLoaded { rows: usize },
    /// A fact load failed; the previous table is still current.
    LoadFailed { message: String },
    /// A load finished after a newer one had started and was discarded.
    LoadSuperseded { ticket: u64 },
    PivotChanged { origin: ChangeOrigin },
    FieldFilterChanged { field: String },
    DirtyChanged { dirty: bool },
    ViewSelected { id: ViewId },
    ViewsChanged,
    /// A view switch is waiting for Save / Discard / Cancel.
    SwitchDecisionRequired { target: ViewId },
    Notification(Notification),
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&SessionEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn emit(&mut self, event: &SessionEvent) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }
}
