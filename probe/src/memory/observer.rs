//! Observer that records every notification

use crate::host::{MutationObserver, MutationTarget};
use crate::model::EntityId;

/// One received notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// See [`MutationObserver::notify_created`]
    Created(EntityId),
    /// See [`MutationObserver::notify_mutated`]
    Mutated(MutationTarget),
    /// See [`MutationObserver::notify_destroyed`]
    Destroyed(EntityId),
}

/// Keeps notifications in arrival order
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    notifications: Vec<Notification>,
}

impl RecordingObserver {
    /// Empty log
    pub fn new() -> Self { Self::default() }

    /// Everything received so far
    pub fn notifications(&self) -> &[Notification] { &self.notifications }

    /// Forget everything received so far
    pub fn clear(&mut self) { self.notifications.clear(); }
}

impl MutationObserver for RecordingObserver {
    fn notify_created(&mut self, entity: EntityId) {
        self.notifications.push(Notification::Created(entity));
    }

    fn notify_mutated(&mut self, target: MutationTarget) {
        self.notifications.push(Notification::Mutated(target));
    }

    fn notify_destroyed(&mut self, entity: EntityId) {
        self.notifications.push(Notification::Destroyed(entity));
    }
}
