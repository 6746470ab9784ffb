//! Coalesced change notification
//!
//! Mutations report the identity of what they touched. While a batch scope
//! is open, those identities are collected; when the outermost scope closes
//! listeners receive one `ChangeEvent` with everything modified inside.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

/// Identities of the persisted objects modified together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub modified: Vec<String>,
}

pub trait ChangeListener {
    fn changed(&self, event: &ChangeEvent);
}

#[derive(Default)]
pub struct ChangeBroadcaster {
    depth: Cell<usize>,
    pending: RefCell<BTreeSet<String>>,
    listeners: RefCell<Vec<Box<dyn ChangeListener>>>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Box<dyn ChangeListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Suspend broadcasting until the returned scope (and any enclosing
    /// scope) is dropped
    pub fn batch(&self) -> BatchScope<'_> {
        self.depth.set(self.depth.get() + 1);
        BatchScope { broadcaster: self }
    }

    pub fn is_suspended(&self) -> bool {
        self.depth.get() > 0
    }

    /// Record a modification; broadcast right away unless suspended
    pub fn notify(&self, id: impl Into<String>) {
        self.pending.borrow_mut().insert(id.into());
        if !self.is_suspended() {
            self.flush();
        }
    }

    fn flush(&self) {
        let modified: Vec<String> = std::mem::take(&mut *self.pending.borrow_mut())
            .into_iter()
            .collect();
        if modified.is_empty() {
            return;
        }
        let event = ChangeEvent { modified };
        tracing::debug!(modified = event.modified.len(), "broadcasting change event");
        for listener in self.listeners.borrow().iter() {
            listener.changed(&event);
        }
    }
}

/// Open batch; dropping the outermost one broadcasts
pub struct BatchScope<'a> {
    broadcaster: &'a ChangeBroadcaster,
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        let depth = self.broadcaster.depth.get().saturating_sub(1);
        self.broadcaster.depth.set(depth);
        if depth == 0 {
            self.broadcaster.flush();
        }
    }
}

/// Listener that records every event, for tests and the CLI
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: std::rc::Rc<RefCell<Vec<ChangeEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.borrow().clone()
    }
}

impl ChangeListener for RecordingListener {
    fn changed(&self, event: &ChangeEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcaster_with_recorder() -> (ChangeBroadcaster, RecordingListener) {
        let broadcaster = ChangeBroadcaster::new();
        let recorder = RecordingListener::new();
        broadcaster.subscribe(Box::new(recorder.clone()));
        (broadcaster, recorder)
    }

    #[test]
    fn test_unsuspended_notify_broadcasts_immediately() {
        let (broadcaster, recorder) = broadcaster_with_recorder();
        broadcaster.notify("a");
        broadcaster.notify("b");
        assert_eq!(recorder.events().len(), 2);
    }

    #[test]
    fn test_nested_batches_coalesce() {
        let (broadcaster, recorder) = broadcaster_with_recorder();
        {
            let _outer = broadcaster.batch();
            broadcaster.notify("b");
            {
                let _inner = broadcaster.batch();
                broadcaster.notify("a");
                broadcaster.notify("b");
            }
            assert!(recorder.events().is_empty());
            assert!(broadcaster.is_suspended());
        }

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].modified, vec!["a".to_string(), "b".to_string()]);
        assert!(!broadcaster.is_suspended());
    }

    #[test]
    fn test_empty_batch_emits_nothing() {
        let (broadcaster, recorder) = broadcaster_with_recorder();
        drop(broadcaster.batch());
        assert!(recorder.events().is_empty());
    }
}
