//! Configuration change listeners.
//!
//! Listeners are notified synchronously on the writer's thread after the
//! configuration lock is released. The callback carries no payload; the
//! listener re-reads whatever it needs.
//!
//! A listener must not write to the store from inside `on_config_changed`.

use crate::config::LISTENER_CAPACITY;
use crate::error::{MonitorError, Result};
use std::sync::Arc;

/// Receiver of "configuration changed" notifications.
pub trait ConfigListener: Send + Sync {
    /// Called once after every successful configuration mutation.
    fn on_config_changed(&self);
}

impl<F> ConfigListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_config_changed(&self) {
        self()
    }
}

/// Bounded set of listeners, identified by allocation.
pub(crate) struct ListenerTable {
    entries: heapless::Vec<Arc<dyn ConfigListener>, LISTENER_CAPACITY>,
}

impl ListenerTable {
    pub(crate) const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    pub(crate) fn register(&mut self, listener: Arc<dyn ConfigListener>) -> Result<()> {
        if self.position(&listener).is_some() {
            return Ok(());
        }
        self.entries
            .push(listener)
            .map_err(|_| MonitorError::ResourceExhausted(LISTENER_CAPACITY))
    }

    pub(crate) fn unregister(&mut self, listener: &Arc<dyn ConfigListener>) -> Result<()> {
        let index = self.position(listener).ok_or(MonitorError::NotFound)?;
        self.entries.remove(index);
        Ok(())
    }

    /// Copy of the current listeners, so delivery can happen without the lock.
    pub(crate) fn snapshot(&self) -> heapless::Vec<Arc<dyn ConfigListener>, LISTENER_CAPACITY> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, listener: &Arc<dyn ConfigListener>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| same_listener(entry, listener))
    }
}

/// Compare by data address only; vtable pointers of the same type may differ
/// between codegen units.
fn same_listener(a: &Arc<dyn ConfigListener>, b: &Arc<dyn ConfigListener>) -> bool {
    core::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
