//! Synchronous, single-threaded event emitters.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

/// Boxed event listener.
pub type Listener<T> = Box<dyn FnMut(&T)>;

/// Handle returned by [`Emitter::subscribe`], used to unsubscribe.
///
/// Handles are unique across emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Delivers events to listeners in subscription order.
pub struct Emitter<T> {
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Emitter<T> {
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener<T>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
        self.listeners.push((id, listener));
        id
    }

    /// Returns `true` if the listener was subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn fire(&mut self, event: &T) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
