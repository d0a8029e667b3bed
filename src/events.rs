//! Typed event bus.
//!
//! Containers and the limits object expose named events; subscribers
//! register closures and hold on to a `Subscription` handle. Dropping the
//! handle unsubscribes. Removal is deferred while an event is firing, so a
//! handler may drop its own (or another) subscription mid-fire.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

type Handler<T> = Rc<dyn Fn(&T)>;

struct EventCore<T> {
    handlers: RefCell<Vec<(u64, Handler<T>)>>,
    /// Ids unsubscribed while a fire was in progress.
    pending_removal: RefCell<HashSet<u64>>,
    firing: std::cell::Cell<bool>,
    next_id: std::cell::Cell<u64>,
}

impl<T> EventCore<T> {
    fn remove(&self, id: u64) {
        if self.firing.get() {
            self.pending_removal.borrow_mut().insert(id);
        } else {
            self.handlers.borrow_mut().retain(|(h, _)| *h != id);
        }
    }
}

/// A single-threaded event with any number of closure subscribers.
pub struct Event<T> {
    core: Rc<EventCore<T>>,
}

impl<T: 'static> Default for Event<T> {
    fn default() -> Self {
        Event::new()
    }
}

impl<T: 'static> Event<T> {
    pub fn new() -> Self {
        Event {
            core: Rc::new(EventCore {
                handlers: RefCell::new(Vec::new()),
                pending_removal: RefCell::new(HashSet::new()),
                firing: std::cell::Cell::new(false),
                next_id: std::cell::Cell::new(0),
            }),
        }
    }

    /// Register a handler. The handler stays registered until the returned
    /// `Subscription` is dropped.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let id = self.core.next_id.get();
        self.core.next_id.set(id + 1);
        self.core
            .handlers
            .borrow_mut()
            .push((id, Rc::new(handler)));

        let core = Rc::clone(&self.core);
        Subscription {
            cancel: Box::new(move || core.remove(id)),
        }
    }

    /// Deliver `payload` to every current subscriber.
    ///
    /// Handlers unsubscribed during delivery are skipped if they have not
    /// run yet and removed afterwards. Re-entrant firing of the same event
    /// is a bug in the subscription DAG and panics in debug builds.
    pub fn fire(&self, payload: &T) {
        debug_assert!(!self.core.firing.get(), "re-entrant event delivery");
        self.core.firing.set(true);

        // Snapshot so handlers may subscribe/unsubscribe freely.
        let snapshot: Vec<(u64, Handler<T>)> = self.core.handlers.borrow().clone();
        for (id, handler) in snapshot {
            if self.core.pending_removal.borrow().contains(&id) {
                continue;
            }
            handler(payload);
        }

        self.core.firing.set(false);
        let removed: HashSet<u64> = self.core.pending_removal.borrow_mut().drain().collect();
        if !removed.is_empty() {
            self.core
                .handlers
                .borrow_mut()
                .retain(|(id, _)| !removed.contains(id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.core.handlers.borrow().len()
    }
}

/// Handle to an event subscription; unsubscribes on drop.
pub struct Subscription {
    cancel: Box<dyn Fn()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        (self.cancel)();
    }
}
