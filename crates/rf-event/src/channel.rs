//! Event Channel
//!
//! Single-threaded publish/subscribe channel. Handlers run synchronously on
//! the thread that raises the event, in subscription order.
//!
//! ## Dispatch rules
//!
//! - `raise` snapshots the subscriber list first, so handlers may subscribe
//!   or unsubscribe while an event is being dispatched. Changes take effect
//!   from the next `raise`.
//! - A handler that is already running (the event was raised again from
//!   inside it) is skipped for the nested dispatch instead of aliasing its
//!   own state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSCRIPTION ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle returned by [`EventChannel::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNEL
// ═══════════════════════════════════════════════════════════════════════════════

type Handler<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Subscriber<T> {
    id: SubscriptionId,
    handler: Handler<T>,
}

struct ChannelShared<T> {
    name: String,
    next_id: Cell<u64>,
    raised: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

/// Publish/subscribe channel for one event kind
///
/// Cloning yields another handle to the same channel.
pub struct EventChannel<T> {
    shared: Rc<ChannelShared<T>>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.shared.name)
            .field("subscribers", &self.shared.subscribers.borrow().len())
            .field("raised", &self.shared.raised.get())
            .finish()
    }
}

impl<T: 'static> EventChannel<T> {
    /// Create a channel; `name` only shows up in logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Rc::new(ChannelShared {
                name: name.into(),
                next_id: Cell::new(1),
                raised: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Register a handler, called for every subsequent [`raise`](Self::raise)
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);

        let handler: Handler<T> = Rc::new(RefCell::new(handler));
        self.shared
            .subscribers
            .borrow_mut()
            .push(Subscriber { id, handler });

        log::trace!("{}: subscribed #{}", self.shared.name, id.0);
        id
    }

    /// Remove a handler. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.shared.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }

    /// Number of times this channel has been raised
    pub fn raise_count(&self) -> u64 {
        self.shared.raised.get()
    }

    /// Dispatch `payload` to every handler; returns how many ran
    pub fn raise(&self, payload: &T) -> usize {
        self.shared.raised.set(self.shared.raised.get() + 1);

        let handlers: Vec<Handler<T>> = self
            .shared
            .subscribers
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.handler))
            .collect();

        let mut invoked = 0;
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut f) => {
                    (&mut *f)(payload);
                    invoked += 1;
                }
                Err(_) => {
                    log::warn!(
                        "{}: handler is still running, skipping nested dispatch",
                        self.shared.name
                    );
                }
            }
        }
        invoked
    }
}

impl EventChannel<()> {
    /// Raise a payload-less event
    pub fn fire(&self) -> usize {
        self.raise(&())
    }
}
