//! Weakly held listener registry.
//!
//! A registry never keeps a listener alive: it stores a [`Weak`] handle and
//! checks liveness on every dispatch. Listeners whose owner has been dropped
//! are pruned lazily by the next [`ObserverRegistry::notify_all`].
//!
//! Dispatch is re-entrant. Each `notify_all` walks a snapshot of the
//! registrations taken when it starts, so a listener may subscribe or
//! unsubscribe others (or itself) while being notified:
//! - every listener registered at the start is invoked at most once;
//! - listeners added during dispatch first hear about the next event;
//! - listeners removed during dispatch are not invoked if their turn has not come yet.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Receiver of events of type `E`.
///
/// Takes `&self`: listeners that record state use interior mutability.
pub trait Listener<E> {
    fn notify(&self, event: &E);
}

/// Adapter that turns a closure into a [`Listener`].
pub struct FnListener<F>(F);

impl<F> FnListener<F> {
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<E, F> Listener<E> for FnListener<F>
where
    F: Fn(&E),
{
    fn notify(&self, event: &E) {
        (self.0)(event)
    }
}

struct Registration<E> {
    listener: Weak<dyn Listener<E>>,
    /// Data address of the listener, used for identity comparisons.
    addr: usize,
    active: Cell<bool>,
}

impl<E> Registration<E> {
    fn is_live(&self) -> bool {
        self.active.get() && self.listener.strong_count() > 0
    }
}

/// Ordered set of weakly held listeners.
pub struct ObserverRegistry<E> {
    entries: RefCell<Vec<Rc<Registration<E>>>>,
}

impl<E: 'static> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register `listener`. Registering a listener that is already present
    /// is a no-op.
    pub fn subscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<E> + 'static,
    {
        let listener: Rc<dyn Listener<E>> = listener.clone();
        self.subscribe_dyn(&listener);
    }

    /// Register an already type-erased listener.
    pub fn subscribe_dyn(&self, listener: &Rc<dyn Listener<E>>) {
        let addr = listener_addr(listener);
        let mut entries = self.entries.borrow_mut();
        if entries
            .iter()
            .any(|entry| entry.addr == addr && entry.is_live())
        {
            return;
        }
        entries.push(Rc::new(Registration {
            listener: Rc::downgrade(listener),
            addr,
            active: Cell::new(true),
        }));
    }

    /// Remove `listener` if present. Absent listeners are ignored.
    pub fn unsubscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<E> + 'static,
    {
        self.remove_addr(Rc::as_ptr(listener) as *const () as usize);
    }

    /// Remove an already type-erased listener.
    pub fn unsubscribe_dyn(&self, listener: &Rc<dyn Listener<E>>) {
        self.remove_addr(listener_addr(listener));
    }

    /// Dispatch `event` to every live listener in subscription order.
    pub fn notify_all(&self, event: &E) {
        let snapshot: Vec<Rc<Registration<E>>> = self.entries.borrow().clone();

        let mut expired = false;
        for entry in &snapshot {
            if !entry.active.get() {
                continue;
            }
            match entry.listener.upgrade() {
                Some(listener) => listener.notify(event),
                None => {
                    entry.active.set(false);
                    expired = true;
                }
            }
        }

        if expired {
            self.entries.borrow_mut().retain(|entry| entry.active.get());
        }
    }

    /// Number of registrations whose listener is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.is_live())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored registrations, including expired ones not yet pruned.
    pub fn registered(&self) -> usize {
        self.entries.borrow().len()
    }

    fn remove_addr(&self, addr: usize) {
        self.entries.borrow_mut().retain(|entry| {
            if entry.addr == addr {
                entry.active.set(false);
                false
            } else {
                true
            }
        });
    }
}

impl<E: 'static> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for ObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("live", &self.len())
            .field("registered", &self.registered())
            .finish()
    }
}

fn listener_addr<E>(listener: &Rc<dyn Listener<E>>) -> usize {
    Rc::as_ptr(listener) as *const () as usize
}
