//! Subscriber registry
//!
//! Ordered list of handlers. Delivery iterates over a snapshot of the list,
//! so subscribing or unsubscribing from inside a handler never disturbs the
//! pass in progress. Each entry carries an `active` flag that is checked
//! right before its handler runs: once `unsubscribe` returns, the handler is
//! not called again, even for a message whose delivery already started.

use crate::traits::MessageHandler;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Identifier of a registered subscriber, unique per manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Entry<M> {
    id: SubscriberId,
    active: AtomicBool,
    handler: Box<dyn MessageHandler<M>>,
}

impl<M> Entry<M> {
    #[inline]
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

pub(crate) struct SubscriberRegistry<M> {
    next_id: AtomicU64,
    entries: RwLock<Vec<Arc<Entry<M>>>>,
}

impl<M: 'static> SubscriberRegistry<M> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        handler: Box<dyn MessageHandler<M>>,
    ) -> Subscription<M> {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            handler,
        });

        self.entries.write().push(Arc::clone(&entry));
        debug!(subscriber = %id, "Subscriber registered");

        Subscription {
            entry,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: SubscriberId) {
        self.entries.write().retain(|entry| entry.id != id);
    }

    /// Drop every subscriber
    pub(crate) fn clear(&self) -> usize {
        let drained: Vec<_> = self.entries.write().drain(..).collect();
        for entry in &drained {
            entry.deactivate();
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Deliver `message` to every active subscriber in registration order
    ///
    /// Failures (errors and panics) are handed to `on_failure` and do not
    /// stop the pass. Returns how many handlers completed successfully.
    pub(crate) fn dispatch(
        &self,
        message: &M,
        mut on_failure: impl FnMut(SubscriberId, String),
    ) -> usize {
        let snapshot: Vec<Arc<Entry<M>>> = self.entries.read().clone();
        let mut delivered = 0;

        for entry in snapshot {
            if !entry.is_active() {
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| entry.handler.handle(message))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => on_failure(entry.id, e.to_string()),
                Err(payload) => on_failure(entry.id, panic_reason(payload.as_ref())),
            }
        }

        delivered
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle keeps the subscriber registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription keeps the handler registered; keep it to unsubscribe later"]
pub struct Subscription<M> {
    entry: Arc<Entry<M>>,
    registry: Weak<SubscriberRegistry<M>>,
}

impl<M: 'static> Subscription<M> {
    pub fn id(&self) -> SubscriberId {
        self.entry.id
    }

    /// False once unsubscribed, or once the manager cleared its subscribers
    pub fn is_active(&self) -> bool {
        self.entry.is_active()
    }

    /// Stop deliveries to this handler
    ///
    /// Returns false if the subscriber was already gone.
    pub fn unsubscribe(self) -> bool {
        let was_active = self.entry.deactivate();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.entry.id);
        }
        if was_active {
            debug!(subscriber = %self.entry.id, "Subscriber removed");
        }
        was_active
    }
}

impl<M> fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.entry.id)
            .field("active", &self.entry.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NotifySocketError;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Box<dyn MessageHandler<u32>> {
        let log = Arc::clone(log);
        Box::new(move |m: &u32| -> crate::Result<()> {
            log.lock().push(format!("{}:{}", name, m));
            Ok(())
        })
    }

    #[test]
    fn delivers_in_registration_order() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let _a = registry.subscribe(recorder(&log, "a"));
        let _b = registry.subscribe(recorder(&log, "b"));

        assert_eq!(registry.dispatch(&1, |_, _| panic!("no failures expected")), 2);
        assert_eq!(registry.dispatch(&2, |_, _| panic!("no failures expected")), 2);
        assert_eq!(*log.lock(), vec!["a:1", "b:1", "a:2", "b:2"]);
    }

    #[test]
    fn failing_handler_does_not_block_others() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let failing = registry.subscribe(Box::new(|_: &u32| -> crate::Result<()> {
            Err(NotifySocketError::Handler("boom".into()))
        }));
        let _panicking = registry.subscribe(Box::new(|_: &u32| -> crate::Result<()> {
            panic!("kaboom")
        }));
        let _ok = registry.subscribe(recorder(&log, "ok"));

        let mut failures = Vec::new();
        let delivered = registry.dispatch(&7, |id, reason| failures.push((id, reason)));

        assert_eq!(delivered, 1);
        assert_eq!(*log.lock(), vec!["ok:7"]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, failing.id());
        assert!(failures[1].1.contains("kaboom"));
    }

    #[test]
    fn unsubscribe_during_dispatch_skips_later_handler() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<Mutex<Option<Subscription<u32>>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim);
        let _killer = registry.subscribe(Box::new(move |_: &u32| -> crate::Result<()> {
            if let Some(sub) = slot.lock().take() {
                sub.unsubscribe();
            }
            Ok(())
        }));
        *victim.lock() = Some(registry.subscribe(recorder(&log, "victim")));

        registry.dispatch(&1, |_, _| {});
        registry.dispatch(&2, |_, _| {});

        assert!(log.lock().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn subscribe_during_dispatch_waits_for_next_message() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let added = Arc::new(Mutex::new(Vec::new()));

        let reg = Arc::clone(&registry);
        let inner_log = Arc::clone(&log);
        let keep = Arc::clone(&added);
        let _adder = registry.subscribe(Box::new(move |_: &u32| -> crate::Result<()> {
            let mut keep = keep.lock();
            if keep.is_empty() {
                keep.push(reg.subscribe(recorder(&inner_log, "late")));
            }
            Ok(())
        }));

        registry.dispatch(&1, |_, _| {});
        assert!(log.lock().is_empty());

        registry.dispatch(&2, |_, _| {});
        assert_eq!(*log.lock(), vec!["late:2"]);
    }

    #[test]
    fn clear_deactivates_handles() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let sub = registry.subscribe(Box::new(|_: &u32| -> crate::Result<()> { Ok(()) }));

        assert_eq!(registry.clear(), 1);
        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
        assert_eq!(registry.len(), 0);
    }
}
