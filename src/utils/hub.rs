//! Listener registry for state change notifications
//!
//! A [`SubscriptionHub`] holds the listeners of one cache. `subscribe` hands
//! the new listener the current snapshot before returning, so nobody misses
//! the initial state. `notify` copies the listener list out of the lock before
//! calling anyone: listeners run with no lock held.
//!
//! Listeners must not call back into a mutating cache operation from inside
//! `on_change`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Receives every snapshot published after a state change
pub trait Listener<S>: Send + Sync {
    fn on_change(&self, snapshot: &S);
}

impl<S, F> Listener<S> for F
where
    F: Fn(&S) + Send + Sync,
{
    fn on_change(&self, snapshot: &S) {
        self(snapshot)
    }
}

type ListenerId = u64;

struct HubInner<S> {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn Listener<S>>)>>,
    next_id: AtomicU64,
    notifications: AtomicU64,
}

pub struct SubscriptionHub<S> {
    inner: Arc<HubInner<S>>,
}

impl<S: 'static> SubscriptionHub<S> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                notifications: AtomicU64::new(0),
            }),
        }
    }

    /// Register `listener`, calling it once with `current` first
    pub fn subscribe(&self, listener: impl Listener<S> + 'static, current: &S) -> Subscription {
        listener.on_change(current);

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Arc<dyn Listener<S>> = Arc::new(listener);
        self.inner.listeners.lock().push((id, listener));

        let weak: Weak<HubInner<S>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.lock().retain(|(existing, _)| *existing != id);
                }
            })),
        }
    }

    /// Call every currently registered listener exactly once
    pub fn notify(&self, snapshot: &S) {
        let listeners: Vec<Arc<dyn Listener<S>>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        self.inner.notifications.fetch_add(1, Ordering::Relaxed);
        for listener in listeners {
            listener.on_change(snapshot);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Notifications published since creation
    pub fn notification_count(&self) -> u64 {
        self.inner.notifications.load(Ordering::Relaxed)
    }
}

impl<S: 'static> Default for SubscriptionHub<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`SubscriptionHub::subscribe`]
///
/// Dropping the handle unsubscribes, so a UI component can tie it to its own
/// lifetime.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> impl Fn(&u32) + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_subscribe_delivers_current_snapshot() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _sub = hub.subscribe(move |s: &u32| sink.lock().push(*s), &5);
        assert_eq!(*seen.lock(), vec![5]);

        hub.notify(&6);
        assert_eq!(*seen.lock(), vec![5, 6]);
    }

    #[test]
    fn test_every_listener_called_once_per_notify() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let _sa = hub.subscribe(counting_listener(&a), &0);
        let _sb = hub.subscribe(counting_listener(&b), &0);

        hub.notify(&1);
        hub.notify(&2);

        assert_eq!(a.load(Ordering::SeqCst), 3);
        assert_eq!(b.load(Ordering::SeqCst), 3);
        assert_eq!(hub.notification_count(), 2);
    }

    #[test]
    fn test_unsubscribe_and_drop() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let sa = hub.subscribe(counting_listener(&a), &0);
        {
            let _sb = hub.subscribe(counting_listener(&b), &0);
            assert_eq!(hub.listener_count(), 2);
        }
        assert_eq!(hub.listener_count(), 1);

        sa.unsubscribe();
        assert_eq!(hub.listener_count(), 0);

        hub.notify(&9);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_hub_is_harmless() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let sub = hub.subscribe(|_: &u32| {}, &0);
        drop(hub);
        sub.unsubscribe();
    }
}
