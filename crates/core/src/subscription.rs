//! Broadcast of updates to independently-cancellable listeners
//!
//! An [`UpdatePublisher`] fans every published value out to all registered
//! listeners. Each registration returns a [`Subscription`]; cancelling or
//! dropping it removes the listener. Listeners can also be consumed as a
//! blocking channel ([`SnapshotReceiver`]) or an async stream
//! ([`UpdateStream`]).

use crate::sync::lock;
use arc_swap::ArcSwap;
use crossbeam::channel;
use log::{debug, trace};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

type Callback<T> = dyn Fn(&T) + Send + Sync;

struct Listener<T> {
    id: u64,
    active: AtomicBool,
    callback: Box<Callback<T>>,
}

struct PublisherInner<T> {
    /// Copy-on-write list; publishing iterates a snapshot without locking
    listeners: ArcSwap<Vec<Arc<Listener<T>>>>,
    next_id: AtomicU64,
}

impl<T> PublisherInner<T> {
    fn remove(&self, id: u64) {
        self.listeners.rcu(|current| {
            current
                .iter()
                .filter(|listener| listener.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        debug!("Removed listener {} ({} remaining)", id, self.listeners.load().len());
    }
}

/// Fans values out to every registered listener
pub struct UpdatePublisher<T> {
    inner: Arc<PublisherInner<T>>,
}

impl<T: 'static> UpdatePublisher<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                listeners: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a listener, called synchronously on the publishing thread
    /// for every value published until the returned subscription is
    /// cancelled or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        let weak_listener = Arc::downgrade(&listener);

        self.inner.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&listener));
            next
        });
        debug!("Added listener {}", id);

        let weak_inner: Weak<PublisherInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            // Deactivate first so an in-flight publish skips this listener
            if let Some(listener) = weak_listener.upgrade() {
                listener.active.store(false, Ordering::Release);
            }
            if let Some(inner) = weak_inner.upgrade() {
                inner.remove(id);
            }
        })
    }

    /// Deliver a value to every active listener
    pub fn publish(&self, value: &T) {
        let listeners = self.inner.listeners.load_full();
        trace!("Publishing to {} listeners", listeners.len());
        for listener in listeners.iter() {
            if listener.active.load(Ordering::Acquire) {
                (listener.callback)(value);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.load().len()
    }
}

impl<T: Clone + Send + 'static> UpdatePublisher<T> {
    /// Receive published values through a blocking channel
    pub fn channel(&self) -> SnapshotReceiver<T> {
        let (sender, receiver) = channel::unbounded();
        let subscription = self.subscribe(move |value: &T| {
            let _ = sender.send(value.clone());
        });
        SnapshotReceiver {
            receiver,
            _subscription: subscription,
        }
    }

    /// Receive published values as an async stream
    pub fn stream(&self) -> UpdateStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value: &T| {
            let _ = sender.send(value.clone());
        });
        UpdateStream {
            receiver,
            _subscription: subscription,
        }
    }
}

impl<T: 'static> Default for UpdatePublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for UpdatePublisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePublisher")
            .field("listeners", &self.inner.listeners.load().len())
            .finish()
    }
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Handle to one listener registration.
///
/// Cancelling is idempotent and may happen from any thread. Dropping the
/// handle cancels it, so a listener never outlives its subscription unless
/// [`detach`](Subscription::detach) is called.
pub struct Subscription {
    cancel: Mutex<Option<CancelFn>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription that is already cancelled
    pub fn empty() -> Self {
        Self {
            cancel: Mutex::new(None),
        }
    }

    /// Remove the listener.
    ///
    /// No publish that starts after this returns reaches the listener. A
    /// publish already running on another thread may still be inside the
    /// callback, or about to enter it, when this returns. A listener may
    /// cancel its own subscription from inside its callback.
    pub fn cancel(&self) {
        let cancel = lock(&self.cancel).take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.cancel).is_none()
    }

    /// Keep the listener registered for as long as the publisher lives
    pub fn detach(self) {
        lock(&self.cancel).take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Blocking receiver of published values; unsubscribes when dropped
pub struct SnapshotReceiver<T> {
    receiver: channel::Receiver<T>,
    _subscription: Subscription,
}

impl<T> SnapshotReceiver<T> {
    /// Block until the next value. `None` once the publisher is gone.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Values already delivered and not yet received
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

/// Async receiver of published values; unsubscribes when dropped
pub struct UpdateStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> UpdateStream<T> {
    /// Wait for the next value. `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let captured = Arc::clone(&count);
        (count, move |_: &u32| {
            captured.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_every_subscriber_receives_every_value() {
        let publisher = UpdatePublisher::new();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();
        let _a = publisher.subscribe(first_cb);
        let _b = publisher.subscribe(second_cb);

        publisher.publish(&1);
        publisher.publish(&2);

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.subscriber_count(), 2);
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let publisher = UpdatePublisher::new();
        let (count, cb) = counter();
        let subscription = publisher.subscribe(cb);

        subscription.cancel();
        subscription.cancel();
        publisher.publish(&1);

        assert!(subscription.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_stops_delivery() {
        let publisher = UpdatePublisher::new();
        let (count, cb) = counter();
        let subscription = publisher.subscribe(cb);

        publisher.publish(&1);
        drop(subscription);
        publisher.publish(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let publisher = UpdatePublisher::new();
        let (count, cb) = counter();
        publisher.subscribe(cb).detach();

        publisher.publish(&1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_after_publisher_dropped() {
        let publisher = UpdatePublisher::<u32>::new();
        let subscription = publisher.subscribe(|_| {});
        drop(publisher);
        subscription.cancel();
        assert!(subscription.is_cancelled());
    }

    #[test]
    fn test_concurrent_cancel() {
        let publisher = UpdatePublisher::new();
        let (count, cb) = counter();
        let subscription = Arc::new(publisher.subscribe(cb));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let subscription = Arc::clone(&subscription);
                thread::spawn(move || subscription.cancel())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        publisher.publish(&1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_listener_may_cancel_itself() {
        let publisher = UpdatePublisher::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (count, _) = counter();

        let captured_slot = Arc::clone(&slot);
        let captured_count = Arc::clone(&count);
        let subscription = publisher.subscribe(move |_: &u32| {
            captured_count.fetch_add(1, Ordering::SeqCst);
            if let Some(subscription) = lock(&captured_slot).take() {
                subscription.cancel();
            }
        });
        *lock(&slot) = Some(subscription);

        publisher.publish(&1);
        publisher.publish(&2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_during_delivery_stops_later_publishes() {
        let publisher = Arc::new(UpdatePublisher::new());
        let (entered_tx, entered_rx) = channel::bounded::<()>(1);
        let (release_tx, release_rx) = channel::bounded::<()>(1);
        let (count, _) = counter();
        let captured = Arc::clone(&count);
        let subscription = publisher.subscribe(move |_: &u32| {
            captured.fetch_add(1, Ordering::SeqCst);
            let _ = entered_tx.send(());
            let _ = release_rx.recv();
        });

        let in_flight = {
            let publisher = Arc::clone(&publisher);
            thread::spawn(move || publisher.publish(&1))
        };
        entered_rx.recv().unwrap();
        subscription.cancel();
        release_tx.send(()).unwrap();
        in_flight.join().unwrap();

        publisher.publish(&2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_channel_receives_in_order() {
        let publisher = UpdatePublisher::new();
        let receiver = publisher.channel();

        publisher.publish(&1u32);
        publisher.publish(&2u32);

        assert_eq!(receiver.drain(), vec![1, 2]);
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_channel_closes_with_publisher() {
        let publisher = UpdatePublisher::<u32>::new();
        let receiver = publisher.channel();
        drop(publisher);
        assert_eq!(receiver.recv(), None);
    }

    #[test]
    fn test_dropping_channel_unsubscribes() {
        let publisher = UpdatePublisher::<u32>::new();
        let receiver = publisher.channel();
        assert_eq!(publisher.subscriber_count(), 1);
        drop(receiver);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_receives_from_other_thread() {
        let publisher = Arc::new(UpdatePublisher::new());
        let mut stream = publisher.stream();

        let producer = Arc::clone(&publisher);
        thread::spawn(move || {
            producer.publish(&7u32);
            producer.publish(&8u32);
        })
        .join()
        .unwrap();

        assert_eq!(stream.recv().await, Some(7));
        assert_eq!(stream.recv().await, Some(8));
        assert_eq!(stream.try_recv(), None);
    }
}
