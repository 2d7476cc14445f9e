//! Subscriber registry and fan-out
//!
//! Subscribers are append-only. Each flushed batch is wrapped in an `Arc`
//! once and handed to every subscriber in registration order. Delivery runs
//! on the worker thread, so a slow subscriber delays the next debounce
//! cycle; subscribers with real work to do should take the channel variant
//! and process batches on their own thread.

use crossbeam_channel::Sender;
use sitewatch_core::EventBatch;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace};

/// Something that wants to hear about flushed batches
///
/// Implementations must not block for long and cannot report errors back
/// to the watcher; failures are theirs to log.
pub trait Subscriber: Send + Sync {
    fn receive(&self, batch: Arc<EventBatch>);
}

/// Adapter turning a closure into a subscriber
pub struct FnSubscriber<F>(pub F);

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(Arc<EventBatch>) + Send + Sync,
{
    fn receive(&self, batch: Arc<EventBatch>) {
        (self.0)(batch)
    }
}

/// Forwards batches into a channel
///
/// A dropped receiver turns the subscriber into a no-op.
pub struct ChannelSubscriber {
    tx: Sender<Arc<EventBatch>>,
}

impl ChannelSubscriber {
    pub fn new(tx: Sender<Arc<EventBatch>>) -> Self {
        Self { tx }
    }
}

impl Subscriber for ChannelSubscriber {
    fn receive(&self, batch: Arc<EventBatch>) {
        if self.tx.send(batch).is_err() {
            trace!("Channel subscriber has no receiver, dropping batch");
        }
    }
}

/// Ordered list of subscribers
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber; the same one registered twice hears every batch twice
    pub fn register(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Hand `batch` to every subscriber in registration order
    ///
    /// A panicking subscriber is logged and skipped; the rest still receive
    /// the batch.
    pub fn deliver(&self, batch: EventBatch) {
        let batch = Arc::new(batch);

        for (index, subscriber) in self.subscribers.iter().enumerate() {
            let shared = Arc::clone(&batch);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.receive(shared)));
            if outcome.is_err() {
                error!(
                    "Subscriber #{} panicked while handling a batch of {} events",
                    index,
                    batch.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use sitewatch_core::{Op, RawEvent};

    fn batch_of(n: usize) -> EventBatch {
        (0..n)
            .map(|i| RawEvent::new(Op::Modify, format!("/tmp/site/{}.md", i)))
            .collect()
    }

    /// Records the size of every batch it sees, tagged with its own id
    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl Subscriber for Recorder {
        fn receive(&self, batch: Arc<EventBatch>) {
            self.log.lock().push((self.id, batch.len()));
        }
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SubscriberRegistry::new();
        for id in 0..3 {
            registry.register(Arc::new(Recorder { id, log: Arc::clone(&log) }));
        }

        registry.deliver(batch_of(2));

        assert_eq!(*log.lock(), vec![(0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_same_subscriber_twice_receives_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder: Arc<dyn Subscriber> = Arc::new(Recorder { id: 7, log: Arc::clone(&log) });

        let mut registry = SubscriberRegistry::new();
        registry.register(Arc::clone(&recorder));
        registry.register(recorder);
        assert_eq!(registry.len(), 2);

        registry.deliver(batch_of(1));
        assert_eq!(*log.lock(), vec![(7, 1), (7, 1)]);
    }

    #[test]
    fn test_subscribers_share_one_batch() {
        let seen: Arc<Mutex<Vec<Arc<EventBatch>>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SubscriberRegistry::new();
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            registry.register(Arc::new(FnSubscriber(move |batch: Arc<EventBatch>| {
                seen.lock().push(batch)
            })));
        }

        registry.deliver(batch_of(3));

        let seen = seen.lock();
        assert!(Arc::ptr_eq(&seen[0], &seen[1]));
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = SubscriberRegistry::new();
        registry.register(Arc::new(FnSubscriber(|_batch: Arc<EventBatch>| {
            panic!("subscriber bug");
        })));
        registry.register(Arc::new(Recorder { id: 1, log: Arc::clone(&log) }));

        registry.deliver(batch_of(1));
        registry.deliver(batch_of(2));

        assert_eq!(*log.lock(), vec![(1, 1), (1, 2)]);
    }

    #[test]
    fn test_channel_subscriber_without_receiver_is_noop() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);

        let mut registry = SubscriberRegistry::new();
        registry.register(Arc::new(ChannelSubscriber::new(tx)));
        registry.deliver(batch_of(1));
    }

    #[test]
    fn test_empty_registry_delivery() {
        let registry = SubscriberRegistry::new();
        assert!(registry.is_empty());
        registry.deliver(batch_of(1));
    }
}
