//! # Publish/Subscribe Broker
//!
//! A coordinator thread owns the subscriber set and handles one request at
//! a time from its inbox. Nobody else ever touches the set.
//!
//! ```text
//!   publish ──┐                         ┌──► queue A (bounded)
//!   subscribe ┼──► inbox ──► coordinator ┼──► queue B (bounded)
//!   unsubscribe                          └──► queue C (full: message dropped)
//!   stop ─────┘
//! ```
//!
//! Delivery is at-most-once. A full subscriber queue loses that one
//! message; the publisher and every other subscriber carry on.
//!
//! ## Lifecycle
//!
//! `Running` ──stop()──► `Stopping` ──last unsubscribe──► `Terminated`
//!
//! Stopping closes every subscriber queue at once. Consumers then observe
//! end-of-stream. The coordinator exits when the set is empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{BrokerError, BrokerResult};

/// Broker lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BrokerState {
    /// Accepting subscribers and delivering publishes.
    Running = 0,
    /// Stop requested. Queues are closed; waiting for unsubscribes.
    Stopping = 1,
    /// Coordinator has exited.
    Terminated = 2,
}

impl BrokerState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Stopping,
            _ => Self::Terminated,
        }
    }
}

enum Request<T> {
    Publish(T),
    Subscribe { id: u64, queue: Sender<T> },
    Unsubscribe(u64),
    Stop,
}

/// State visible to every handle.
struct Shared {
    state: AtomicU8,
    stop_requested: AtomicBool,
    next_subscriber: AtomicU64,
    dropped: AtomicU64,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn set_state(&self, state: BrokerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Handle to a running broker. Cheap to clone.
pub struct Broker<T> {
    inbox: Sender<Request<T>>,
    shared: Arc<Shared>,
    buffer_size: usize,
}

impl<T> Clone for Broker<T> {
    fn clone(&self) -> Self {
        Self {
            inbox: self.inbox.clone(),
            shared: Arc::clone(&self.shared),
            buffer_size: self.buffer_size,
        }
    }
}

impl<T: Clone + Send + 'static> Broker<T> {
    /// Starts a broker whose inbox and subscriber queues each hold
    /// `buffer_size` messages.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the coordinator thread.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        let (inbox, requests) = bounded(buffer_size);
        let shared = Arc::new(Shared {
            state: AtomicU8::new(BrokerState::Running as u8),
            stop_requested: AtomicBool::new(false),
            next_subscriber: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            coordinator: Mutex::new(None),
        });

        let coordinator = Coordinator {
            subscribers: HashMap::new(),
            running: true,
            shared: Arc::clone(&shared),
        };
        let handle = thread::Builder::new()
            .name("swarm-broker".to_string())
            .spawn(move || coordinator.run(&requests))
            .expect("Failed to spawn broker thread");
        *shared.coordinator.lock() = Some(handle);

        Self {
            inbox,
            shared,
            buffer_size,
        }
    }

    /// Sends a message to every current subscriber.
    ///
    /// Blocks only while the broker's own inbox is full. Ignored once the
    /// broker is stopping.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Terminated`] if the coordinator has exited.
    pub fn publish(&self, msg: T) -> BrokerResult<()> {
        self.inbox
            .send(Request::Publish(msg))
            .map_err(|_| BrokerError::Terminated)
    }

    /// Registers a new subscriber.
    ///
    /// If the broker is already stopping or gone, the returned
    /// subscription is closed from the start.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let (queue, receiver) = bounded(self.buffer_size);
        if self.inbox.send(Request::Subscribe { id, queue }).is_err() {
            debug!(id, "subscribe after broker terminated");
        }
        Subscription {
            id,
            queue: receiver,
            inbox: self.inbox.clone(),
        }
    }

    /// Removes a subscriber and closes its queue.
    ///
    /// Dropping the subscription does the same thing.
    pub fn unsubscribe(&self, subscription: Subscription<T>) {
        drop(subscription);
    }

    /// Stops the broker: nothing more is delivered and every subscriber
    /// queue is closed.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::AlreadyStopped`] on a second call and
    /// [`BrokerError::Terminated`] if the coordinator already exited.
    pub fn stop(&self) -> BrokerResult<()> {
        if self.shared.stop_requested.swap(true, Ordering::AcqRel) {
            return Err(BrokerError::AlreadyStopped);
        }
        self.inbox
            .send(Request::Stop)
            .map_err(|_| BrokerError::Terminated)
    }
}

impl<T> Broker<T> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BrokerState {
        BrokerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Messages dropped because a subscriber queue was full.
    #[must_use]
    pub fn dropped_messages(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Waits for the coordinator thread to exit.
    ///
    /// Only returns once the broker is stopped and every subscriber has
    /// unsubscribed (or every handle has been dropped).
    pub fn join(&self) {
        let handle = self.shared.coordinator.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

/// One subscriber's queue.
///
/// Dropping it unsubscribes.
pub struct Subscription<T> {
    id: u64,
    queue: Receiver<T>,
    inbox: Sender<Request<T>>,
}

impl<T> Subscription<T> {
    /// Subscriber ID, unique per broker.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next message. `None` means end-of-stream.
    #[must_use]
    pub fn recv(&self) -> Option<T> {
        self.queue.recv().ok()
    }

    /// Waits up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// `Timeout` if nothing arrived, `Disconnected` at end-of-stream.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.queue.recv_timeout(timeout)
    }

    /// Next message if one is buffered.
    #[must_use]
    pub fn try_recv(&self) -> Option<T> {
        self.queue.try_recv().ok()
    }

    /// Drains the queue and returns only the most recent message.
    ///
    /// For pollers slower than the publish rate. `None` means nothing new.
    #[must_use]
    pub fn newest(&self) -> Option<T> {
        self.queue.try_iter().last()
    }

    /// Messages currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The underlying receiver, for use with `select!`.
    #[must_use]
    pub const fn receiver(&self) -> &Receiver<T> {
        &self.queue
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        // Fails only when the coordinator is gone, which is fine.
        let _ = self.inbox.send(Request::Unsubscribe(self.id));
    }
}

struct Coordinator<T> {
    /// `None` marks a queue already closed by `stop`.
    subscribers: HashMap<u64, Option<Sender<T>>>,
    running: bool,
    shared: Arc<Shared>,
}

impl<T: Clone> Coordinator<T> {
    fn run(mut self, requests: &Receiver<Request<T>>) {
        while let Ok(request) = requests.recv() {
            match request {
                Request::Publish(msg) => self.fan_out(&msg),
                Request::Subscribe { id, queue } => {
                    if self.running {
                        self.subscribers.insert(id, Some(queue));
                    }
                    // Otherwise `queue` drops here and the subscriber sees
                    // end-of-stream straight away.
                }
                Request::Unsubscribe(id) => {
                    if self.subscribers.remove(&id).is_none() {
                        continue;
                    }
                    if !self.running && self.subscribers.is_empty() {
                        break;
                    }
                }
                Request::Stop => {
                    self.running = false;
                    self.shared.set_state(BrokerState::Stopping);
                    debug!(subscribers = self.subscribers.len(), "broker stopping");
                    for queue in self.subscribers.values_mut() {
                        queue.take();
                    }
                    if self.subscribers.is_empty() {
                        break;
                    }
                }
            }
        }

        self.subscribers.clear();
        self.shared.set_state(BrokerState::Terminated);
        debug!("broker terminated");
    }

    fn fan_out(&self, msg: &T) {
        if !self.running {
            return;
        }
        for queue in self.subscribers.values().flatten() {
            match queue.try_send(msg.clone()) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let broker = Broker::new(10);
        let a = broker.subscribe();
        let b = broker.subscribe();

        broker.publish(7u32).unwrap();

        assert_eq!(a.recv_timeout(WAIT), Ok(7));
        assert_eq!(b.recv_timeout(WAIT), Ok(7));
    }

    #[test]
    fn test_full_queue_drops_only_for_that_subscriber() {
        let broker = Broker::new(2);
        let slow = broker.subscribe();
        let fast = broker.subscribe();

        for i in 0..5u32 {
            broker.publish(i).unwrap();
            assert_eq!(fast.recv_timeout(WAIT), Ok(i));
        }

        assert_eq!(slow.recv_timeout(WAIT), Ok(0));
        assert_eq!(slow.recv_timeout(WAIT), Ok(1));
        assert!(slow.try_recv().is_none());
        assert_eq!(broker.dropped_messages(), 3);
    }

    #[test]
    fn test_unsubscribe_closes_queue() {
        let broker = Broker::<u32>::new(4);
        let sub = broker.subscribe();
        let receiver = sub.receiver().clone();

        broker.unsubscribe(sub);

        assert!(receiver.recv_timeout(WAIT).is_err());
    }

    #[test]
    fn test_stop_closes_all_and_terminates_after_unsubscribe() {
        let broker = Broker::new(4);
        let a = broker.subscribe();
        let b = broker.subscribe();
        broker.publish(1u8).unwrap();
        assert_eq!(a.recv_timeout(WAIT), Ok(1));
        assert_eq!(b.recv_timeout(WAIT), Ok(1));

        broker.stop().unwrap();
        assert_eq!(a.recv_timeout(WAIT), Err(RecvTimeoutError::Disconnected));
        assert_eq!(b.recv_timeout(WAIT), Err(RecvTimeoutError::Disconnected));
        assert_eq!(broker.state(), BrokerState::Stopping);

        // Nothing is delivered after stop.
        let _ = broker.publish(2);

        drop(a);
        drop(b);
        broker.join();
        assert_eq!(broker.state(), BrokerState::Terminated);
    }

    #[test]
    fn test_stop_with_no_subscribers_terminates() {
        let broker = Broker::<u8>::new(4);
        broker.stop().unwrap();
        broker.join();
        assert_eq!(broker.state(), BrokerState::Terminated);
        assert_eq!(broker.publish(1), Err(BrokerError::Terminated));
    }

    #[test]
    fn test_second_stop_rejected() {
        let broker = Broker::<u8>::new(4);
        let sub = broker.subscribe();
        broker.stop().unwrap();
        assert_eq!(broker.stop(), Err(BrokerError::AlreadyStopped));
        drop(sub);
        broker.join();
    }

    #[test]
    fn test_subscribe_after_stop_is_closed() {
        let broker = Broker::<u8>::new(4);
        let keep_alive = broker.subscribe();
        broker.stop().unwrap();

        let late = broker.subscribe();
        assert!(late.recv().is_none());
        drop(keep_alive);
    }

    #[test]
    fn test_newest_discards_stale() {
        let broker = Broker::new(10);
        let sub = broker.subscribe();
        assert!(sub.newest().is_none());

        for i in 0..4u32 {
            broker.publish(i).unwrap();
        }
        // Wait until the coordinator has delivered all four.
        let deadline = std::time::Instant::now() + WAIT;
        while sub.pending() < 4 && std::time::Instant::now() < deadline {
            thread::yield_now();
        }

        assert_eq!(sub.newest(), Some(3));
        assert!(sub.newest().is_none());
    }

    #[test]
    fn test_concurrent_unsubscribe_during_stop() {
        let broker = Broker::<u64>::new(8);
        let subs: Vec<_> = (0..32).map(|_| broker.subscribe()).collect();

        let workers: Vec<_> = subs
            .into_iter()
            .map(|sub| {
                thread::spawn(move || {
                    while sub.recv().is_some() {}
                })
            })
            .collect();

        broker.publish(1).unwrap();
        broker.stop().unwrap();
        for worker in workers {
            worker.join().unwrap();
        }
        broker.join();
        assert_eq!(broker.state(), BrokerState::Terminated);
    }
}
