//! Cross-thread marshaling onto the owning (UI) thread.
//!
//! Work that touches a document must run on the thread that owns the view.
//! A `MarshalQueue` is created on that thread. Other threads get a cloneable
//! `MarshalSender` and push work into a FIFO; the owner drains it from its
//! event loop. Work routed from the owner thread while nothing is pending is
//! handed straight back for immediate execution, so ordering is preserved in
//! both cases.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Outcome of routing one item.
#[derive(Debug, PartialEq, Eq)]
pub enum Routed<T> {
    /// Caller is on the owner thread with nothing queued; run it now.
    Deliver(T),
    /// The item was appended to the queue.
    Queued,
}

/// Owner-side handle of the marshal FIFO.
#[derive(Debug)]
pub struct MarshalQueue<T> {
    owner: ThreadId,
    pending: Arc<Mutex<VecDeque<T>>>,
}

/// Thread-safe producer handle.
#[derive(Debug)]
pub struct MarshalSender<T> {
    owner: ThreadId,
    pending: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for MarshalSender<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> MarshalQueue<T> {
    /// Create a queue owned by the calling thread.
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            pending: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// A producer handle for other threads.
    pub fn sender(&self) -> MarshalSender<T> {
        MarshalSender {
            owner: self.owner,
            pending: Arc::clone(&self.pending),
        }
    }

    /// True when called from the owning thread.
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Route an item from the owner side.
    pub fn route(&self, item: T) -> Routed<T> {
        route(self.owner, &self.pending, item)
    }

    /// Remove every queued item in arrival order.
    pub fn drain(&self) -> Vec<T> {
        let mut pending = self.pending.lock();
        pending.drain(..).collect()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl<T> Default for MarshalQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MarshalSender<T> {
    /// Route an item; from a foreign thread this always queues.
    pub fn route(&self, item: T) -> Routed<T> {
        route(self.owner, &self.pending, item)
    }

    /// Queue unconditionally.
    pub fn send(&self, item: T) {
        self.pending.lock().push_back(item);
    }
}

fn route<T>(owner: ThreadId, pending: &Mutex<VecDeque<T>>, item: T) -> Routed<T> {
    let mut queue = pending.lock();
    if thread::current().id() == owner && queue.is_empty() {
        Routed::Deliver(item)
    } else {
        queue.push_back(item);
        Routed::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_thread_delivers_directly() {
        let queue: MarshalQueue<u32> = MarshalQueue::new();
        assert!(queue.is_owner_thread());
        assert_eq!(queue.route(1), Routed::Deliver(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_foreign_thread_queues_in_order() {
        let queue: MarshalQueue<u32> = MarshalQueue::new();
        let sender = queue.sender();

        let handle = thread::spawn(move || {
            for i in 0..5 {
                assert_eq!(sender.route(i), Routed::Queued);
            }
        });
        handle.join().expect("worker thread panicked");

        assert_eq!(queue.len(), 5);
        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_owner_waits_behind_pending_items() {
        let queue: MarshalQueue<&'static str> = MarshalQueue::new();
        queue.sender().send("first");

        assert_eq!(queue.route("second"), Routed::Queued);
        assert_eq!(queue.drain(), vec!["first", "second"]);
    }
}
