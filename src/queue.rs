// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A fixed-capacity, blocking FIFO shared by many producers and one
//! consumer.
//!
//! `put` waits while the queue is full and `get` waits while it is
//! empty.  The items live behind one mutex; producers and consumers
//! sleep on separate condition variables so that each operation wakes
//! exactly one party on the other side.  Nothing is held locked while
//! callers compute or plot.
//!
//! The queue can also be cancelled, which wakes everybody and makes
//! every further operation fail with [`Cancelled`].  The cancel flag is
//! an atomic that is only written with the lock held, so waiters cannot
//! miss it and pollers never take the lock.

use crate::error::{BuddhaError, Cancelled};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

/// The two capabilities of a channel between threads, independent of
/// what travels through it.
pub trait Channel<T> {
    /// Hand `item` to the channel, waiting for room if necessary.
    fn put(&self, item: T) -> Result<(), Cancelled>;

    /// Take the oldest item from the channel, waiting for one if
    /// necessary.
    fn get(&self) -> Result<T, Cancelled>;

    /// Whether the channel has been cancelled.  Producers poll this
    /// between units of work.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A bounded multi-producer, single-consumer queue.  Deliberately not
/// `Clone`: share one instance by reference or `Arc`.
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    cancelled: AtomicBool,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// A queue holding at most `capacity` items.  A capacity of zero is a
    /// configuration error.
    pub fn new(capacity: usize) -> Result<Self, BuddhaError> {
        if capacity == 0 {
            return Err(BuddhaError::InvalidCapacity(capacity));
        }
        Ok(BoundedQueue {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            cancelled: AtomicBool::new(false),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<VecDeque<T>> {
        self.items.lock().expect("bounded queue lock poisoned")
    }

    /// The fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the head without waiting, if there is one.
    pub fn try_get(&self) -> Option<T> {
        let mut items = self.lock();
        let item = items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Cancel the queue: every blocked `put` and `get` returns
    /// `Err(Cancelled)`, and so does every later call.  Idempotent.
    pub fn cancel(&self) {
        let items = self.lock();
        self.cancelled.store(true, Ordering::SeqCst);
        drop(items);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T> Channel<T> for BoundedQueue<T> {
    fn put(&self, item: T) -> Result<(), Cancelled> {
        let mut items = self.lock();
        while items.len() >= self.capacity && !self.is_cancelled() {
            items = self
                .not_full
                .wait(items)
                .expect("bounded queue lock poisoned");
        }
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        items.push_back(item);
        assert!(
            items.len() <= self.capacity,
            "bounded queue overflowed its capacity of {}",
            self.capacity
        );
        self.not_empty.notify_one();
        Ok(())
    }

    fn get(&self) -> Result<T, Cancelled> {
        let mut items = self.lock();
        while items.is_empty() && !self.is_cancelled() {
            items = self
                .not_empty
                .wait(items)
                .expect("bounded queue lock poisoned");
        }
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        let item = items
            .pop_front()
            .expect("bounded queue woke a consumer with nothing queued");
        self.not_full.notify_one();
        Ok(item)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
