//! Single-slot hand-off cell between a producer task and a consumer task
//!
//! Semantics:
//! - `put` overwrites whatever is in the slot; unread values are dropped (last write wins)
//! - `take_timeout` blocks until an unread value exists, then consumes it
//! - `peek` returns the latest value without consuming it (for status reporting)
//!
//! Every value carries the instant it was published so consumers can reject stale data.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShareError {
    /// Nothing was published within the allowed wait
    #[error("share '{name}': no value within {waited:?} (ever published: {ever_published})")]
    Timeout {
        name: &'static str,
        waited: Duration,
        ever_published: bool,
    },
}

/// A value together with its publication metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub published_at: Instant,
    /// 1 for the first publish, incremented on each one after
    pub sequence: u64,
}

impl<T> Stamped<T> {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.published_at)
    }
}

struct Slot<T> {
    latest: Option<Stamped<T>>,
    unread: bool,
    sequence: u64,
}

pub struct Share<T> {
    name: &'static str,
    slot: Mutex<Slot<T>>,
    published: Condvar,
}

impl<T: Clone> Share<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(Slot {
                latest: None,
                unread: false,
                sequence: 0,
            }),
            published: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // The slot is only ever replaced whole, so a panicking holder cannot leave it torn
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a value, overwriting any unread one
    pub fn put(&self, value: T) {
        self.put_at(value, Instant::now());
    }

    pub fn put_at(&self, value: T, published_at: Instant) {
        let mut slot = self.lock();
        slot.sequence += 1;
        let sequence = slot.sequence;
        if slot.unread {
            log::trace!("share '{}': overwriting unread value", self.name);
        }
        slot.latest = Some(Stamped {
            value,
            published_at,
            sequence,
        });
        slot.unread = true;
        drop(slot);
        self.published.notify_all();
    }

    /// Block until an unread value is available, then consume it
    pub fn take_timeout(&self, timeout: Duration) -> Result<Stamped<T>, ShareError> {
        let slot = self.lock();
        let (mut slot, wait) = self
            .published
            .wait_timeout_while(slot, timeout, |slot| !slot.unread)
            .unwrap_or_else(PoisonError::into_inner);

        if wait.timed_out() && !slot.unread {
            return Err(ShareError::Timeout {
                name: self.name,
                waited: timeout,
                ever_published: slot.sequence > 0,
            });
        }

        slot.unread = false;
        match slot.latest.clone() {
            Some(stamped) => Ok(stamped),
            None => Err(ShareError::Timeout {
                name: self.name,
                waited: timeout,
                ever_published: false,
            }),
        }
    }

    /// Consume an unread value if there is one, without blocking
    pub fn try_take(&self) -> Option<Stamped<T>> {
        let mut slot = self.lock();
        if !slot.unread {
            return None;
        }
        slot.unread = false;
        slot.latest.clone()
    }

    /// Latest published value, read or not
    pub fn peek(&self) -> Option<Stamped<T>> {
        self.lock().latest.clone()
    }

    pub fn has_published(&self) -> bool {
        self.lock().sequence > 0
    }
}
