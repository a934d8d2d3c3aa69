//! Latest-value cell shared between a trigger and the cycles it starts.
//!
//! Every trigger reserves a sequence number with [`Published::begin`]. A value
//! produced under sequence `n` is only published while `n` is still the most
//! recently reserved number, so a slow cycle can never overwrite the output
//! of a newer one. The check and the swap happen under the channel's write
//! lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Published<T> {
    sequence: AtomicU64,
    value: watch::Sender<Arc<T>>,
    loading: watch::Sender<bool>,
}

impl<T> Published<T> {
    pub fn new(initial: T) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            value: watch::Sender::new(Arc::new(initial)),
            loading: watch::Sender::new(false),
        }
    }

    /// Reserve the next sequence number, invalidating every earlier one.
    pub fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest_sequence() == sequence
    }

    /// Swap in `value` if `sequence` is still current. Returns whether it was
    /// applied.
    pub fn publish(&self, sequence: u64, value: T) -> bool {
        self.value.send_if_modified(|current| {
            if !self.is_current(sequence) {
                return false;
            }
            *current = Arc::new(value);
            true
        })
    }

    /// Set the loading flag on behalf of `sequence`; ignored once stale.
    pub fn set_loading(&self, sequence: u64, loading: bool) {
        self.loading.send_if_modified(|current| {
            if !self.is_current(sequence) || *current == loading {
                return false;
            }
            *current = loading;
            true
        });
    }

    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.value.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.value.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}
