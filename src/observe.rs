//! Observable state cells.
//!
//! A [`StateCell`] is the private, writable half kept by the component that
//! owns a piece of state. [`Watch`] is the read-only half handed to observers
//! (the UI, MPRIS): it can read the current value and subscribe to changes.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

struct Inner<T> {
    value: T,
    subscribers: Vec<Sender<T>>,
}

/// Writable state cell. Not `Clone`: there is exactly one writer.
pub struct StateCell<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

/// Read-only view of a [`StateCell`].
pub struct Watch<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Watch<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Store `value` and notify subscribers. Returns `false` (and notifies
    /// nobody) when the value did not change.
    pub fn set(&self, value: T) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.value == value {
            return false;
        }
        // Dropped receivers are pruned here.
        inner.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        inner.value = value;
        true
    }

    pub fn watch(&self) -> Watch<T> {
        Watch {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Watch<T> {
    /// Snapshot of the current value.
    pub fn get(&self) -> Option<T> {
        self.inner.lock().ok().map(|inner| inner.value.clone())
    }

    /// Receive every subsequent change. The current value is not replayed.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.push(tx);
        }
        rx
    }
}
