//! Observer fan-out for engine events
//!
//! Registrations are additive and dispatched in registration order. Each
//! callback runs isolated: one panicking subscriber is caught and logged,
//! the remaining subscribers and the engine itself keep going.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use tracing::error;

type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Ordered list of event subscribers
pub struct Observers<E> {
    callbacks: Mutex<Vec<Callback<E>>>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Add a subscriber; earlier registrations are invoked first
    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.callbacks.lock().unwrap().push(Box::new(callback));
    }

    /// Invoke every subscriber with the event
    pub fn emit(&self, event: &E) {
        let callbacks = self.callbacks.lock().unwrap();
        for callback in callbacks.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!("Event subscriber panicked, continuing with remaining subscribers");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
