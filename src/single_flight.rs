//! Per-key coalescing of concurrent read-through misses
//!
//! The first caller to miss on a key becomes the leader and invokes the
//! operation. Callers arriving while it runs wait on a watch channel for the
//! leader's serialized result instead of invoking the operation again.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::watch;

/// Outcome published by a leader to its followers
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Landed {
    /// Serialized non-empty result
    Value(String),
    /// The operation returned no result
    Empty,
    /// The operation failed, or the leader was dropped before finishing
    Failed,
}

type FlightReceiver = watch::Receiver<Option<Landed>>;
type FlightMap = Arc<Mutex<HashMap<String, FlightReceiver>>>;

/// In-flight invocations, keyed by resolved cache key
#[derive(Clone, Default)]
pub(crate) struct SingleFlight {
    flights: FlightMap,
}

/// Role assigned to a caller that boards a flight
pub(crate) enum Boarding {
    Leader(FlightGuard),
    Follower(FlightReceiver),
}

impl SingleFlight {
    /// Join the flight for `key`, or start one if none is in progress
    pub(crate) fn board(&self, key: &str) -> Boarding {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rx) = flights.get(key) {
            return Boarding::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        flights.insert(key.to_owned(), rx);
        Boarding::Leader(FlightGuard {
            key: key.to_owned(),
            flights: Arc::clone(&self.flights),
            tx: Some(tx),
        })
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Wait until the leader publishes an outcome
pub(crate) async fn wait(mut rx: FlightReceiver) -> Landed {
    loop {
        let landed = rx.borrow().clone();
        if let Some(landed) = landed {
            return landed;
        }
        if rx.changed().await.is_err() {
            // Leader dropped its sender without publishing
            return Landed::Failed;
        }
    }
}

/// Held by the leader for the duration of the invocation.
///
/// Removes the flight when dropped, and tells followers the flight failed if
/// no outcome was published (panic or cancellation).
pub(crate) struct FlightGuard {
    key: String,
    flights: FlightMap,
    tx: Option<watch::Sender<Option<Landed>>>,
}

impl FlightGuard {
    /// Publish the outcome, consuming the guard
    pub(crate) fn complete(mut self, landed: Landed) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(landed));
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(Landed::Failed));
        }

        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
