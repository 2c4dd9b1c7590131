//! Single-flight request coalescing.
//!
//! Concurrent calls for the same key share one execution of the load: the
//! first caller starts it, every caller (the first included) waits for its
//! result. The load runs on its own tokio task, so it completes even when
//! every caller stops waiting. The call is forgotten once it completes, so a
//! call arriving afterwards loads afresh.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

type Calls<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

/// The load for a key ended without producing a result (it panicked or its
/// runtime shut down).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("load for {0} ended without a result")]
pub struct Abandoned(pub String);

/// Deduplicates in-flight loads by key.
#[derive(Debug)]
pub struct SingleFlight<T> {
    calls: Calls<T>,
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the call record when the load task finishes or unwinds.
struct CallGuard<T> {
    calls: Calls<T>,
    key: String,
}

impl<T> Drop for CallGuard<T> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start `load` on a new task unless a call for `key` is already in
    /// flight, then wait for that call's result.
    ///
    /// `load` is only invoked by the caller that starts the flight. Must be
    /// called from within a tokio runtime.
    pub async fn run<F, Fut>(&self, key: &str, load: F) -> Result<T, Abandoned>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut pending = {
            let mut calls = self.calls.lock();
            match calls.get(key).cloned() {
                Some(pending) => pending,
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_string(), rx.clone());

                    let guard = CallGuard {
                        calls: self.calls.clone(),
                        key: key.to_string(),
                    };
                    let load = load();
                    tokio::spawn(async move {
                        let guard = guard;
                        let value = load.await;
                        // Forget the call before publishing, so a woken caller sees it gone.
                        drop(guard);
                        tx.send_replace(Some(value));
                    });
                    rx
                }
            }
        };

        let outcome = pending
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|done| done.clone());
        outcome.ok_or_else(|| {
            warn!(key, "In-flight load ended without a result");
            Abandoned(key.to_string())
        })
    }

    /// Number of keys with a load in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
