//! Request coalescing: at most one in-flight computation per key.
//!
//! The first caller for a key spawns the computation and registers a shared
//! handle to it. Callers arriving while it runs await that same handle and
//! receive a clone of its result. The registration is dropped as soon as the
//! computation finishes, so the next caller starts fresh.
//!
//! [`InFlight::run_unless`] also consults a caller-supplied lookup under the
//! registry lock before starting new work. When the computation publishes its
//! result (for example to a cache) before it finishes, a caller that missed
//! that result just before it landed still finds it instead of starting a
//! second computation.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;

type Pending<T> = Shared<BoxFuture<'static, Result<T, Error>>>;
type Registry<T> = Arc<Mutex<HashMap<String, Pending<T>>>>;

fn lock<T>(registry: &Registry<T>) -> MutexGuard<'_, HashMap<String, Pending<T>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a key from the registry when the computation ends, even by panic.
struct Registration<T> {
    registry: Registry<T>,
    key: String,
}

impl<T> Drop for Registration<T> {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.key);
    }
}

/// Registry of in-flight computations keyed by string.
pub struct InFlight<T> {
    pending: Registry<T>,
}

impl<T> Default for InFlight<T> {
    fn default() -> Self {
        Self { pending: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<T> Clone for InFlight<T> {
    fn clone(&self) -> Self {
        Self { pending: Arc::clone(&self.pending) }
    }
}

impl<T: Clone + Send + Sync + 'static> InFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for `key`, or join the computation already running for it.
    ///
    /// `work` is only polled if this caller becomes the owner. The computation
    /// runs on its own task, so it completes even if every waiter goes away.
    pub async fn run<Fut>(&self, key: &str, work: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        self.run_unless(key, || None, work).await
    }

    /// Like [`InFlight::run`], but when nothing is registered for `key` the
    /// `settled` lookup runs under the registry lock first. A value found
    /// there is returned as is and `work` is dropped unpolled.
    pub async fn run_unless<F, Fut>(&self, key: &str, settled: F, work: Fut) -> Result<T, Error>
    where
        F: FnOnce() -> Option<T>,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let pending = {
            let mut map = lock(&self.pending);
            match map.get(key) {
                Some(pending) => {
                    tracing::debug!(key, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    if let Some(value) = settled() {
                        tracing::debug!(key, "result published before registration");
                        return Ok(value);
                    }
                    let registration = Registration { registry: Arc::clone(&self.pending), key: key.to_string() };
                    let task = tokio::spawn(async move {
                        let _registration = registration;
                        work.await
                    });
                    let pending = async move {
                        task.await.unwrap_or_else(|e| Err(Error::FetchFailed(format!("fetch task aborted: {e}"))))
                    }
                    .boxed()
                    .shared();
                    map.insert(key.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of computations currently registered.
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(key)
    }
}
