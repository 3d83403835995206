/*! Once-only caches for lookup data such as workspaces and users.

A [`LookupCache`] holds the result of a single "fetch everything" load. The
first caller starts the load; callers arriving while it is in flight await the
same load rather than starting their own. Caches are plain values owned by the
client that uses them, so separate clients never share state.

What happens when a load fails is chosen per cache with an [`ErrorPolicy`].
*/
use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// What a [`LookupCache`] does when its load fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    /// Return the error to every waiting caller, and retry on the next call.
    #[default]
    Propagate,
    /// Log the error, then cache and return an empty value.
    ReturnEmpty,
}

type Load<V, E> = Shared<BoxFuture<'static, Result<Arc<V>, Arc<E>>>>;

/// A lazily loaded, shared value.
pub struct LookupCache<V, E> {
    name: String,
    policy: ErrorPolicy,
    slot: Mutex<Option<Load<V, E>>>,
}

impl<V, E> fmt::Debug for LookupCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<V, E> LookupCache<V, E>
where
    V: Default + Send + Sync + 'static,
    E: fmt::Display + Send + Sync + 'static,
{
    /// Create an empty cache. `name` identifies the cache in logs.
    pub fn new(name: impl Into<String>, policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            slot: Mutex::new(None),
        }
    }

    /// The name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error policy of this cache.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Option<Load<V, E>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value, loading it with `load` if nothing is cached yet.
    ///
    /// `load` is only called when no load is cached or in flight.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<V>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.lock();
            match &*slot {
                Some(shared) => shared.clone(),
                None => {
                    debug!(cache = %self.name, "Loading lookup cache");
                    let shared = self.start(load());
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };
        let result = shared.clone().await;
        if result.is_err() {
            let mut slot = self.lock();
            // A concurrent call may already have replaced the failed load.
            if slot.as_ref().is_some_and(|current| Shared::ptr_eq(current, &shared)) {
                *slot = None;
            }
        }
        result
    }

    fn start<Fut>(&self, load: Fut) -> Load<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let name = self.name.clone();
        let policy = self.policy;
        async move {
            match load.await {
                Ok(value) => Ok(Arc::new(value)),
                Err(e) => match policy {
                    ErrorPolicy::ReturnEmpty => {
                        error!(cache = %name, error = %e, "Lookup load failed; caching an empty value");
                        Ok(Arc::new(V::default()))
                    }
                    ErrorPolicy::Propagate => {
                        warn!(cache = %name, error = %e, "Lookup load failed");
                        Err(Arc::new(e))
                    }
                },
            }
        }
        .boxed()
        .shared()
    }

    /// The cached value, if a load has completed successfully.
    pub fn peek(&self) -> Option<Arc<V>> {
        self.lock()
            .as_ref()
            .and_then(Shared::peek)
            .and_then(|result| result.as_ref().ok().cloned())
    }

    /// Drop the cached value so the next call loads again.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}
