//! Abort handles for requests a view has in flight

use crate::core::error::ViewError;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use indexmap::IndexMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Kind of operation holding an abort handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A fetch; a newer query aborts every older one
    Query,
    /// A mutation; runs until it completes or the owner closes
    Mutation,
}

/// Registry of abortable operations for one view
///
/// Starting a query aborts the queries still in flight. Closing the registry
/// aborts everything and refuses new operations.
#[derive(Debug, Default)]
pub struct InFlight {
    handles: Mutex<IndexMap<u64, (OperationKind, AbortHandle)>>,
    counter: AtomicU64,
    latest_query: AtomicU64,
    closed: AtomicBool,
}

/// Removes an operation's handle when it finishes or is dropped mid-flight
struct Finish<'a> {
    registry: &'a InFlight,
    id: u64,
}

impl Drop for Finish<'_> {
    fn drop(&mut self) {
        self.registry.handles().shift_remove(&self.id);
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, IndexMap<u64, (OperationKind, AbortHandle)>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, kind: OperationKind) -> Result<(u64, AbortRegistration), ViewError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ViewError::Cancelled);
        }

        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let (handle, registration) = AbortHandle::new_pair();
        let mut handles = self.handles();

        if kind == OperationKind::Query {
            self.latest_query.store(id, Ordering::SeqCst);
            handles.retain(|previous, (k, h)| {
                if *k == OperationKind::Query {
                    tracing::debug!(query = *previous, superseded_by = id, "Aborting superseded query");
                    h.abort();
                    false
                } else {
                    true
                }
            });
        }

        handles.insert(id, (kind, handle));
        Ok((id, registration))
    }

    /// Run `fut` as an abortable operation
    ///
    /// Returns the operation id with the output, or `ViewError::Cancelled`
    /// when the operation was aborted before completing.
    pub async fn run<F: Future>(
        &self,
        kind: OperationKind,
        fut: F,
    ) -> Result<(u64, F::Output), ViewError> {
        let (id, registration) = self.begin(kind)?;
        let _finish = Finish { registry: self, id };

        match Abortable::new(fut, registration).await {
            Ok(output) => Ok((id, output)),
            Err(_aborted) => Err(ViewError::Cancelled),
        }
    }

    /// Whether `id` is the most recently started query
    pub fn is_latest_query(&self, id: u64) -> bool {
        self.latest_query.load(Ordering::SeqCst) == id
    }

    /// Number of operations currently in flight
    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every operation in flight
    pub fn cancel_all(&self) {
        let mut handles = self.handles();
        for (_, (_, handle)) in handles.drain(..) {
            handle.abort();
        }
    }

    /// Abort everything and refuse new operations
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cancel_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_completes() {
        let registry = InFlight::new();
        let (id, value) = registry.run(OperationKind::Query, async { 7 }).await.unwrap();
        assert_eq!(value, 7);
        assert!(registry.is_latest_query(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_new_query_aborts_previous() {
        let registry = Arc::new(InFlight::new());

        let slow = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .run(OperationKind::Query, tokio::time::sleep(Duration::from_secs(5)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (id, _) = registry.run(OperationKind::Query, async {}).await.unwrap();
        assert!(registry.is_latest_query(id));
        assert_eq!(slow.await.unwrap().unwrap_err(), ViewError::Cancelled);
    }

    #[tokio::test]
    async fn test_query_does_not_abort_mutation() {
        let registry = Arc::new(InFlight::new());

        let mutation = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .run(OperationKind::Mutation, async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        "saved"
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.run(OperationKind::Query, async {}).await.unwrap();

        assert_eq!(mutation.await.unwrap().unwrap().1, "saved");
    }

    #[tokio::test]
    async fn test_close_aborts_and_refuses() {
        let registry = Arc::new(InFlight::new());
        let pending = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .run(OperationKind::Mutation, tokio::time::sleep(Duration::from_secs(5)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        registry.close();
        assert_eq!(pending.await.unwrap().unwrap_err(), ViewError::Cancelled);
        assert!(registry.run(OperationKind::Query, async {}).await.is_err());
        assert!(registry.is_closed());
    }
}
