// ── Reactive entity streams ──
//
// Subscription type for consuming collection changes from the DataStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a collection of entities.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct EntityStream<T: Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot as of creation or the last [`changed`](Self::changed).
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// The latest snapshot.
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change and return the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then one per mutation.
pub struct EntityWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> Stream for EntityWatchStream<T> {
    type Item = Arc<Vec<Arc<T>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use super::*;
    use crate::store::collection::EntityCollection;

    #[tokio::test]
    async fn stream_yields_snapshot_then_each_change() {
        let collection = EntityCollection::<i64, &str>::new();
        collection.upsert(1, "truck");
        let mut stream = EntityStream::new(collection.subscribe()).into_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first.len(), 1);

        collection.upsert(2, "van");
        let second = stream.next().await.unwrap();
        assert_eq!(second.len(), 2);

        drop(collection);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn changed_refreshes_current() {
        let collection = EntityCollection::<i64, &str>::new();
        let mut entities = EntityStream::new(collection.subscribe());
        assert!(entities.current().is_empty());

        collection.upsert(7, "trailer");
        assert_eq!(entities.latest().len(), 1);
        assert!(entities.current().is_empty());

        let snap = entities.changed().await.unwrap();
        assert_eq!(*snap[0], "trailer");
        assert_eq!(entities.current().len(), 1);

        drop(collection);
        assert!(entities.changed().await.is_none());
    }
}
