use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use tokio::sync::watch;

use crate::models::CampgroundRecord;

/// Full contents of the campground table at one point in time.
pub type Snapshot = Arc<Vec<CampgroundRecord>>;

/// Everything one write publishes, sent as a single watch value so rows and
/// their write time are always read together.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableState {
    pub(crate) records: Snapshot,
    pub(crate) cached_at: Option<DateTime<Utc>>,
}

/// Live view of the campground table.
///
/// The first call to [`next`](Self::next) yields the snapshot current at
/// subscription time; every later call waits for the table to change and
/// yields the new contents in full. A reader that falls behind skips
/// intermediate snapshots but always lands on the latest one.
#[derive(Debug)]
pub struct CampgroundFeed {
    rx: watch::Receiver<TableState>,
    primed: bool,
}

impl CampgroundFeed {
    pub(crate) fn new(rx: watch::Receiver<TableState>) -> Self {
        Self { rx, primed: false }
    }

    /// Wait for the next snapshot. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().records.clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().records.clone())
    }

    /// Latest snapshot, without waiting or consuming a change
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().records.clone()
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send + 'static {
        stream::unfold(self, |mut feed| async move {
            let snapshot = feed.next().await?;
            Some((snapshot, feed))
        })
    }
}

impl Clone for CampgroundFeed {
    /// A clone is a fresh subscription: it replays the latest snapshot first.
    fn clone(&self) -> Self {
        Self::new(self.rx.clone())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use crate::cache::CampgroundStore;
    use crate::models::CampgroundRecord;

    fn record(name: &str) -> CampgroundRecord {
        CampgroundRecord {
            name: name.to_string(),
            description: String::new(),
            lat_long: String::new(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_stream_yields_snapshots_until_store_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        let mut stream = Box::pin(store.observe_all().into_stream());

        assert!(stream.next().await.unwrap().is_empty());

        store.replace_all(vec![record("a"), record("b")]).await.unwrap();
        assert_eq!(stream.next().await.unwrap().len(), 2);

        drop(store);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_current_does_not_consume_change() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        let mut feed = store.observe_all();
        feed.next().await.unwrap();

        store.replace_all(vec![record("a")]).await.unwrap();
        assert_eq!(feed.current().len(), 1);
        assert_eq!(feed.next().await.unwrap().len(), 1);
    }
}
