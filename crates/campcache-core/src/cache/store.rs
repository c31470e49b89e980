use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::feed::{CampgroundFeed, Snapshot, TableState};
use crate::models::CampgroundRecord;

/// Consider cache stale after 1 hour.
/// Campground listings change rarely; this only drives the status line.
const CACHE_STALE_MINUTES: i64 = 60;

/// File holding the campground table inside the cache directory
const TABLE_FILE: &str = "campgrounds.json";

/// Scratch file the next table is written to before it replaces `TABLE_FILE`
const TABLE_TMP_FILE: &str = "campgrounds.json.tmp";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize campground table: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cache writer did not complete: {0}")]
    WorkerFailed(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                // Round up: 1d 12h+ becomes 2d
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

struct StoreInner {
    dir: PathBuf,
    table: watch::Sender<TableState>,
    /// Serializes writers so file contents and published snapshots agree
    write_lock: Mutex<()>,
}

/// Persistent, observable table of campground records.
///
/// Clone is cheap and every clone shares the same table and subscribers.
#[derive(Clone)]
pub struct CampgroundStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for CampgroundStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampgroundStore")
            .field("dir", &self.inner.dir)
            .field("rows", &self.len())
            .finish()
    }
}

impl CampgroundStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// A table file that cannot be parsed is logged and treated as empty;
    /// the next successful sync overwrites it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let table_path = dir.join(TABLE_FILE);
        let loaded = Self::load(&table_path)?;
        let initial = match loaded {
            Some(cached) => {
                debug!(rows = cached.data.len(), age = %cached.age_display(), "Loaded cached campgrounds");
                TableState {
                    records: Arc::new(cached.data),
                    cached_at: Some(cached.cached_at),
                }
            }
            None => TableState::default(),
        };
        let (table, _) = watch::channel(initial);

        Ok(Self {
            inner: Arc::new(StoreInner {
                dir,
                table,
                write_lock: Mutex::new(()),
            }),
        })
    }

    fn load(path: &Path) -> Result<Option<CachedData<Vec<CampgroundRecord>>>, StoreError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path)(e)),
        };

        match serde_json::from_str(&contents) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse campground cache, starting empty");
                Ok(None)
            }
        }
    }

    pub fn table_path(&self) -> PathBuf {
        self.inner.dir.join(TABLE_FILE)
    }

    /// Subscribe to the table. See [`CampgroundFeed`].
    pub fn observe_all(&self) -> CampgroundFeed {
        CampgroundFeed::new(self.inner.table.subscribe())
    }

    /// Current contents (cheap `Arc` clone)
    pub fn snapshot(&self) -> Snapshot {
        self.inner.table.borrow().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.table.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row count and write time of the current table, `None` if it was never written
    pub fn cache_info(&self) -> Option<CachedData<usize>> {
        let table = self.inner.table.borrow();
        Some(CachedData {
            data: table.records.len(),
            cached_at: table.cached_at?,
        })
    }

    /// Replace the whole table with `records`.
    ///
    /// The file write runs on tokio's blocking pool. The new table becomes
    /// visible to subscribers in one step after the rename, so no
    /// reader ever observes a half-replaced or empty intermediate table. On
    /// error both the file and the published snapshot are left as they were.
    pub async fn replace_all(&self, records: Vec<CampgroundRecord>) -> Result<(), StoreError> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.write_table(records))
            .await
            .map_err(|e| StoreError::WorkerFailed(e.to_string()))?
    }
}

impl StoreInner {
    fn write_table(&self, records: Vec<CampgroundRecord>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let cached = CachedData::new(records);
        let contents = serde_json::to_vec_pretty(&cached)?;

        let tmp_path = self.dir.join(TABLE_TMP_FILE);
        let table_path = self.dir.join(TABLE_FILE);

        let written = Self::write_durable(&tmp_path, &contents)
            .and_then(|()| std::fs::rename(&tmp_path, &table_path).map_err(io_error(&table_path)));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                debug!(error = %cleanup, "Failed to remove scratch cache file");
            }
            return Err(e);
        }
        // The table is already replaced; a failed directory sync only
        // weakens crash durability
        if let Err(e) = sync_dir(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to sync cache directory");
        }

        let rows = cached.data.len();
        self.table.send_replace(TableState {
            records: Arc::new(cached.data),
            cached_at: Some(cached.cached_at),
        });
        info!(rows, "Campground table replaced");
        Ok(())
    }

    fn write_durable(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let mut file = std::fs::File::create(path).map_err(io_error(path))?;
        file.write_all(contents).map_err(io_error(path))?;
        file.sync_all().map_err(io_error(path))
    }
}

/// Flush directory metadata so a completed rename survives a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn record(name: &str) -> CampgroundRecord {
        CampgroundRecord {
            name: name.to_string(),
            description: format!("{} description", name),
            lat_long: "lat:36.0, long:-112.0".to_string(),
            image_url: Some(format!("https://img/{}.jpg", name)),
        }
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(cached.age_display(), "1d ago");

        // Clock skew
        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_open_creates_empty_table() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cache");
        let store = CampgroundStore::open(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(store.is_empty());
        assert!(store.cache_info().is_none());
        assert!(!store.table_path().exists());
    }

    #[tokio::test]
    async fn test_replace_all_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = CampgroundStore::open(tmp.path()).unwrap();
            store
                .replace_all(vec![record("Mather"), record("Desert View")])
                .await
                .unwrap();
            assert_eq!(store.cache_info().map(|c| c.data), Some(2));
        }

        let reopened = CampgroundStore::open(tmp.path()).unwrap();
        assert_eq!(names(&reopened.snapshot()), vec!["Mather", "Desert View"]);
        assert!(reopened.cache_info().is_some());
        assert!(!tmp.path().join(TABLE_TMP_FILE).exists());
    }

    #[tokio::test]
    async fn test_feed_reflects_every_replace() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        let mut feed = store.observe_all();

        assert!(feed.next().await.unwrap().is_empty());

        store
            .replace_all(vec![record("a"), record("b"), record("c")])
            .await
            .unwrap();
        assert_eq!(names(&feed.next().await.unwrap()), vec!["a", "b", "c"]);

        store.replace_all(vec![record("d")]).await.unwrap();
        assert_eq!(names(&feed.next().await.unwrap()), vec!["d"]);
    }

    #[tokio::test]
    async fn test_new_subscriber_replays_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        store.replace_all(vec![record("a")]).await.unwrap();
        store.replace_all(vec![record("b"), record("c")]).await.unwrap();

        let mut late = store.observe_all();
        assert_eq!(names(&late.next().await.unwrap()), vec!["b", "c"]);
        assert_eq!(names(&late.clone().current()), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_feed_ends_when_store_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        let mut feed = store.observe_all();
        assert!(feed.next().await.is_some());

        drop(store);
        assert!(feed.next().await.is_none());
    }

    #[test]
    fn test_corrupt_table_opens_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(TABLE_FILE), "{ not json").unwrap();

        let store = CampgroundStore::open(tmp.path()).unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_table_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        store.replace_all(vec![record("kept")]).await.unwrap();

        // A directory in place of the table file makes the rename fail
        std::fs::remove_file(store.table_path()).unwrap();
        std::fs::create_dir(store.table_path()).unwrap();

        let result = store.replace_all(vec![record("lost")]).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(names(&store.snapshot()), vec!["kept"]);
        assert!(!tmp.path().join(TABLE_TMP_FILE).exists());
    }

    #[test]
    fn test_sync_dir_on_cache_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(sync_dir(tmp.path()).is_ok());
    }

    #[tokio::test]
    async fn test_cache_info_pairs_rows_with_their_write() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let store = store.clone();
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut seen: Vec<(DateTime<Utc>, usize)> = Vec::new();
                while !done.load(Ordering::Relaxed) {
                    if let Some(info) = store.cache_info() {
                        let pair = (info.cached_at, info.data);
                        if seen.last() != Some(&pair) {
                            seen.push(pair);
                        }
                    }
                }
                seen
            })
        };

        let mut written = Vec::new();
        for i in 0..20 {
            let rows = (0..=i % 3).map(|n| record(&n.to_string())).collect();
            store.replace_all(rows).await.unwrap();
            let info = store.cache_info().unwrap();
            written.push((info.cached_at, info.data));
        }
        done.store(true, Ordering::Relaxed);

        for pair in reader.join().unwrap() {
            assert!(written.contains(&pair), "torn cache info: {pair:?}");
        }
    }
}
