use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::status::{SyncFailure, SyncStage, SyncStatus};
use crate::api::{ApiError, ParksClient};
use crate::cache::{CampgroundFeed, CampgroundStore, StoreError};
use crate::models::{decode_response, CampgroundRecord, DecodeError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch campgrounds: {0}")]
    Network(#[from] ApiError),

    #[error("Failed to decode campgrounds: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to save campgrounds: {0}")]
    Store(#[from] StoreError),

    #[error("Sync task did not run to completion: {0}")]
    Aborted(String),
}

impl SyncError {
    pub fn stage(&self) -> SyncStage {
        match self {
            SyncError::Network(_) => SyncStage::Fetch,
            SyncError::Decode(_) => SyncStage::Decode,
            SyncError::Store(_) => SyncStage::Persist,
            SyncError::Aborted(_) => SyncStage::Task,
        }
    }
}

/// Coordinates the fetch → decode → persist pipeline for one activation.
///
/// The cache is only ever written on the success path: a network or decode
/// failure leaves whatever the store already holds in place.
pub struct SyncOrchestrator {
    client: ParksClient,
    store: CampgroundStore,
    status: watch::Sender<SyncStatus>,
}

impl SyncOrchestrator {
    pub fn new(client: ParksClient, store: CampgroundStore) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            client,
            store,
            status,
        }
    }

    /// Subscribe to the cache, then start the single sync cycle in the
    /// background. Must be called from within a tokio runtime.
    pub fn activate(self) -> SyncSession {
        let feed = self.store.observe_all();
        let status = self.status.subscribe();

        info!(cached_rows = self.store.len(), "Starting campground sync");
        let task = tokio::spawn(async move { self.run_cycle().await });

        SyncSession {
            feed,
            status,
            task: Some(task),
        }
    }

    /// Subscribe to the cache without contacting the API.
    pub fn activate_offline(self) -> SyncSession {
        info!(cached_rows = self.store.len(), "Offline mode - showing cached campgrounds only");
        SyncSession {
            feed: self.store.observe_all(),
            status: self.status.subscribe(),
            task: None,
        }
    }

    fn set_status(&self, status: SyncStatus) {
        debug!(%status, "Sync status changed");
        self.status.send_replace(status);
    }

    async fn run_cycle(&self) -> Result<usize, SyncError> {
        let result = self.sync_once().await;
        match &result {
            Ok(count) => self.set_status(SyncStatus::Updated {
                count: *count,
                at: Utc::now(),
            }),
            Err(e) => {
                error!(stage = %e.stage(), error = %e, "Campground sync failed, keeping cached list");
                self.set_status(SyncStatus::Failed(SyncFailure {
                    stage: e.stage(),
                    message: e.to_string(),
                }));
            }
        }
        result
    }

    async fn sync_once(&self) -> Result<usize, SyncError> {
        self.set_status(SyncStatus::Fetching);
        let body = self.client.fetch_campgrounds().await?;

        self.set_status(SyncStatus::Decoding);
        let response = decode_response(&body)?;
        if response.data.is_none() {
            warn!("Campground response has no data, cache will be cleared");
        }

        let records: Vec<CampgroundRecord> = response
            .into_campgrounds()
            .iter()
            .map(CampgroundRecord::from)
            .collect();
        let count = records.len();

        self.set_status(SyncStatus::Persisting);
        self.store.replace_all(records).await?;

        info!(count, "Campground sync complete");
        Ok(count)
    }
}

/// Handle returned by [`SyncOrchestrator::activate`].
///
/// `feed` always mirrors the cache. `status` reports the cycle's progress;
/// its last value stays readable after the cycle ends.
pub struct SyncSession {
    pub feed: CampgroundFeed,
    pub status: watch::Receiver<SyncStatus>,
    task: Option<JoinHandle<Result<usize, SyncError>>>,
}

impl SyncSession {
    pub fn is_offline(&self) -> bool {
        self.task.is_none()
    }

    /// Wait for the cycle to end and return its outcome.
    ///
    /// Returns `None` for offline sessions and on every call after the first.
    pub async fn finished(&mut self) -> Option<Result<usize, SyncError>> {
        let task = self.task.take()?;
        Some(match task.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Aborted(e.to_string())),
        })
    }

    /// Wait until the status reaches `Updated` or `Failed`, or the cycle
    /// goes away without getting there, and return the last status.
    pub async fn settled(&mut self) -> SyncStatus {
        let settled = self
            .status
            .wait_for(SyncStatus::is_terminal)
            .await
            .map(|status| status.clone());
        settled.unwrap_or_else(|_| self.status.borrow().clone())
    }
}
