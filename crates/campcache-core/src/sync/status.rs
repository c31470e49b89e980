use chrono::{DateTime, Utc};

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Decode,
    Persist,
    /// The background task died before reporting a result
    Task,
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStage::Fetch => write!(f, "fetch"),
            SyncStage::Decode => write!(f, "decode"),
            SyncStage::Persist => write!(f, "persist"),
            SyncStage::Task => write!(f, "background task"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub stage: SyncStage,
    pub message: String,
}

/// Where the current sync cycle stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No cycle has started (or this activation never fetches)
    #[default]
    Idle,
    Fetching,
    Decoding,
    Persisting,
    /// The cache now holds `count` rows from the server
    Updated { count: usize, at: DateTime<Utc> },
    /// The cycle ended early; the cache still holds whatever it had before
    Failed(SyncFailure),
}

/// What a list view needs to know about the sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready,
    Error,
}

impl SyncStatus {
    pub fn view(&self) -> ViewState {
        match self {
            SyncStatus::Fetching | SyncStatus::Decoding | SyncStatus::Persisting => ViewState::Loading,
            SyncStatus::Idle | SyncStatus::Updated { .. } => ViewState::Ready,
            SyncStatus::Failed(_) => ViewState::Error,
        }
    }

    /// True once the cycle can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Updated { .. } | SyncStatus::Failed(_))
    }

    pub fn failure(&self) -> Option<&SyncFailure> {
        match self {
            SyncStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "Idle"),
            SyncStatus::Fetching => write!(f, "Fetching campgrounds..."),
            SyncStatus::Decoding => write!(f, "Reading response..."),
            SyncStatus::Persisting => write!(f, "Saving campgrounds..."),
            SyncStatus::Updated { count, .. } => write!(f, "Updated {} campgrounds", count),
            SyncStatus::Failed(failure) => {
                write!(f, "Sync failed during {}: {}", failure.stage, failure.message)
            }
        }
    }
}
