//! Core library for campcache.
//!
//! Fetches campgrounds from the National Park Service data API, keeps the
//! latest result set in a local cache, and exposes that cache as a live feed
//! for whatever presents the list.
//!
//! - [`api`]: the `ParksClient` that performs the single outbound request
//! - [`models`]: wire, domain and persisted campground types plus the decoder
//! - [`cache`]: the `CampgroundStore` and its live `CampgroundFeed`
//! - [`sync`]: the `SyncOrchestrator` tying the three together

pub mod api;
pub mod cache;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{ApiError, ParksClient};
pub use cache::{CachedData, CampgroundFeed, CampgroundStore, StoreError};
pub use models::{
    decode_response, Campground, CampgroundImage, CampgroundRecord, CampgroundResponse,
    Coordinates, DecodeError,
};
pub use sync::{SyncError, SyncFailure, SyncOrchestrator, SyncSession, SyncStage, SyncStatus, ViewState};
