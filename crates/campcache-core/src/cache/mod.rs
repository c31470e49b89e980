//! Local caching module for offline data access.
//!
//! This module provides the `CampgroundStore`, a single-table cache of
//! `CampgroundRecord`s persisted as JSON and considered stale after 60
//! minutes. Every successful sync replaces the table wholesale.
//!
//! Readers subscribe through `CampgroundFeed`, which hands out a full
//! snapshot of the table each time it changes.

pub mod feed;
pub mod store;

pub use feed::CampgroundFeed;
pub use store::{CachedData, CampgroundStore, StoreError};
