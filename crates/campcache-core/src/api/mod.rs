//! REST API client module for the National Park Service data API.
//!
//! This module provides the `ParksClient` for fetching the campground
//! listing. The API authenticates with a static key passed as the
//! `api_key` query parameter.

pub mod client;
pub mod error;

pub use client::ParksClient;
pub use error::ApiError;
