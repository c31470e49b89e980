//! Data models for NPS campgrounds.
//!
//! This module contains the three shapes a campground takes:
//!
//! - `CampgroundResponse`, `WireCampground`: the API payload as delivered
//! - `Campground`, `CampgroundImage`: the domain form shown to users
//! - `CampgroundRecord`: the narrower form kept in the local cache

pub mod campground;
pub mod response;

pub use campground::{Campground, CampgroundImage, CampgroundRecord, Coordinates};
pub use response::{decode_response, CampgroundResponse, DecodeError, WireCampground, WireImage};
