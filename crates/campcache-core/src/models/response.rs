//! Wire format of the `/campgrounds` endpoint and its decoder.
//!
//! The NPS payload carries dozens of fields per campground; only the ones
//! the application displays are modeled and everything else is ignored.
//! Every modeled field is optional so one sparse entry cannot fail the
//! whole listing. Bodies are parsed as JSON5, so unquoted keys,
//! single-quoted strings and trailing commas are accepted alongside strict
//! JSON.

use serde::Deserialize;
use thiserror::Error;

use super::{Campground, CampgroundImage};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed campground response: {0}")]
    Json(#[from] json5::Error),

    #[error("Unexpected campground response: expected a JSON object")]
    NotAnObject,
}

impl DecodeError {
    /// Position of a syntax or type error, as (line, column)
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            DecodeError::Json(json5::Error::Message {
                location: Some(location),
                ..
            }) => Some((location.line, location.column)),
            _ => None,
        }
    }
}

// API Response wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampgroundResponse {
    /// Absent and `null` both mean "no campgrounds"
    #[serde(default)]
    pub data: Option<Vec<WireCampground>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireCampground {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub description: Option<String>,
    #[serde(rename = "latLong", default, deserialize_with = "deserialize_lenient_string")]
    pub lat_long: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<WireImage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireImage {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub caption: Option<String>,
}

impl CampgroundResponse {
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to domain campgrounds, preserving order
    pub fn into_campgrounds(self) -> Vec<Campground> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .map(WireCampground::into_campground)
            .collect()
    }
}

impl WireCampground {
    pub fn into_campground(self) -> Campground {
        Campground {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            lat_long: self.lat_long.unwrap_or_default(),
            images: self
                .images
                .unwrap_or_default()
                .into_iter()
                .map(|img| CampgroundImage {
                    url: img.url.unwrap_or_default(),
                    caption: img.caption,
                })
                .collect(),
        }
    }
}

/// Decode a raw `/campgrounds` body.
///
/// Unknown fields are ignored, quoting is lenient (unquoted keys,
/// single-quoted strings), text fields accept numbers and booleans, and a
/// missing `data` array decodes as empty. Anything structurally wrong
/// (invalid JSON, a non-object top level, `data` that is not an array) is a
/// `DecodeError`.
pub fn decode_response(body: &str) -> Result<CampgroundResponse, DecodeError> {
    let body = body.trim_start_matches('\u{feff}');
    // Serde also accepts a struct written as an array; the listing never is one
    if !body.trim_start().starts_with('{') {
        return Err(DecodeError::NotAnObject);
    }
    Ok(json5::from_str(body)?)
}

// Helper to deserialize string, number or bool as Option<String>
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct LenientStringVisitor;

    impl<'de> de::Visitor<'de> for LenientStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientStringVisitor)
}
