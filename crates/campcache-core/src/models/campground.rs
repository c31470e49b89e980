use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampgroundImage {
    pub url: String,
    pub caption: Option<String>,
}

/// A campground as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campground {
    pub name: String,
    pub description: String,
    /// Coordinate text exactly as the API delivers it, e.g. `lat:36.6, long:-118.8`
    pub lat_long: String,
    pub images: Vec<CampgroundImage>,
}

impl Campground {
    /// URL of the first image, if it has one
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .first()
            .map(|img| img.url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(&self.lat_long)
    }
}

/// A campground row in the local cache.
///
/// Only the first image survives the projection from `Campground`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampgroundRecord {
    pub name: String,
    pub description: String,
    pub lat_long: String,
    pub image_url: Option<String>,
}

impl CampgroundRecord {
    /// Expand back into the display form, with at most one uncaptioned image
    pub fn to_campground(&self) -> Campground {
        Campground {
            name: self.name.clone(),
            description: self.description.clone(),
            lat_long: self.lat_long.clone(),
            images: self
                .image_url
                .iter()
                .map(|url| CampgroundImage {
                    url: url.clone(),
                    caption: None,
                })
                .collect(),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(&self.lat_long)
    }
}

impl From<&Campground> for CampgroundRecord {
    fn from(campground: &Campground) -> Self {
        Self {
            name: campground.name.clone(),
            description: campground.description.clone(),
            lat_long: campground.lat_long.clone(),
            image_url: campground.image_url().map(str::to_string),
        }
    }
}

impl From<Campground> for CampgroundRecord {
    fn from(campground: Campground) -> Self {
        Self::from(&campground)
    }
}

// ============================================================================
// Coordinates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Parse the loose coordinate text the API uses.
    ///
    /// Accepts `lat:36.6, long:-118.8`, `{lat:36.6, lng:-118.8}` and a bare
    /// `36.6, -118.8`. Returns `None` for anything else, including values
    /// outside the valid latitude/longitude ranges.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim().trim_start_matches('{').trim_end_matches('}');
        let mut parts = trimmed.split(',');
        let latitude = Self::parse_component(parts.next()?, &["lat", "latitude"])?;
        let longitude = Self::parse_component(parts.next()?, &["long", "lng", "lon", "longitude"])?;
        if parts.next().is_some() {
            return None;
        }

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self { latitude, longitude })
    }

    fn parse_component(part: &str, labels: &[&str]) -> Option<f64> {
        let part = part.trim();
        let value = match part.split_once(':') {
            Some((label, value)) => {
                let label = label.trim().trim_matches('"').to_lowercase();
                if !labels.contains(&label.as_str()) {
                    return None;
                }
                value
            }
            None => part,
        };
        value.trim().trim_matches('"').parse().ok()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{} {:.4}°{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}
