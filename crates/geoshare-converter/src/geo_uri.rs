//! `geo:` URI accumulation and serialization.
//!
//! A [`GeoUriBuilder`] collects the named captures of successive pattern
//! matches against one URL. Each present capture overwrites the field it
//! names; absent captures leave earlier values in place, so the last non-null
//! value wins.

use regex::Captures;
use serde::Serialize;

use crate::quote::{PercentQuote, UriQuote};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 21;

/// Decimal-degree coordinates kept as text to preserve input precision.
///
/// `"0","0"` means no coordinates were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoCoordinates {
    pub lat: String,
    pub lon: String,
}

impl Default for GeoCoordinates {
    fn default() -> Self {
        Self {
            lat: "0".to_owned(),
            lon: "0".to_owned(),
        }
    }
}

impl GeoCoordinates {
    #[must_use]
    pub fn new(lat: &str, lon: &str) -> Self {
        Self {
            lat: lat.to_owned(),
            lon: lon.to_owned(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.lat == "0" && self.lon == "0"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeoParams {
    /// Free-text place or search query, stored decoded.
    pub q: Option<String>,
    /// Zoom level within `MIN_ZOOM..=MAX_ZOOM`.
    pub z: Option<u8>,
}

/// A finished `geo:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoUri {
    pub coords: GeoCoordinates,
    pub params: GeoParams,
    #[serde(rename = "uri")]
    text: String,
}

impl GeoUri {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        !self.coords.is_zero()
    }
}

impl std::fmt::Display for GeoUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Mutable accumulator for a [`GeoUri`].
#[derive(Debug, Clone)]
pub struct GeoUriBuilder<Q: UriQuote = PercentQuote> {
    coords: GeoCoordinates,
    params: GeoParams,
    quote: Q,
}

impl Default for GeoUriBuilder<PercentQuote> {
    fn default() -> Self {
        Self::new(PercentQuote)
    }
}

impl<Q: UriQuote> GeoUriBuilder<Q> {
    pub fn new(quote: Q) -> Self {
        Self {
            coords: GeoCoordinates::default(),
            params: GeoParams::default(),
            quote,
        }
    }

    /// Merges the `lat`, `lon`, `q` and `z` groups of one regex match.
    ///
    /// `lat` and `lon` only apply as a pair. Captures must come from text
    /// that is already decoded; `q` is stored as captured.
    pub fn apply_captures(&mut self, captures: &Captures<'_>) {
        if let (Some(lat), Some(lon)) = (captures.name("lat"), captures.name("lon")) {
            self.set_coords(lat.as_str(), lon.as_str());
        }
        if let Some(q) = captures.name("q") {
            self.set_decoded_query(q.as_str());
        }
        if let Some(z) = captures.name("z") {
            self.set_zoom(z.as_str());
        }
    }

    pub fn set_coords(&mut self, lat: &str, lon: &str) {
        self.coords = GeoCoordinates::new(lat, lon);
    }

    /// Stores a query after turning `+` into spaces and percent-decoding it.
    pub fn set_query(&mut self, raw: &str) {
        let text = self.quote.decode(&raw.replace('+', " "));
        self.set_decoded_query(&text);
    }

    pub fn set_decoded_query(&mut self, text: &str) {
        self.params.q = Some(text.to_owned());
    }

    /// Stores a zoom level, rounded half-up and clamped to
    /// `MIN_ZOOM..=MAX_ZOOM`. Non-numeric input is ignored.
    pub fn set_zoom(&mut self, raw: &str) {
        if let Some(z) = normalize_zoom(raw) {
            self.params.z = Some(z);
        }
    }

    #[must_use]
    pub fn coords(&self) -> &GeoCoordinates {
        &self.coords
    }

    #[must_use]
    pub fn params(&self) -> &GeoParams {
        &self.params
    }

    #[must_use]
    pub fn build(&self) -> GeoUri {
        GeoUri {
            coords: self.coords.clone(),
            params: self.params.clone(),
            text: self.render(),
        }
    }

    fn render(&self) -> String {
        let mut query = Vec::with_capacity(2);
        if let Some(q) = &self.params.q {
            query.push(format!("q={}", self.quote.encode(q)));
        }
        if let Some(z) = self.params.z {
            query.push(format!("z={z}"));
        }

        let mut text = format!("geo:{},{}", self.coords.lat, self.coords.lon);
        if !query.is_empty() {
            text.push('?');
            text.push_str(&query.join("&"));
        }
        text
    }
}

impl<Q: UriQuote> std::fmt::Display for GeoUriBuilder<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn normalize_zoom(raw: &str) -> Option<u8> {
    let value = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let clamped = value
        .round()
        .clamp(f64::from(MIN_ZOOM), f64::from(MAX_ZOOM));
    Some(clamped as u8)
}
