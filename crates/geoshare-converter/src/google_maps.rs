//! Google Maps URL and HTML parsing.
//!
//! A URL is matched against [`PATH_PATTERNS`] in order and the first match
//! wins. The order is part of the contract: ambiguous paths resolve to the
//! most specific grammar, which means data-block coordinates beat the
//! `@lat,lon,zoom` view, which beats a place name with coordinates, which
//! beats a bare place name, then search and directions variants, then bare
//! roots.
//!
//! After the path, the query string is scanned for the parameters in
//! [`QUERY_PARAMS`], and each matching value is merged into the same
//! builder.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::error::ParseError;
use crate::geo_uri::{GeoUri, GeoUriBuilder};
use crate::quote::{PercentQuote, UriQuote};

/// Host used to resolve host-relative redirect URLs found in search pages.
pub const CANONICAL_MAPS_ORIGIN: &str = "https://www.google.com";

/// Host and path prefixes of the short-link services.
const SHORT_URL_PREFIXES: [&str; 4] = [
    "maps.app.goo.gl/",
    "app.goo.gl/",
    "goo.gl/maps/",
    "g.co/kgs/",
];

const LAT: &str = r"(?P<lat>-?\d{1,2}(?:\.\d{1,15})?)";
const LON: &str = r"(?P<lon>-?\d{1,3}(?:\.\d{1,15})?)";
const ZOOM: &str = r"(?P<z>\d{1,2}(?:\.\d{1,15})?)";
/// A place or search segment. A leading `@` belongs to the map view instead.
const PLACE: &str = r"(?P<q>[^/@][^/]*)";
const QUERY: &str = r"(?P<q>.+)";
/// An `@lat,lon,zoomz` view whose coordinates are not captured.
const SKIP_VIEW: &str = r"@[\d.,+\s-]+,";

fn coords() -> String {
    format!(r"[+\s]?{LAT},[+\s]?\+?{LON}")
}

fn data_coords() -> String {
    format!(r"!3d{LAT}!4d{LON}")
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Path grammars in priority order.
static PATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let coords = coords();
    let data = data_coords();
    [
        // Data block with a zoomed view, optionally under a place name.
        format!(r"^/maps/(?:place/{PLACE}/)?(?:.*/)?{SKIP_VIEW}{ZOOM}z/data=.*{data}.*$"),
        format!(r"^/maps/(?:place/{PLACE}/)?(?:.*/)?data=.*{data}.*$"),
        // Map view shorthand.
        format!(r"^/maps/@{coords},{ZOOM}z.*$"),
        format!(r"^/maps/@{coords}.*$"),
        r"^/maps/@$".to_owned(),
        // Places.
        format!(r"^/maps/place/{coords}/{SKIP_VIEW}{ZOOM}z.*$"),
        format!(r"^/maps/place/{PLACE}/@{coords},{ZOOM}z.*$"),
        format!(r"^/maps/place/{PLACE}/@{coords}.*$"),
        format!(r"^/maps/place/{coords}(?:/.*)?$"),
        format!(r"^/maps/place/{PLACE}(?:/.*)?$"),
        r"^/maps/place//.*$".to_owned(),
        r"^/maps/placelists/list/.*$".to_owned(),
        // Search.
        format!(r"^/maps/search/{coords}(?:/.*)?$"),
        format!(r"^/maps/search/{PLACE}/@{coords},{ZOOM}z.*$"),
        format!(r"^/maps/search/{PLACE}/?$"),
        r"^/maps/search/?$".to_owned(),
        // Directions: the last stop is the destination.
        format!(r"^/maps/dir/(?:.*/)?{coords}/data[^/]*$"),
        format!(r"^/maps/dir/(?:.*/)?{coords}/{SKIP_VIEW}{ZOOM}z.*$"),
        format!(r"^/maps/dir/(?:.*/)?{coords}/?$"),
        format!(r"^/maps/dir/(?:.*/)?{PLACE}/{SKIP_VIEW}{ZOOM}z.*$"),
        format!(r"^/maps/dir/(?:.*/)?{PLACE}/data[^/]*$"),
        format!(r"^/maps/dir/(?:.*/)?{PLACE}/?$"),
        r"^/maps/dir/?$".to_owned(),
        // Bare roots.
        r"^/maps/?$".to_owned(),
        r"^/search/?$".to_owned(),
        r"^/?$".to_owned(),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Recognized query parameters, lowest priority first.
///
/// Every parameter present is merged, so a later entry overwrites a field an
/// earlier one set. Within one parameter the first matching shape wins.
static QUERY_PARAMS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    let coords = compile(&format!(r"^{}$", coords()));
    let text = compile(&format!(r"^{QUERY}$"));
    let zoom = compile(&format!(r"^{ZOOM}$"));
    vec![
        ("center", vec![coords.clone()]),
        ("viewpoint", vec![coords.clone()]),
        ("query", vec![coords.clone(), text.clone()]),
        ("q", vec![coords.clone(), text.clone()]),
        ("destination", vec![coords, text]),
        ("zoom", vec![zoom]),
    ]
});

/// Coordinate shapes embedded in Maps HTML, in priority order.
static HTML_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let coords = coords();
    vec![
        compile(&format!(r"/@{coords}")),
        compile(&format!(r"\[null,null,{coords}\]")),
    ]
});

static SEARCH_REDIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"data-url="(?P<url>[^"]+)""#));

static MAPS_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:(?:www|maps)\.)?google(?:\.com?)?\.[a-z]{2,3}$"));

/// Converts Google Maps URLs and pages into `geo:` URIs.
#[derive(Debug, Clone, Default)]
pub struct GoogleMapsConverter<Q: UriQuote = PercentQuote> {
    quote: Q,
}

impl<Q: UriQuote + Clone> GoogleMapsConverter<Q> {
    pub fn new(quote: Q) -> Self {
        Self { quote }
    }

    /// Returns `true` for a short link that carries a token.
    ///
    /// A short-link host with an empty path is a homepage, not a link.
    #[must_use]
    pub fn is_short_url(&self, url: &Url) -> bool {
        if !is_http(url) {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host_and_path = format!("{}{}", host.to_ascii_lowercase(), url.path());
        SHORT_URL_PREFIXES.iter().any(|prefix| {
            host_and_path
                .strip_prefix(prefix)
                .is_some_and(|token| !token.trim_matches('/').is_empty())
        })
    }

    /// Parses a long Google Maps URL.
    ///
    /// A URL that matches a grammar but carries no coordinates yields a
    /// [`GeoUri`] at `0,0`; callers decide whether to fetch the page.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Protocol`] if the scheme is not `http` or `https`.
    /// - [`ParseError::Host`] if the host is not a Google Maps domain.
    /// - [`ParseError::Path`] if no path grammar matches.
    pub fn parse_url(&self, url: &Url) -> Result<GeoUri, ParseError> {
        if !is_http(url) {
            return Err(ParseError::Protocol(url.scheme().to_owned()));
        }
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !MAPS_HOST_RE.is_match(&host) {
            return Err(ParseError::Host(host));
        }

        let path = self.quote.decode(&url.path().replace('+', " "));
        if path.is_empty() {
            return Err(ParseError::Path(path));
        }

        let mut builder = GeoUriBuilder::new(self.quote.clone());
        let Some((index, captures)) = PATH_PATTERNS
            .iter()
            .enumerate()
            .find_map(|(i, re)| re.captures(&path).map(|c| (i, c)))
        else {
            tracing::debug!(path = %path, "no path pattern matched");
            return Err(ParseError::Path(path));
        };
        tracing::debug!(path = %path, pattern = index, "matched path pattern");
        builder.apply_captures(&captures);

        if let Some(query) = url.query() {
            self.apply_query(query, &mut builder);
        }

        Ok(builder.build())
    }

    fn apply_query(&self, query: &str, builder: &mut GeoUriBuilder<Q>) {
        let pairs: Vec<(&str, String)> = query
            .split('&')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                Some((name, self.quote.decode(&value.replace('+', " "))))
            })
            .collect();

        for (name, shapes) in QUERY_PARAMS.iter() {
            let Some((_, value)) = pairs.iter().find(|(n, _)| n == name) else {
                continue;
            };
            if let Some(captures) = shapes.iter().find_map(|re| re.captures(value)) {
                tracing::debug!(param = *name, "matched query parameter");
                builder.apply_captures(&captures);
            }
        }
    }

    /// Scans a Google Maps page for embedded coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::HtmlParse`] if no coordinate shape is present.
    pub fn parse_html(&self, html: &str) -> Result<GeoUri, ParseError> {
        let captures = HTML_PATTERNS
            .iter()
            .find_map(|re| re.captures(html))
            .ok_or(ParseError::HtmlParse)?;

        let mut builder = GeoUriBuilder::new(self.quote.clone());
        builder.apply_captures(&captures);
        Ok(builder.build())
    }

    /// Extracts the Maps URL a Google Search result page redirects to.
    ///
    /// Host-relative values are resolved against [`CANONICAL_MAPS_ORIGIN`].
    ///
    /// # Errors
    ///
    /// - [`ParseError::HtmlParse`] if the page has no `data-url` attribute.
    /// - [`ParseError::MalformedUrl`] if the attribute is not a valid URL.
    pub fn parse_google_search_html(&self, html: &str) -> Result<Url, ParseError> {
        let raw = SEARCH_REDIRECT_RE
            .captures(html)
            .and_then(|c| c.name("url"))
            .ok_or(ParseError::HtmlParse)?
            .as_str()
            .replace("&amp;", "&");

        let base = Url::parse(CANONICAL_MAPS_ORIGIN).map_err(|e| ParseError::MalformedUrl {
            url: CANONICAL_MAPS_ORIGIN.to_owned(),
            reason: e.to_string(),
        })?;
        let resolved = base.join(&raw).map_err(|e| ParseError::MalformedUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !is_http(&resolved) || resolved.host_str().is_none() {
            return Err(ParseError::MalformedUrl {
                url: raw,
                reason: "not an http(s) URL with a host".to_owned(),
            });
        }
        Ok(resolved)
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
#[path = "google_maps_test.rs"]
mod tests;
