//! Extraction of a URL or `geo:` URI from an inbound share/view event.

use std::sync::LazyLock;

use regex::Regex;

static URL_IN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentAction {
    /// Open a single URI, carried in `data`.
    View,
    /// Share free text, carried in `text`.
    SendText,
    Other(String),
}

/// An inbound event from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentEvent {
    pub action: IntentAction,
    pub data: Option<String>,
    pub text: Option<String>,
}

impl IntentEvent {
    #[must_use]
    pub fn view(data: &str) -> Self {
        Self {
            action: IntentAction::View,
            data: Some(data.to_owned()),
            text: None,
        }
    }

    #[must_use]
    pub fn send_text(text: &str) -> Self {
        Self {
            action: IntentAction::SendText,
            data: None,
            text: Some(text.to_owned()),
        }
    }
}

/// Returns the event's URI if it is a view action on a `geo:` URI.
#[must_use]
pub fn get_geo_uri(event: &IntentEvent) -> Option<String> {
    if event.action != IntentAction::View {
        return None;
    }
    event
        .data
        .as_deref()
        .filter(|data| has_geo_scheme(data))
        .map(str::to_owned)
}

/// Returns the URL carried by the event.
///
/// View actions yield their data string unchanged. Send-text actions yield
/// the first `http(s)://` token in the text. Anything else yields `None`.
#[must_use]
pub fn get_url_string(event: &IntentEvent) -> Option<String> {
    match event.action {
        IntentAction::View => event.data.clone(),
        IntentAction::SendText => event
            .text
            .as_deref()
            .and_then(|text| URL_IN_TEXT_RE.find(text))
            .map(|m| m.as_str().to_owned()),
        IntentAction::Other(_) => None,
    }
}

/// Returns `true` if `s` starts with the `geo:` scheme, in any case.
#[must_use]
pub fn has_geo_scheme(s: &str) -> bool {
    s.get(..4).is_some_and(|scheme| scheme.eq_ignore_ascii_case("geo:"))
}
