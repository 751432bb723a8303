use thiserror::Error;

/// Why a URL or page could not be turned into a `geo:` URI.
///
/// These are recoverable: the state machine maps each one to its next state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unsupported URL scheme \"{0}\"")]
    Protocol(String),

    #[error("unrecognized Google Maps host \"{0}\"")]
    Host(String),

    #[error("no known pattern matches path \"{0}\"")]
    Path(String),

    #[error("no coordinates or redirect URL found in HTML")]
    HtmlParse,

    #[error("malformed URL \"{url}\": {reason}")]
    MalformedUrl { url: String, reason: String },
}

/// Errors returned by the [`crate::network::Network`] capability.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("redirect from {url} has no Location header")]
    MissingLocation { url: String },

    #[error("malformed redirect Location \"{location}\" from {url}")]
    MalformedRedirect { location: String, url: String },
}

/// Hard faults of the state-machine driving loop.
///
/// Unlike a terminal `Failed` state these signal a bug, not a user-facing
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("state machine exceeded {max_iterations} transitions without reaching a terminal state")]
    IterationLimitExceeded { max_iterations: usize },
}

/// The human-readable reason carried by a terminal `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no URL found")]
    NoUrl,

    #[error("invalid URL")]
    InvalidUrl,

    #[error("failed to resolve short link")]
    UnshortenFailed,

    #[error("connection permission denied")]
    PermissionDenied,

    #[error("failed to create geo: link")]
    ParseUrlFailed,

    #[error("failed to fetch map page")]
    FetchHtmlFailed,
}
