//! The URL-to-`geo:` conversion machine.
//!
//! ```text
//! ReceivedIntent / ReceivedUriString
//!   -> ReceivedUrlString -> ReceivedUrl
//!   -> [short link: permission -> GrantedUnshortenPermission] -> UnshortenedUrl
//!   -> [no coordinates: permission -> GrantedParseHtmlPermission]
//!   -> Succeeded | Failed
//! ```
//!
//! `GrantedParseHtmlPermission` loops back to `ReceivedUrl` when the fetched
//! page is a Google Search result that points at a Maps URL.

use geoshare_core::{PermissionDecision, PreferencesStore, CONNECTION_PERMISSION_KEY};
use reqwest::Url;

use super::{StateContext, Transition};
use crate::error::{ConversionError, FailureReason};
use crate::geo_uri::GeoUri;
use crate::google_maps::GoogleMapsConverter;
use crate::intent::{get_geo_uri, get_url_string, has_geo_scheme, IntentEvent};
use crate::network::Network;
use crate::quote::{PercentQuote, UriQuote};

/// Collaborators consulted by [`ConversionState`] transitions.
#[derive(Debug)]
pub struct ConversionDeps<N, P, Q: UriQuote = PercentQuote> {
    pub network: N,
    pub preferences: P,
    pub converter: GoogleMapsConverter<Q>,
}

impl<N, P> ConversionDeps<N, P> {
    pub fn new(network: N, preferences: P) -> Self {
        Self {
            network,
            preferences,
            converter: GoogleMapsConverter::default(),
        }
    }
}

pub type ConversionContext<N, P, Q = PercentQuote> =
    StateContext<ConversionState, ConversionDeps<N, P, Q>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    Initial,
    ReceivedIntent {
        intent: IntentEvent,
    },
    ReceivedUriString {
        input: String,
    },
    ReceivedUrlString {
        url_string: String,
        permission: Option<PermissionDecision>,
    },
    ReceivedUrl {
        url: Url,
        permission: Option<PermissionDecision>,
    },
    /// Waits for [`ConversionContext::grant`] or [`ConversionContext::deny`].
    RequestedUnshortenPermission {
        url: Url,
    },
    GrantedUnshortenPermission {
        url: Url,
    },
    DeniedUnshortenPermission,
    UnshortenedUrl {
        url: Url,
        permission: Option<PermissionDecision>,
    },
    /// Waits for [`ConversionContext::grant`] or [`ConversionContext::deny`].
    RequestedParseHtmlPermission {
        url: Url,
        geo_uri: GeoUri,
    },
    GrantedParseHtmlPermission {
        url: Url,
        geo_uri: GeoUri,
    },
    DeniedParseHtmlPermission {
        geo_uri: GeoUri,
    },
    Succeeded {
        geo_uri: String,
        /// The input already was a `geo:` URI.
        unchanged: bool,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ConversionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Answers a pending permission request with "yes".
    ///
    /// With `do_not_ask`, [`PermissionDecision::Always`] is stored. Returns
    /// `None` if this state is not waiting for permission.
    pub fn grant<P: PreferencesStore>(&self, do_not_ask: bool, preferences: &P) -> Option<Self> {
        let next = match self {
            Self::RequestedUnshortenPermission { url } => {
                Self::GrantedUnshortenPermission { url: url.clone() }
            }
            Self::RequestedParseHtmlPermission { url, geo_uri } => {
                Self::GrantedParseHtmlPermission {
                    url: url.clone(),
                    geo_uri: geo_uri.clone(),
                }
            }
            _ => return None,
        };
        if do_not_ask {
            preferences.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Always);
        }
        Some(next)
    }

    /// Answers a pending permission request with "no".
    ///
    /// With `do_not_ask`, [`PermissionDecision::Never`] is stored. Returns
    /// `None` if this state is not waiting for permission.
    pub fn deny<P: PreferencesStore>(&self, do_not_ask: bool, preferences: &P) -> Option<Self> {
        let next = match self {
            Self::RequestedUnshortenPermission { .. } => Self::DeniedUnshortenPermission,
            Self::RequestedParseHtmlPermission { geo_uri, .. } => {
                Self::DeniedParseHtmlPermission {
                    geo_uri: geo_uri.clone(),
                }
            }
            _ => return None,
        };
        if do_not_ask {
            preferences.set(CONNECTION_PERMISSION_KEY, PermissionDecision::Never);
        }
        Some(next)
    }
}

impl<N, P, Q> Transition<ConversionDeps<N, P, Q>> for ConversionState
where
    N: Network,
    P: PreferencesStore,
    Q: UriQuote + Clone,
{
    #[allow(clippy::too_many_lines)]
    async fn transition(&self, deps: &ConversionDeps<N, P, Q>) -> Option<Self> {
        match self {
            Self::Initial
            | Self::RequestedUnshortenPermission { .. }
            | Self::RequestedParseHtmlPermission { .. }
            | Self::Succeeded { .. }
            | Self::Failed { .. } => None,

            Self::ReceivedIntent { intent } => Some(if let Some(geo_uri) = get_geo_uri(intent) {
                Self::Succeeded {
                    geo_uri,
                    unchanged: true,
                }
            } else if let Some(url_string) = get_url_string(intent) {
                Self::ReceivedUrlString {
                    url_string,
                    permission: None,
                }
            } else {
                Self::Failed {
                    reason: FailureReason::NoUrl,
                }
            }),

            Self::ReceivedUriString { input } => Some(if has_geo_scheme(input) {
                Self::Succeeded {
                    geo_uri: input.clone(),
                    unchanged: true,
                }
            } else {
                Self::ReceivedUrlString {
                    url_string: input.clone(),
                    permission: None,
                }
            }),

            Self::ReceivedUrlString {
                url_string,
                permission,
            } => Some(match normalize_url(url_string) {
                Some(url) => Self::ReceivedUrl {
                    url,
                    permission: *permission,
                },
                None => {
                    tracing::debug!(url_string = %url_string, "input is not a valid URL");
                    Self::Failed {
                        reason: FailureReason::InvalidUrl,
                    }
                }
            }),

            Self::ReceivedUrl { url, permission } => {
                if !deps.converter.is_short_url(url) {
                    return Some(Self::UnshortenedUrl {
                        url: url.clone(),
                        permission: *permission,
                    });
                }
                Some(match resolve_permission(*permission, &deps.preferences) {
                    PermissionDecision::Always => {
                        Self::GrantedUnshortenPermission { url: url.clone() }
                    }
                    PermissionDecision::Ask => {
                        Self::RequestedUnshortenPermission { url: url.clone() }
                    }
                    PermissionDecision::Never => Self::DeniedUnshortenPermission,
                })
            }

            Self::GrantedUnshortenPermission { url } => {
                Some(match deps.network.head_lookup(url).await {
                    Ok(target) => Self::UnshortenedUrl {
                        url: target,
                        permission: Some(PermissionDecision::Always),
                    },
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "could not resolve short link");
                        Self::Failed {
                            reason: FailureReason::UnshortenFailed,
                        }
                    }
                })
            }

            Self::DeniedUnshortenPermission => Some(Self::Failed {
                reason: FailureReason::PermissionDenied,
            }),

            Self::UnshortenedUrl { url, permission } => {
                let geo_uri = match deps.converter.parse_url(url) {
                    Ok(geo_uri) => geo_uri,
                    Err(e) => {
                        tracing::debug!(url = %url, error = %e, "URL did not parse");
                        return Some(Self::Failed {
                            reason: FailureReason::ParseUrlFailed,
                        });
                    }
                };
                if geo_uri.has_coordinates() {
                    return Some(Self::Succeeded {
                        geo_uri: geo_uri.to_string(),
                        unchanged: false,
                    });
                }
                let url = url.clone();
                Some(match resolve_permission(*permission, &deps.preferences) {
                    PermissionDecision::Always => {
                        Self::GrantedParseHtmlPermission { url, geo_uri }
                    }
                    PermissionDecision::Ask => Self::RequestedParseHtmlPermission { url, geo_uri },
                    PermissionDecision::Never => Self::DeniedParseHtmlPermission { geo_uri },
                })
            }

            Self::GrantedParseHtmlPermission { url, geo_uri } => {
                let html = match deps.network.fetch_body(url).await {
                    Ok(html) => html,
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "could not fetch map page");
                        return Some(Self::Failed {
                            reason: FailureReason::FetchHtmlFailed,
                        });
                    }
                };
                if let Ok(from_html) = deps.converter.parse_html(&html) {
                    return Some(Self::Succeeded {
                        geo_uri: from_html.to_string(),
                        unchanged: false,
                    });
                }
                if let Ok(redirect) = deps.converter.parse_google_search_html(&html) {
                    tracing::debug!(url = %url, redirect = %redirect, "following search result");
                    return Some(Self::ReceivedUrl {
                        url: redirect,
                        permission: Some(PermissionDecision::Always),
                    });
                }
                tracing::debug!(url = %url, "page has no coordinates; using URL result");
                Some(Self::Succeeded {
                    geo_uri: geo_uri.to_string(),
                    unchanged: false,
                })
            }

            Self::DeniedParseHtmlPermission { geo_uri } => Some(Self::Succeeded {
                geo_uri: geo_uri.to_string(),
                unchanged: false,
            }),
        }
    }
}

impl<N, P, Q> StateContext<ConversionState, ConversionDeps<N, P, Q>>
where
    N: Network,
    P: PreferencesStore,
    Q: UriQuote + Clone,
{
    /// Grants the pending permission and resumes the conversion.
    ///
    /// Does nothing but resume if no permission is pending.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn grant(&mut self, do_not_ask: bool) -> Result<&ConversionState, ConversionError> {
        if let Some(next) = self.current.grant(do_not_ask, &self.deps.preferences) {
            self.set_state(next);
        }
        self.transition().await
    }

    /// Denies the pending permission and resumes the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn deny(&mut self, do_not_ask: bool) -> Result<&ConversionState, ConversionError> {
        if let Some(next) = self.current.deny(do_not_ask, &self.deps.preferences) {
            self.set_state(next);
        }
        self.transition().await
    }
}

fn resolve_permission<P: PreferencesStore>(
    explicit: Option<PermissionDecision>,
    preferences: &P,
) -> PermissionDecision {
    explicit.unwrap_or_else(|| preferences.get(CONNECTION_PERMISSION_KEY))
}

/// Parses user input as a URL, adding `https:` to scheme-less or
/// protocol-relative input.
fn normalize_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("//") {
        return Url::parse(&format!("https:{trimmed}")).ok();
    }
    match Url::parse(trimmed) {
        Ok(url) => Some(url),
        Err(_) if !has_scheme(trimmed) => Url::parse(&format!("https://{trimmed}")).ok(),
        Err(_) => None,
    }
}

/// Whether `://` appears before the first path, query or fragment delimiter.
fn has_scheme(input: &str) -> bool {
    let authority_end = input.find(['/', '?', '#']).unwrap_or(input.len());
    input.find("://").is_some_and(|i| i < authority_end)
}

#[cfg(test)]
#[path = "conversion_test.rs"]
mod tests;
