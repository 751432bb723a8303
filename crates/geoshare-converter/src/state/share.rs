//! Delivery of a finished `geo:` URI to another app or the clipboard.
//!
//! Sharing may need the platform's background-activity permission. When it
//! is missing the machine pauses; granting opens the platform editor and the
//! machine re-checks once the editor closes.

use thiserror::Error;

use super::{StateContext, Transition};
use crate::error::ConversionError;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Platform permission queries for starting other apps.
pub trait PlatformPermissions {
    fn is_background_activity_allowed(&self) -> bool;

    /// Opens the system permission editor. Returns `false` if it could not
    /// be shown.
    fn open_permission_editor(&self) -> bool;
}

/// Destination for a finished `geo:` URI.
pub trait ResultSink {
    /// # Errors
    ///
    /// Returns [`SinkError`] if the URI could not be handed over.
    fn deliver(&self, geo_uri: &str) -> Result<(), SinkError>;
}

impl<T: ResultSink + ?Sized> ResultSink for &T {
    fn deliver(&self, geo_uri: &str) -> Result<(), SinkError> {
        (**self).deliver(geo_uri)
    }
}

#[derive(Debug)]
pub struct ShareDeps<P, S, C> {
    pub platform: P,
    pub share: S,
    pub clipboard: C,
}

pub type ShareContext<P, S, C> = StateContext<ShareState, ShareDeps<P, S, C>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareState {
    AcceptedSharing { geo_uri: String },
    /// Waits for [`ShareContext::grant`] or [`ShareContext::deny`].
    RequestedSharePermission { geo_uri: String },
    /// Waits for [`ShareContext::editor_closed`].
    ShowedSharePermissionEditor { geo_uri: String },
    GrantedSharePermission { geo_uri: String },
    DeniedSharePermission,
    SharingSucceeded,
    SharingFailed { reason: String },
    AcceptedCopying { geo_uri: String },
    CopyingFinished,
    CopyingFailed { reason: String },
}

impl ShareState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SharingSucceeded
                | Self::SharingFailed { .. }
                | Self::CopyingFinished
                | Self::CopyingFailed { .. }
        )
    }
}

impl<P, S, C> Transition<ShareDeps<P, S, C>> for ShareState
where
    P: PlatformPermissions,
    S: ResultSink,
    C: ResultSink,
{
    async fn transition(&self, deps: &ShareDeps<P, S, C>) -> Option<Self> {
        match self {
            Self::RequestedSharePermission { .. }
            | Self::ShowedSharePermissionEditor { .. }
            | Self::SharingSucceeded
            | Self::SharingFailed { .. }
            | Self::CopyingFinished
            | Self::CopyingFailed { .. } => None,

            Self::AcceptedSharing { geo_uri } => Some(
                if deps.platform.is_background_activity_allowed() {
                    Self::GrantedSharePermission {
                        geo_uri: geo_uri.clone(),
                    }
                } else {
                    Self::RequestedSharePermission {
                        geo_uri: geo_uri.clone(),
                    }
                },
            ),

            Self::GrantedSharePermission { geo_uri } => Some(match deps.share.deliver(geo_uri) {
                Ok(()) => Self::SharingSucceeded,
                Err(e) => {
                    tracing::warn!(error = %e, "could not share geo URI");
                    Self::SharingFailed {
                        reason: e.to_string(),
                    }
                }
            }),

            Self::DeniedSharePermission => Some(Self::SharingFailed {
                reason: "share permission denied".to_owned(),
            }),

            Self::AcceptedCopying { geo_uri } => Some(match deps.clipboard.deliver(geo_uri) {
                Ok(()) => Self::CopyingFinished,
                Err(e) => {
                    tracing::warn!(error = %e, "could not copy geo URI");
                    Self::CopyingFailed {
                        reason: e.to_string(),
                    }
                }
            }),
        }
    }
}

impl<P, S, C> StateContext<ShareState, ShareDeps<P, S, C>>
where
    P: PlatformPermissions,
    S: ResultSink,
    C: ResultSink,
{
    /// Answers a pending share permission request with "yes".
    ///
    /// Opens the platform editor; if it cannot be shown, sharing is
    /// attempted anyway.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn grant(&mut self) -> Result<&ShareState, ConversionError> {
        if let ShareState::RequestedSharePermission { geo_uri } = &self.current {
            let geo_uri = geo_uri.clone();
            let next = if self.deps.platform.open_permission_editor() {
                ShareState::ShowedSharePermissionEditor { geo_uri }
            } else {
                ShareState::GrantedSharePermission { geo_uri }
            };
            self.set_state(next);
        }
        self.transition().await
    }

    /// Answers a pending share permission request with "no".
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn deny(&mut self) -> Result<&ShareState, ConversionError> {
        if matches!(self.current, ShareState::RequestedSharePermission { .. }) {
            self.set_state(ShareState::DeniedSharePermission);
        }
        self.transition().await
    }

    /// Re-checks the permission after the platform editor was closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::IterationLimitExceeded`] on a transition
    /// cycle.
    pub async fn editor_closed(&mut self) -> Result<&ShareState, ConversionError> {
        if let ShareState::ShowedSharePermissionEditor { geo_uri } = &self.current {
            let geo_uri = geo_uri.clone();
            self.set_state(ShareState::AcceptedSharing { geo_uri });
        }
        self.transition().await
    }
}
