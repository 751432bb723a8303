//! Terminal stand-ins for the platform share and clipboard targets.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use geoshare_converter::{
    PlatformPermissions, ResultSink, ShareDeps, ShareState, SinkError, StateContext,
};

/// A terminal may always hand results on, and has no permission editor.
pub(crate) struct TerminalPlatform;

impl PlatformPermissions for TerminalPlatform {
    fn is_background_activity_allowed(&self) -> bool {
        true
    }

    fn open_permission_editor(&self) -> bool {
        false
    }
}

/// Shares by writing the URI to standard output for the next program in a
/// pipeline.
pub(crate) struct StdoutSink;

impl ResultSink for StdoutSink {
    fn deliver(&self, geo_uri: &str) -> Result<(), SinkError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{geo_uri}")?;
        Ok(())
    }
}

/// Writes the URI, newline-terminated, replacing the file's contents.
pub(crate) struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ResultSink for FileSink {
    fn deliver(&self, geo_uri: &str) -> Result<(), SinkError> {
        std::fs::write(&self.path, format!("{geo_uri}\n"))?;
        Ok(())
    }
}

/// Runs one delivery flow with `sink` as both the share and clipboard target.
async fn deliver<S: ResultSink>(sink: &S, start: ShareState) -> anyhow::Result<ShareState> {
    let deps = ShareDeps {
        platform: TerminalPlatform,
        share: sink,
        clipboard: sink,
    };
    let mut ctx = StateContext::new(deps, ShareState::CopyingFinished);
    Ok(ctx.start(start).await?.clone())
}

/// Runs the share flow, handing the URI to `sink`.
pub(crate) async fn share_with<S: ResultSink>(geo_uri: &str, sink: &S) -> anyhow::Result<()> {
    let state = deliver(
        sink,
        ShareState::AcceptedSharing {
            geo_uri: geo_uri.to_owned(),
        },
    )
    .await?;

    match state {
        ShareState::SharingSucceeded => Ok(()),
        ShareState::SharingFailed { reason } => bail!("could not share: {reason}"),
        other => bail!("sharing stopped before finishing: {other:?}"),
    }
}

/// Runs the copy flow with `path` as the clipboard.
pub(crate) async fn copy_to_file(geo_uri: &str, path: &Path) -> anyhow::Result<()> {
    let state = deliver(
        &FileSink::new(path),
        ShareState::AcceptedCopying {
            geo_uri: geo_uri.to_owned(),
        },
    )
    .await?;

    match state {
        ShareState::CopyingFinished => {
            tracing::debug!(path = %path.display(), "copied geo URI");
            Ok(())
        }
        ShareState::CopyingFailed { reason } => {
            bail!("could not copy to {}: {reason}", path.display())
        }
        other => bail!("copy stopped before finishing: {other:?}"),
    }
}
