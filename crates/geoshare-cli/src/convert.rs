//! Drives one conversion from the command line.

use std::io::{BufRead, Write};

use anyhow::bail;
use geoshare_converter::intent::has_geo_scheme;
use geoshare_converter::{
    ConversionContext, ConversionDeps, ConversionState, IntentEvent, Network, StateContext,
};
use geoshare_core::PreferencesStore;
use serde::Serialize;

/// A yes/no question answered by the user.
pub(crate) trait Prompt {
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool>;
}

/// Asks on `writer` and reads one answer line from `reader`.
///
/// Only `y` or `yes` count as yes; end of input counts as no.
pub(crate) struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> LinePrompt<R, W> {
    pub(crate) fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        write!(self.writer, "{question} [y/N] ")?;
        self.writer.flush()?;
        let mut answer = String::new();
        self.reader.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

#[derive(Debug, Serialize)]
struct ConvertOutput<'a> {
    geo_uri: &'a str,
    unchanged: bool,
}

/// Maps command-line input to the state a conversion starts from.
///
/// Input containing whitespace is treated as shared text that may carry a
/// URL somewhere inside it.
pub(crate) fn initial_state(input: &str) -> ConversionState {
    let trimmed = input.trim();
    if !has_geo_scheme(trimmed) && trimmed.contains(char::is_whitespace) {
        ConversionState::ReceivedIntent {
            intent: IntentEvent::send_text(trimmed),
        }
    } else {
        ConversionState::ReceivedUriString {
            input: trimmed.to_owned(),
        }
    }
}

pub(crate) async fn convert_with<N, P>(
    network: N,
    preferences: P,
    input: &str,
    prompt: &mut impl Prompt,
) -> anyhow::Result<ConversionState>
where
    N: Network,
    P: PreferencesStore,
{
    let mut ctx = StateContext::new(
        ConversionDeps::new(network, preferences),
        ConversionState::Initial,
    );
    run_conversion(&mut ctx, initial_state(input), prompt).await
}

/// Runs a conversion, answering each permission request through `prompt`.
pub(crate) async fn run_conversion<N, P>(
    ctx: &mut ConversionContext<N, P>,
    initial: ConversionState,
    prompt: &mut impl Prompt,
) -> anyhow::Result<ConversionState>
where
    N: Network,
    P: PreferencesStore,
{
    let mut state = ctx.start(initial).await?.clone();
    loop {
        let question = match &state {
            ConversionState::RequestedUnshortenPermission { url } => {
                format!("Connect to Google to resolve the short link {url}?")
            }
            ConversionState::RequestedParseHtmlPermission { url, .. } => {
                format!("Connect to Google to read the coordinates from {url}?")
            }
            _ => return Ok(state),
        };
        let allow = prompt.confirm(&question)?;
        let remember = prompt.confirm("Remember this choice?")?;
        state = if allow {
            ctx.grant(remember).await?.clone()
        } else {
            ctx.deny(remember).await?.clone()
        };
    }
}

/// Returns the `geo:` URI of a finished conversion and the line to print.
///
/// # Errors
///
/// Fails with the failure reason if the conversion did not succeed.
pub(crate) fn render_outcome(
    state: &ConversionState,
    json: bool,
) -> anyhow::Result<(String, String)> {
    match state {
        ConversionState::Succeeded { geo_uri, unchanged } => {
            let line = if json {
                serde_json::to_string(&ConvertOutput {
                    geo_uri,
                    unchanged: *unchanged,
                })?
            } else {
                geo_uri.clone()
            };
            Ok((geo_uri.clone(), line))
        }
        ConversionState::Failed { reason } => bail!("conversion failed: {reason}"),
        other => bail!("conversion stopped before finishing: {other:?}"),
    }
}
