mod convert;
mod sinks;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use geoshare_converter::HttpNetwork;
use geoshare_core::{
    MemoryPreferences, PermissionDecision, PreferencesStore, YamlPreferences,
    CONNECTION_PERMISSION_KEY,
};
use tracing_subscriber::EnvFilter;

use crate::convert::{convert_with, render_outcome, LinePrompt};
use crate::sinks::{copy_to_file, share_with, StdoutSink};

#[derive(Debug, Parser)]
#[command(name = "geoshare")]
#[command(about = "Convert Google Maps links into geo: URIs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a Maps URL, a geo: URI, or text containing a URL
    Convert {
        input: String,
        /// Connection permission for this run only (always, ask, never)
        #[arg(long)]
        permission: Option<PermissionDecision>,
        /// Print a JSON object instead of the bare URI
        #[arg(long)]
        json: bool,
        /// Also write the URI to this file
        #[arg(long, value_name = "FILE")]
        copy: Option<PathBuf>,
        /// Hand the URI on through the share flow instead of printing it
        #[arg(long, conflicts_with = "json")]
        share: bool,
    },
    /// Show or set the stored connection permission
    Permission { value: Option<PermissionDecision> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = geoshare_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            input,
            permission,
            json,
            copy,
            share,
        } => {
            let network = HttpNetwork::from_config(&config)?;
            let mut prompt = LinePrompt::new(std::io::stdin().lock(), std::io::stderr());
            let state = match permission {
                Some(decision) => {
                    let preferences =
                        MemoryPreferences::with_value(CONNECTION_PERMISSION_KEY, decision);
                    convert_with(network, preferences, &input, &mut prompt).await?
                }
                None => {
                    let preferences = YamlPreferences::open(&config.preferences_path)?;
                    convert_with(network, preferences, &input, &mut prompt).await?
                }
            };

            let (geo_uri, output) = render_outcome(&state, json)?;
            if let Some(path) = copy {
                copy_to_file(&geo_uri, &path).await?;
            }
            if share {
                share_with(&geo_uri, &StdoutSink).await?;
            } else {
                println!("{output}");
            }
        }
        Commands::Permission { value } => {
            let preferences = YamlPreferences::open(&config.preferences_path)?;
            if let Some(decision) = value {
                preferences.set(CONNECTION_PERMISSION_KEY, decision);
                tracing::info!(
                    path = %preferences.path().display(),
                    decision = %decision,
                    "stored connection permission"
                );
            }
            println!("{}", preferences.get(CONNECTION_PERMISSION_KEY));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
