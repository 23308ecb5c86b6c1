//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap
//! and runs the upload/download commands against a configured endpoint.

use crate::blob::{create_transfer_client, AccessMode, DownloadRequest, UploadRequest};
use crate::config::Config;
use crate::error::{BlobRelayError, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

#[derive(Parser)]
#[command(name = "blobrelay")]
#[command(about = "Upload and download blobs through a mobile backend or blob storage")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Base URL of the service (overrides config and BLOBRELAY_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Obtain a SAS URI from the resource broker before each transfer
    #[arg(long, global = true)]
    pub brokered: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a file (or stdin) as a blob
    Upload {
        /// Container name
        #[arg(short, long)]
        container: String,

        /// Blob name
        #[arg(short, long)]
        name: String,

        /// File to upload; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Diagnostic tag attached to the request
        #[arg(long, default_value = "")]
        api_name: String,
    },
    /// Download a blob to a file (or stdout)
    Download {
        /// Container name
        #[arg(short, long)]
        container: String,

        /// Blob name
        #[arg(short, long)]
        name: String,

        /// Output file; writes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Diagnostic tag attached to the request
        #[arg(long, default_value = "")]
        api_name: String,
    },
}

impl Cli {
    /// Apply command-line overrides on top of file and environment configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.debug {
            config.debug = true;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.brokered {
            config.access = AccessMode::Brokered;
        }
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        match self.command {
            Commands::Upload {
                container,
                name,
                file,
                api_name,
            } => execute_upload(&config, container, name, file, api_name, self.json).await,
            Commands::Download {
                container,
                name,
                output,
                api_name,
            } => execute_download(&config, container, name, output, api_name, self.json).await,
        }
    }
}

async fn execute_upload(
    config: &Config,
    container: String,
    name: String,
    file: Option<PathBuf>,
    api_name: String,
    json: bool,
) -> Result<()> {
    let contents = match &file {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buffer = Vec::new();
            tokio::io::stdin().read_to_end(&mut buffer).await?;
            buffer
        }
    };
    debug!("Read {} bytes for upload", contents.len());

    let client = create_transfer_client(config)?;
    let spinner = start_spinner(format!("Uploading {container}/{name}"));
    let result = client
        .spawn_upload(UploadRequest::new(name, container, contents, api_name))
        .await;
    finish_spinner(spinner);

    let location = result?;
    if json {
        let output = serde_json::json!({ "location": location });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{location}");
    }
    Ok(())
}

async fn execute_download(
    config: &Config,
    container: String,
    name: String,
    output: Option<PathBuf>,
    api_name: String,
    json: bool,
) -> Result<()> {
    let client = create_transfer_client(config)?;
    let spinner = start_spinner(format!("Downloading {container}/{name}"));
    let result = client
        .spawn_download(DownloadRequest::new(name.clone(), container.clone(), api_name))
        .await;
    finish_spinner(spinner);

    let contents = result?;
    match &output {
        Some(path) => {
            tokio::fs::write(path, &contents).await?;
            if json {
                let summary = serde_json::json!({
                    "container": container,
                    "name": name,
                    "bytes": contents.len(),
                    "path": path.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                eprintln!("Saved {} bytes to {}", contents.len(), path.display());
            }
        }
        None => {
            if json {
                return Err(BlobRelayError::invalid_argument(
                    "--json requires --output when downloading",
                ));
            }
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&contents).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

fn start_spinner(message: String) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
