//! Command routing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitedeploy_deploy::{DeployEvent, Deployer};
use sitedeploy_hosting::HttpHostingClient;
use tokio::sync::mpsc;

use crate::config::Config;

/// Publish static sites as versioned hosting releases.
#[derive(Debug, Parser)]
#[command(name = "sitedeploy", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deploy the public directory and release it
    Deploy {
        /// Path to the TOML config file
        #[arg(long)]
        config: PathBuf,
        /// Release message, overriding the config
        #[arg(long)]
        message: Option<String>,
    },
    /// Re-release the version that was live before the current one
    Rollback {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        message: Option<String>,
    },
    /// List the site's releases, newest first
    Releases {
        #[arg(long)]
        config: PathBuf,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Deploy { config, message } => {
            let config = Config::load(&config)?;
            let mut deployer = deployer(&config)?;
            let message = message.or_else(|| config.message.clone());

            if let Some(events) = deployer.take_events() {
                tokio::spawn(log_events(events));
            }
            let cancel = deployer.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping after in-flight uploads");
                    cancel.cancel();
                }
            });

            tracing::info!(
                command = "deploy",
                site = %config.site_id,
                dir = %config.public_dir.display(),
                "starting deploy"
            );
            let result = deployer
                .deploy_dir(
                    &config.site_id,
                    &config.public_dir,
                    config.serving_config(),
                    message.as_deref(),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Rollback { config, message } => {
            let config = Config::load(&config)?;
            let release = deployer(&config)?
                .rollback(&config.site_id, message.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&release)?);
            Ok(())
        }
        Commands::Releases { config } => {
            let config = Config::load(&config)?;
            let releases = deployer(&config)?.list_releases(&config.site_id).await?;
            println!("{}", serde_json::to_string_pretty(&releases)?);
            Ok(())
        }
    }
}

fn deployer(config: &Config) -> anyhow::Result<Deployer> {
    let token = config.token()?;
    let client = HttpHostingClient::new(&token, config.client.clone())
        .context("building hosting client")?;
    Ok(Deployer::new(Arc::new(client), config.deploy.clone()))
}

async fn log_events(mut events: mpsc::Receiver<DeployEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            DeployEvent::UploadProgress { done, total } => {
                tracing::debug!(done, total, "upload progress");
            }
            DeployEvent::UploadRetry {
                path,
                attempt,
                delay,
                ..
            } => {
                tracing::debug!(
                    %path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retry scheduled"
                );
            }
            other => tracing::debug!(event = ?other, "deploy event"),
        }
    }
}
