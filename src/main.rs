use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use binwatch::api::ApiClient;
use binwatch::config;
use binwatch::poller::Poller;
use binwatch::session::Session;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let client = ApiClient::new(cfg.base_url()?)?;

    if let Some(auth) = &cfg.auth {
        match client.login(&auth.email, &auth.password).await {
            Ok(res) => info!(user = %res.user.username, "{}", res.message),
            // the dashboard endpoint may still be public, keep going
            Err(err) => warn!(error = %err.user_message(), "login failed"),
        }
    }

    let poller = Poller::new(Arc::new(client.clone()), cfg.poll_period()).start();
    let mut session = Session::new(cfg.alerts.critical_percent);

    info!(base_url = %client.base_url(), "monitoring bins; press Ctrl-C to stop");
    session
        .run(poller.subscribe(), async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(?err, "failed to listen for Ctrl-C");
            }
        })
        .await;

    poller.shutdown().await;

    if cfg.auth.is_some() {
        if let Err(err) = client.logout().await {
            warn!(error = %err.user_message(), "logout failed");
        }
    }

    info!(
        alerts = session.notifications().len(),
        unread = session.notifications().unread_count(),
        "stopped"
    );
    Ok(())
}
