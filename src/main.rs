use std::sync::Arc;

use rootcause::prelude::ResultExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{Config, IpSourceKind},
    dyndns::SyncOutcome,
    ip::{DnsIpSource, HttpEchoIpSource, IpSource},
    lookup::{PublicDnsLookup, PublishedLookup},
    provider::cloudflare::CloudflareProvider,
    types::AppState,
};

mod config;
mod domain;
mod dyndns;
mod ip;
mod lookup;
mod provider;
mod resolver;
mod types;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run().await {
        error!(err = %e, "Application error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), rootcause::Report> {
    let config = Config::from_env().context("Loading configuration from the environment")?;
    info!(domain = %config.domain, ttl = config.ttl, ip_source = ?config.ip_source, "Starting DNS sync");

    let ip_source: Arc<dyn IpSource + Send + Sync> = match config.ip_source {
        IpSourceKind::Http => Arc::new(HttpEchoIpSource::new(&config.echo_url)),
        IpSourceKind::Dns => Arc::new(DnsIpSource::new()),
    };
    let published_lookup = config
        .verify_via_dns
        .then(|| Arc::new(PublicDnsLookup::new()) as Arc<dyn PublishedLookup + Send + Sync>);

    let state = AppState {
        dns_provider: Arc::new(CloudflareProvider::new(&config.auth_email, &config.api_key)),
        ip_source,
        published_lookup,
        domain: config.domain.clone(),
        ttl: config.ttl,
    };

    let outcome = dyndns::sync_record(&state)
        .await
        .context("Syncing DNS record")
        .attach(format!("domain: '{}'", config.domain))?;

    match outcome {
        SyncOutcome::Unchanged => info!("Nothing to do"),
        SyncOutcome::Created(id) => info!(record_id = %id, "Done, record created"),
        SyncOutcome::Updated(id) => info!(record_id = %id, "Done, record updated"),
    }

    Ok(())
}
