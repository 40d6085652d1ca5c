mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Args;
use janitor_core::impls::{
    CommandCleanup, DryRunCleanup, HttpLeaseClient, InMemoryLeaseAuthority,
};
use janitor_core::ports::{CleanupExecutor, LeaseClient};
use janitor_core::{Janitor, JanitorConfig, JanitorError};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// lease authority client: HTTP（本番）か in-memory（dry run）
fn lease_client(
    config: &JanitorConfig,
    dry_run: Option<&[String]>,
) -> Result<Arc<dyn LeaseClient>, JanitorError> {
    if let Some(names) = dry_run {
        let authority =
            InMemoryLeaseAuthority::with_dirty(&config.resource_type, names.iter().cloned());
        info!(resources = names.len(), "dry run: using in-memory lease authority");
        return Ok(Arc::new(authority.client(config.lease.owner.clone())));
    }

    let client = HttpLeaseClient::new(
        config.lease.url.clone(),
        config.lease.owner.clone(),
        config.timeouts.acquire.max(config.timeouts.release),
    )?;
    info!(url = %config.lease.url, owner = %config.lease.owner, "initialized lease client");
    Ok(Arc::new(client))
}

/// cleanup program（dry run では実行しない）
fn cleanup_executor(config: &JanitorConfig, dry_run: bool) -> Arc<dyn CleanupExecutor> {
    if dry_run {
        return Arc::new(DryRunCleanup::new());
    }
    Arc::new(
        CommandCleanup::new(config.cleanup.program.clone())
            .with_args(config.cleanup.args.iter().cloned())
            .with_hour(config.cleanup.hour),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = args.resolve_config().context("loading configuration")?;
    let lease = lease_client(&config, args.dry_run.as_deref())?;
    let cleanup = cleanup_executor(&config, args.dry_run.is_some());

    if args.run_once() {
        let (report, stats) = Janitor::run_once(&config, lease, cleanup).await?;
        info!(cycle = report.cycle, acquired = report.acquired, stop = ?report.stop, "cycle done");
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let janitor = Janitor::start(&config, lease, cleanup)?;
    shutdown_signal().await;
    info!("shutdown requested, draining in-flight resources");
    let stats = janitor.shutdown_and_join().await;
    info!(
        acquired = stats.acquired,
        released = stats.released(),
        release_failures = stats.release_failures,
        "bye"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_never_starts_the_cleanup_program() {
        let mut config = JanitorConfig::default();
        config.cleanup.program = "/nonexistent/janitor.py".into();
        let names = vec!["p1".to_string(), "p2".to_string()];

        let lease = lease_client(&config, Some(names.as_slice())).unwrap();
        let cleanup = cleanup_executor(&config, true);
        let (report, stats) = Janitor::run_once(&config, lease, cleanup).await.unwrap();

        // a spawned program would fail and release both dirty
        assert_eq!(report.acquired, 2);
        assert_eq!(stats.cleanup_failures, 0);
        assert_eq!(stats.released_free, 2);
    }
}
