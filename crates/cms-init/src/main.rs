use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cms_init::config::Config;
use cms_init::manifest::Manifest;
use cms_init::seeder::{self, Seeder};
use cms_init::signals;
use cms_init::store::PgStore;

#[derive(Parser)]
#[command(
    name = "cms-init",
    about = "Initialize the hostel CMS database: admin account, default permissions, baseline records",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full seeding sequence against the configured database
    Init,
    /// Check database connectivity and report the admin account count
    Health,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.validate()?;

    let store = PgStore::connect_lazy(&config.database_url, config.max_connections)?;

    match cli.command {
        Command::Init => run_init(store, &config).await,
        Command::Health => run_health(store).await,
    }
}

async fn run_init(store: PgStore, config: &Config) -> anyhow::Result<()> {
    let manifest = Manifest::baseline(config.admin.clone());
    let seeder = Seeder::new(store);

    let mut run = tokio::spawn(async move { seeder.run(&manifest).await });
    let report = tokio::select! {
        report = &mut run => report?,
        _ = signals::shutdown_signal() => {
            warn!(
                "shutdown requested, letting the in-flight run finish within {:?}",
                signals::SHUTDOWN_GRACE
            );
            match tokio::time::timeout(signals::SHUTDOWN_GRACE, &mut run).await {
                Ok(report) => report?,
                Err(_) => {
                    run.abort();
                    anyhow::bail!("shutdown grace period elapsed before the run finished");
                }
            }
        }
    };

    info!(
        "Seed run finished: {} created, {} skipped, {} failed",
        report.created(),
        report.skipped(),
        report.failed()
    );
    if report.aborted() {
        anyhow::bail!("initialization aborted: a required step failed");
    }
    Ok(())
}

async fn run_health(store: PgStore) -> anyhow::Result<()> {
    let admins = seeder::health_check(&store)
        .await
        .context("health check failed")?;
    info!("database: ok");
    info!("admin accounts: {admins}");
    Ok(())
}
