use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use newsview::config;
use newsview::store::{self, SqliteStore};

#[derive(Debug, Parser)]
#[command(about = "List or forget the interaction snapshots kept in the local store.")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Article ids whose snapshots should be removed
    #[arg(long, num_args = 1..)]
    forget: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let kv = SqliteStore::connect(&cfg.database_url())
        .await
        .context("failed to open local store")?;

    for id in &args.forget {
        store::forget_snapshot(&kv, id)
            .await
            .with_context(|| format!("failed to forget {}", id))?;
        info!(article_id = %id, "snapshot removed");
    }

    let snapshots = kv.snapshots().await?;
    if snapshots.is_empty() {
        println!("No interaction snapshots stored.");
        return Ok(());
    }
    for snap in snapshots {
        let s = &snap.state;
        println!(
            "{}  liked={} saved={} likes={} saves={} shares={}  updated {}",
            snap.article_id,
            s.liked,
            s.saved,
            s.likes_count,
            s.saves_count,
            s.shares_count,
            snap.updated_at
        );
    }
    Ok(())
}
