use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use newsview::api::NewsApiClient;
use newsview::config;
use newsview::page::{self, PageMeta};
use newsview::session::{ArticleView, ViewContext, ViewError};
use newsview::store::SqliteStore;
use newsview::telemetry::HttpBeacon;

#[derive(Debug, Parser)]
#[command(author, version, about = "Fetch articles and render them to standalone HTML pages.")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output directory; defaults to `{data_dir}/html`
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Articles fetched at the same time
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    /// Article ids to render
    #[arg(required = true)]
    ids: Vec<String>,
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

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| Path::new(&cfg.resolved_data_dir()).join("html"));

    let store = SqliteStore::connect(&cfg.database_url())
        .await
        .context("failed to open local store")?;
    let client = NewsApiClient::from_config(&cfg)?;
    let ctx = ViewContext {
        api: Arc::new(client.clone()),
        store: Arc::new(store),
        beacon: Arc::new(HttpBeacon::current(client)),
        config: cfg,
    };

    let results: Vec<(String, Result<()>)> = stream::iter(args.ids.iter().cloned())
        .map(|id| {
            let ctx = &ctx;
            let out_dir = &out_dir;
            async move {
                let res = render_one(ctx, &id, out_dir).await;
                (id, res)
            }
        })
        .buffered(args.jobs.max(1))
        .collect()
        .await;

    let mut failed = 0;
    for (id, res) in results {
        if let Err(err) = res {
            failed += 1;
            error!(?err, id = %id, "article not rendered");
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} articles failed", failed, args.ids.len());
    }
    Ok(())
}

async fn render_one(ctx: &ViewContext, id: &str, out_dir: &Path) -> Result<()> {
    let mut view = match ArticleView::mount(ctx, id).await {
        Ok(view) => view,
        Err(ViewError::NotFound(id)) => {
            println!("{}: not found", id);
            return Err(ViewError::NotFound(id).into());
        }
        Err(err) => return Err(err.into()),
    };

    let meta = PageMeta {
        reading_minutes: view.reading_minutes(),
        is_new: view.is_new(),
    };
    let path = page::write_page(out_dir, view.article(), view.rendered(), meta).await?;

    println!("================================");
    println!("{} ({})", view.article().title, view.article().id);
    println!("  format:        {}", view.rendered().format.as_str());
    println!("  reading time:  {} min", view.reading_minutes());
    println!("  reader:        {}", view.identity().id());
    for entry in &view.rendered().toc {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        println!("  {}- {} (#{})", indent, entry.title, entry.id);
    }
    for related in view.related().await {
        println!("  related:       {} ({})", related.title, related.id);
    }
    println!("  page:          {}", path.display());

    view.teardown().drained().await;
    info!(id, "article rendered");
    Ok(())
}
