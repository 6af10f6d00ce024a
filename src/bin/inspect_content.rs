use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use newsview::config;
use newsview::content::{self, FormatPolicy};
use newsview::reading;

#[derive(Debug, Parser)]
#[command(about = "Classify and render a local article body without touching the network.")]
struct Args {
    /// Path to YAML config file; built-in defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// File holding raw article content (JSON blocks, Markdown or text)
    file: PathBuf,

    /// Print the rendered markup
    #[arg(long)]
    html: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let (policy, reading) = match &args.config {
        Some(path) => {
            let cfg = config::load(Some(path))?;
            (FormatPolicy::from_config(&cfg.content), cfg.reading)
        }
        None => (FormatPolicy::default(), config::Reading::default()),
    };

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let resolved = content::resolve(&raw, None, &policy);
    let rendered = content::render(&resolved);

    println!("File: {}", args.file.display());
    println!("Format: {}", rendered.format.as_str());
    println!("Units: {}", rendered.units.len());
    println!("Words: {}", rendered.word_count);
    println!(
        "Reading time: {} min",
        reading::reading_time_minutes(rendered.word_count, reading.words_per_minute)
    );
    if rendered.toc.is_empty() {
        println!("Sections: none");
    } else {
        println!("Sections:");
        for entry in &rendered.toc {
            println!("  h{} {} -> #{}", entry.level, entry.title, entry.id);
        }
    }
    if args.html {
        println!("--------------------------------");
        println!("{}", rendered.html);
    }
    Ok(())
}
