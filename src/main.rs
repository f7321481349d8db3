// src/main.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::{env, path::PathBuf, time::Instant};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use xml2pdf::{
    aggregate,
    config::Config,
    fetch,
    parse,
    render::{DocumentRenderer, PdfRenderer},
    Event,
};

const DEFAULT_CONFIG: &str = "xml2pdf.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    let start = Instant::now();

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = Config::load(&config_path)?;
    let widths = config.column_widths()?;
    info!(config = %config_path.display(), tables = config.tables.len(), "config loaded");

    // ─── 3) fetch the feed ───────────────────────────────────────────
    let feed_path = match &config.source.url {
        Some(url) => {
            info!(%url, "downloading feed");
            fetch::download_feed(&Client::new(), url, &config.source.path).await?
        }
        None => {
            info!(path = %config.source.path.display(), "using local feed");
            config.source.path.clone()
        }
    };

    // ─── 4) parse records and build events ───────────────────────────
    let records = parse::load_records(&feed_path)
        .with_context(|| format!("parsing feed {:?}", feed_path))?;
    let mut events = records
        .into_iter()
        .map(|record| Event::with_widths(record, widths))
        .collect::<xml2pdf::Result<Vec<_>>>()?;
    if events.is_empty() {
        warn!("no events in feed; the document will only contain the title");
    }
    info!(events = events.len(), "events built");

    // ─── 5) aggregate into tables and render ─────────────────────────
    let tables = aggregate(&config.tables, &mut events)?;
    let renderer = match &config.title {
        Some(title) => PdfRenderer::new().with_title(title),
        None => PdfRenderer::new(),
    };
    renderer
        .render(&tables, &config.output)
        .with_context(|| format!("rendering {:?}", config.output))?;

    info!(output = %config.output.display(), elapsed = ?start.elapsed(), "done");
    Ok(())
}
