use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use folio::config::FolioConfig;
use folio::layout::{JustifiedLayout, LayoutCache, ResponsiveLayout};
use folio::models::{flatten_sets, load_sets, select_sets, total_height, MediaRef};
use folio::navigation::GalleryNavigator;
use folio::resolver::{DefaultSource, ImageMetadataResolver, SlotEvent};
use folio::scanner::{FileScanner, ScanConfig, ScanProgress};

const DEFAULT_CONTAINER_WIDTH: u32 = 1200;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Lay out an image portfolio in justified rows")]
struct Cli {
    /// Portfolio JSON file or image directory
    source: PathBuf,

    /// Container width in pixels
    #[arg(default_value_t = DEFAULT_CONTAINER_WIDTH)]
    container_width: u32,

    /// Only include the portfolio set with this title (repeatable)
    #[arg(long = "set", value_name = "TITLE")]
    sets: Vec<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn scan_directory(source: &Path) -> Result<Vec<MediaRef>> {
    let scanner = FileScanner::with_config(ScanConfig {
        recursive: true,
        ..Default::default()
    });
    let (mut progress, handle) = scanner.scan_with_progress(source.to_path_buf());
    while let Some(event) = progress.recv().await {
        match event {
            ScanProgress::Started { path } => debug!(?path, "Scanning"),
            ScanProgress::Discovered { path } => debug!(?path, "Found image"),
            ScanProgress::FileError { path, error } => {
                warn!(?path, %error, "Skipping unreadable entry")
            }
            ScanProgress::Completed { total, errors } => {
                info!(total, errors, "Directory scanned")
            }
        }
    }
    let (refs, _) = handle.await.context("Scan task panicked")??;
    Ok(refs)
}

async fn load_references(source: &Path, sets: &[String]) -> Result<Vec<MediaRef>> {
    if source.is_dir() {
        return scan_directory(source).await;
    }

    let all = load_sets(source)?;
    if sets.is_empty() {
        return Ok(flatten_sets(&all));
    }
    let titles: Vec<&str> = sets.iter().map(String::as_str).collect();
    let selected = select_sets(&all, &titles);
    if selected.is_empty() {
        warn!(?titles, "No matching sets");
    }
    Ok(flatten_sets(selected))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("folio=info".parse()?),
        )
        .init();

    let args = Cli::parse();
    let config = FolioConfig::load(args.config.as_deref())?;

    let refs = load_references(&args.source, &args.sets).await?;
    info!(count = refs.len(), source = ?args.source, "Loaded references");

    let source = Arc::new(DefaultSource::new(config.resolver.fetch_timeout()));
    let resolver = ImageMetadataResolver::current(source, config.resolver.clone())?;
    let handle = resolver.resolve(refs);

    let mut layout = ResponsiveLayout::with_cache(
        JustifiedLayout::from_config(&config.layout),
        LayoutCache::with_capacity(config.layout.cache_entries),
    );
    let mut pending = layout.on_resize(args.container_width);

    while let Some(event) = handle.next_event().await {
        match event {
            SlotEvent::Resolved { index, fallback } => {
                if fallback {
                    warn!(index, "Using fallback dimensions");
                }
                if let Some(token) = layout.on_items_changed(&handle.slots().snapshot()) {
                    pending = Some(token);
                }
            }
            SlotEvent::Complete {
                resolved,
                fallbacks,
            } => {
                info!(resolved, fallbacks, "Resolution complete");
                break;
            }
        }
        // One frame per burst of ready events.
        if handle.events().is_empty() {
            if let Some(token) = pending.take() {
                layout.on_frame(token);
            }
        }
    }
    if let Some(token) = pending.take() {
        layout.on_frame(token);
    }

    let rows = layout.rows();
    for row in rows {
        let offset = row.leading_offset(args.container_width);
        println!(
            "row {:>3}  height {:>4}  scale {:.3}{}  offset {}",
            row.row_index,
            row.height,
            row.scale,
            if row.capped { " (capped)" } else { "" },
            offset
        );
        for placed in &row.items {
            let title = placed
                .item
                .meta_str("title")
                .unwrap_or(placed.item.source_ref.as_ref());
            println!(
                "    #{:<4} x {:>5}  {:>4}x{:<4}  {}{}",
                placed.item.original_index,
                placed.x,
                placed.width,
                placed.height,
                title,
                if placed.item.is_fallback() { "  [fallback]" } else { "" }
            );
        }
    }
    println!(
        "{} rows, {} px tall at {} px",
        rows.len(),
        total_height(rows, config.layout.gap),
        args.container_width
    );

    // Warm the first lightbox view the way a host would on click.
    let mut navigator = GalleryNavigator::new(Arc::clone(handle.slots()), config.gallery.clone());
    if let Some(first) = rows.first().and_then(|r| r.items.first()) {
        if navigator.open(first.item.original_index, Instant::now()) {
            info!(
                preload = navigator.preload_targets().len(),
                "Lightbox ready"
            );
            navigator.close();
        }
    }

    Ok(())
}
