//! Command-line surface of `wxr-export`: argument parsing, configuration
//! merging and the end-to-end export run.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use wxr_engine::{
    build_entries, read_export, LocalHosts, MediaCache, Normalizer, Packager, ReqwestFetcher,
};
use wxr_logging::{wxr_info, wxr_warn};

use crate::config::ExportConfig;

/// Convert a WordPress export into a portable archive of posts and media.
#[derive(Debug, Parser)]
#[clap(name = "wxr-export", version)]
pub struct Cli {
    /// WXR export file; reads stdin when omitted.
    pub file: Option<PathBuf>,

    /// Hostname whose images are treated as the site's own media. Repeatable.
    #[clap(long = "domain", value_name = "HOST")]
    pub domains: Vec<String>,

    /// Archive destination [default: ./output.zip]
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// RON configuration file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Media cache directory [default: ~/.klaxon/cache/media]
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,

    /// Leave unfetchable media out of the archive instead of failing.
    #[clap(long)]
    pub skip_failed_media: bool,

    /// Also write log records to this file.
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level.
    #[clap(long, short)]
    pub verbose: bool,
}

/// Load `--config` (or defaults) and apply the command-line overrides.
pub fn resolve_config(cli: &Cli) -> Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    for domain in &cli.domains {
        if !config.local_hosts.contains(domain) {
            config.local_hosts.push(domain.clone());
        }
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config.cache_dir = Some(cache_dir.clone());
    }
    if cli.skip_failed_media {
        config.skip_failed_media = true;
    }
    Ok(config)
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read export from stdin")?;
            Ok(bytes)
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    if config.local_hosts.is_empty() {
        wxr_warn!("No local hosts configured; every image stays a remote reference");
    }

    let bytes = read_input(cli.file.as_deref())?;
    let export = read_export(&bytes).context("failed to read WXR export")?;
    let normalizer = Normalizer::new(LocalHosts::new(&config.local_hosts));
    let entries = build_entries(export, normalizer);

    let cache = match &config.cache_dir {
        Some(dir) => MediaCache::open(dir.clone()),
        None => MediaCache::open_default(),
    }
    .context("failed to open media cache")?;
    wxr_info!("Using media cache {:?}", cache.dir());

    let fetcher =
        ReqwestFetcher::new(config.fetch_settings()).context("failed to build HTTP client")?;
    let packager = Packager::new(cache, fetcher).with_options(config.package_options());
    let summary = packager
        .package(&entries, &config.output)
        .await
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    for failed in &summary.failed {
        wxr_warn!(
            "Missing from archive: {} ({}) for post {}: {}",
            failed.file,
            failed.url,
            failed.post_id,
            failed.error
        );
    }
    println!(
        "Wrote {} posts and {} media files to {}",
        summary.post_count,
        summary.attachment_count,
        summary.output_path.display()
    );
    Ok(())
}
