use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;
use wxr_core::IntermediatePostEntry;
use wxr_logging::{wxr_info, wxr_warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::cache::{CacheError, CacheStatus, MediaCache};
use crate::fetch::{Fetcher, RetryPolicy};
use crate::persist::{split_destination, AtomicFileWriter, PersistError};

pub const INDEX_FILENAME: &str = "index.json";
pub const MEDIA_DIRNAME: &str = "media";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to serialize index: {0}")]
    Json(#[from] serde_json::Error),
    #[error("media cache error: {0}")]
    Cache(#[from] CacheError),
}

/// What to do when an attachment cannot be fetched after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Fail the run; nothing is written at the destination.
    #[default]
    Abort,
    /// Leave the file out of `media/` and report it in the summary.
    SkipAndReport,
}

#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub retry: RetryPolicy,
    pub on_fetch_failure: FetchFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttachment {
    pub post_id: Uuid,
    pub file: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub post_count: usize,
    /// Distinct media files staged into the archive.
    pub attachment_count: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    pub failed: Vec<FailedAttachment>,
    pub output_path: PathBuf,
}

pub struct Packager {
    cache: MediaCache,
    fetcher: Box<dyn Fetcher>,
    options: PackageOptions,
}

impl Packager {
    pub fn new(cache: MediaCache, fetcher: impl Fetcher + 'static) -> Self {
        Self {
            cache,
            fetcher: Box::new(fetcher),
            options: PackageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PackageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Build the archive for `entries` and install it at `output`.
    ///
    /// Media is staged sequentially through the cache. The archive is
    /// written next to `output` and renamed into place, so a failed run
    /// leaves any previous file at `output` untouched.
    pub async fn package(
        &self,
        entries: &[IntermediatePostEntry],
        output: &Path,
    ) -> Result<PackageSummary, PackageError> {
        let staging = tempfile::TempDir::new()?;
        let media_dir = staging.path().join(MEDIA_DIRNAME);
        fs::create_dir_all(&media_dir)?;

        let index = serde_json::to_string_pretty(entries)?;
        fs::write(staging.path().join(INDEX_FILENAME), index)?;

        let mut staged = BTreeSet::new();
        let mut cache_hits = 0;
        let mut fetched = 0;
        let mut failed: Vec<FailedAttachment> = Vec::new();

        for entry in entries {
            for attachment in &entry.attachments {
                if staged.contains(&attachment.file)
                    || failed.iter().any(|f| f.file == attachment.file)
                {
                    continue;
                }
                let result = self
                    .cache
                    .ensure(attachment, self.fetcher.as_ref(), self.options.retry)
                    .await;
                match result {
                    Ok((cached, status)) => {
                        match status {
                            CacheStatus::Hit => cache_hits += 1,
                            CacheStatus::Fetched => fetched += 1,
                        }
                        fs::copy(&cached, media_dir.join(&attachment.file))?;
                        staged.insert(attachment.file.clone());
                    }
                    Err(err @ CacheError::Fetch { .. })
                        if self.options.on_fetch_failure == FetchFailurePolicy::SkipAndReport =>
                    {
                        wxr_warn!("Skipping {} for post {}: {}", attachment.file, entry.id, err);
                        failed.push(FailedAttachment {
                            post_id: entry.id,
                            file: attachment.file.clone(),
                            url: attachment.url.clone(),
                            error: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let (dir, filename) = split_destination(output)?;
        let writer = AtomicFileWriter::new(dir);
        let output_path = writer.write_with(&filename, |file| write_archive(staging.path(), file))?;

        wxr_info!(
            "Wrote {:?}: {} posts, {} media files ({} cached, {} fetched, {} failed)",
            output_path,
            entries.len(),
            staged.len(),
            cache_hits,
            fetched,
            failed.len()
        );

        Ok(PackageSummary {
            post_count: entries.len(),
            attachment_count: staged.len(),
            cache_hits,
            fetched,
            failed,
            output_path,
        })
    }
}

/// Zip every file under `root` with `/`-separated relative names, in sorted
/// order and with fixed timestamps and permissions.
fn write_archive(root: &Path, file: &mut File) -> io::Result<()> {
    let mut names = Vec::new();
    collect_files(root, root, &mut names)?;
    names.sort();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(file);
    for (name, path) in names {
        zip.start_file(name, options).map_err(io::Error::other)?;
        let mut source = File::open(&path)?;
        io::copy(&mut source, &mut zip)?;
    }
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
            continue;
        }
        let relative = path.strip_prefix(root).map_err(io::Error::other)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push((name, path));
    }
    Ok(())
}
