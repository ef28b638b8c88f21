use std::path::{Path, PathBuf};

use thiserror::Error;
use wxr_core::IntermediateAttachmentEntry;
use wxr_logging::{wxr_debug, wxr_info};

use crate::fetch::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::FetchError;

/// Cache location relative to the user's home directory.
pub const DEFAULT_CACHE_SUBDIR: &str = ".klaxon/cache/media";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot resolve home directory for the media cache")]
    NoHomeDir,
    #[error("cache persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Where a cached file came from on this lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Fetched,
}

/// Disk-backed store of attachment bytes keyed by attachment file name.
///
/// Entries are never pruned. Each entry is written through a temp file and a
/// rename, so concurrent runs sharing the directory can at worst fetch the
/// same file twice; neither sees a partial file.
#[derive(Debug, Clone)]
pub struct MediaCache {
    dir: PathBuf,
}

impl MediaCache {
    /// Open (and create if absent) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Open the cache at `~/.klaxon/cache/media`.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open(Self::default_location()?)
    }

    pub fn default_location() -> Result<PathBuf, CacheError> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_CACHE_SUBDIR))
            .ok_or(CacheError::NoHomeDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn contains(&self, file: &str) -> bool {
        self.path_for(file).is_file()
    }

    /// Path to the cached bytes for `attachment`, downloading them on a miss.
    pub async fn ensure(
        &self,
        attachment: &IntermediateAttachmentEntry,
        fetcher: &dyn Fetcher,
        retry: RetryPolicy,
    ) -> Result<(PathBuf, CacheStatus), CacheError> {
        let path = self.path_for(&attachment.file);
        if path.is_file() {
            wxr_debug!("Cache hit for {} ({})", attachment.file, attachment.url);
            return Ok((path, CacheStatus::Hit));
        }

        wxr_info!("Fetching {} -> {}", attachment.url, attachment.file);
        let output = fetch_with_retry(fetcher, &attachment.url, retry)
            .await
            .map_err(|source| CacheError::Fetch {
                url: attachment.url.clone(),
                source,
            })?;

        let writer = AtomicFileWriter::new(self.dir.clone());
        let path = writer.write(&attachment.file, &output.bytes)?;
        Ok((path, CacheStatus::Fetched))
    }
}
