//! WXR engine: content normalization, media caching and archive packaging.
mod cache;
mod decode;
mod fetch;
mod normalize;
mod package;
mod persist;
mod pipeline;
mod render;
mod types;
mod wxr;

pub use cache::{CacheError, CacheStatus, MediaCache, DEFAULT_CACHE_SUBDIR};
pub use decode::{decode_export, DecodeError, DecodedExport};
pub use fetch::{fetch_with_retry, FetchSettings, Fetcher, ReqwestFetcher, RetryPolicy};
pub use normalize::{
    caption_shortcode_text, is_allowed_attribute, normalize_content, IdentityRewriter, LocalHosts,
    NormalizedContent, Normalizer, UrlRewriter, ALLOWED_ATTRIBUTES, DROPPED_ELEMENTS,
};
pub use package::{
    FailedAttachment, FetchFailurePolicy, PackageError, PackageOptions, PackageSummary, Packager,
    INDEX_FILENAME, MEDIA_DIRNAME,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{build_entries, ExportRun};
pub use render::{Html2MdRenderer, MarkupRenderer, PortableMarkdownRenderer};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
pub use wxr::{parse_export, read_export, WxrError, WxrExport};
