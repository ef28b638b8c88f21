//! Shortcode and markup normalization of post content.
//!
//! The passes run in a fixed order and later passes rely on earlier ones:
//! entity decoding, caption/embed shortcodes, autolinks left by an earlier
//! render, gallery shortcodes, HTML comments, leaflet
//! coordinates, blank-line collapsing, trimming, then a tree pass that moves
//! local images into the attachment index, rewrites links, applies the
//! attribute allow-list and finally renders portable markup.

mod rewrite;
mod shortcodes;
mod tree;

use std::borrow::Cow;

use url::Url;
use wxr_core::AttachmentIndex;
use wxr_logging::wxr_debug;

use crate::render::{MarkupRenderer, PortableMarkdownRenderer};

pub use rewrite::{IdentityRewriter, UrlRewriter};
pub use shortcodes::caption_shortcode_text;
pub use tree::{is_allowed_attribute, ALLOWED_ATTRIBUTES, DROPPED_ELEMENTS};

/// Result of normalizing one post body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedContent {
    pub markup: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// `src` of every local image moved into the attachment index, in
    /// document order, without duplicates.
    pub referenced: Vec<String>,
}

/// Hostnames whose images are treated as the site's own media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalHosts {
    hosts: Vec<String>,
}

impl LocalHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for host in hosts {
            let host = host.as_ref().trim().to_ascii_lowercase();
            if !host.is_empty() && !normalized.contains(&host) {
                normalized.push(host);
            }
        }
        Self { hosts: normalized }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Whether `url`'s authority (`host` or `host:port`) is listed.
    /// Protocol-relative URLs are read as `https:`; relative or unparseable
    /// URLs never match.
    pub fn contains_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(&with_default_scheme(url)) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.hosts.iter().any(|h| *h == authority)
    }
}

/// `//host/path` becomes `https://host/path`; anything else is returned as is.
pub(crate) fn with_default_scheme(url: &str) -> Cow<'_, str> {
    if url.starts_with("//") {
        Cow::Owned(format!("https:{url}"))
    } else {
        Cow::Borrowed(url)
    }
}

pub struct Normalizer {
    local_hosts: LocalHosts,
    rewriter: Box<dyn UrlRewriter>,
    renderer: Box<dyn MarkupRenderer>,
}

impl Normalizer {
    pub fn new(local_hosts: LocalHosts) -> Self {
        Self {
            local_hosts,
            rewriter: Box::new(IdentityRewriter),
            renderer: Box::new(PortableMarkdownRenderer),
        }
    }

    pub fn with_rewriter(mut self, rewriter: impl UrlRewriter + 'static) -> Self {
        self.rewriter = Box::new(rewriter);
        self
    }

    pub fn with_renderer(mut self, renderer: impl MarkupRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn local_hosts(&self) -> &LocalHosts {
        &self.local_hosts
    }

    /// Normalize one post body. Never fails: shortcodes that do not match
    /// their expected shape pass through as text.
    ///
    /// New attachment stubs are inserted into `index` for local images it
    /// has not seen; existing entries only gain a caption when they had none.
    pub fn normalize(&self, raw_html: &str, index: &mut AttachmentIndex) -> NormalizedContent {
        let html = shortcodes::decode_entities(raw_html);
        let html = shortcodes::replace_caption_shortcodes(&html);
        let html = shortcodes::replace_embed_shortcodes(&html);
        let html = shortcodes::expand_autolinks(&html);
        let html = shortcodes::remove_gallery_shortcodes(&html);
        let html = shortcodes::remove_comment_blocks(&html);
        let (html, coordinates) = shortcodes::extract_leaflet_coordinates(&html);
        let html = shortcodes::consolidate_line_feeds(&html);
        let html = html.trim();

        if let Some((lat, lon)) = coordinates {
            wxr_debug!("Captured leaflet coordinates {}, {}", lat, lon);
        }

        let tree = tree::resolve_and_sanitize(
            html,
            index,
            &self.local_hosts,
            self.rewriter.as_ref(),
        );
        let markup = self.renderer.render(&tree.html).trim().to_string();

        NormalizedContent {
            markup,
            lat: coordinates.map(|(lat, _)| lat),
            lon: coordinates.map(|(_, lon)| lon),
            referenced: tree.referenced,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(LocalHosts::default())
    }
}

/// Normalize with the default hooks and renderer.
pub fn normalize_content(
    raw_html: &str,
    index: &mut AttachmentIndex,
    local_hosts: &[&str],
) -> NormalizedContent {
    Normalizer::new(LocalHosts::new(local_hosts)).normalize(raw_html, index)
}

#[cfg(test)]
mod tests {
    use super::LocalHosts;

    #[test]
    fn host_match_is_case_insensitive_and_port_aware() {
        let hosts = LocalHosts::new(["Example.com", "media.example.com:8080", ""]);
        assert_eq!(hosts.hosts().len(), 2);
        assert!(hosts.contains_url("https://EXAMPLE.com/a.jpg"));
        assert!(hosts.contains_url("http://media.example.com:8080/a.jpg"));
        assert!(!hosts.contains_url("http://media.example.com/a.jpg"));
        assert!(!hosts.contains_url("https://example.net/a.jpg"));
        assert!(!hosts.contains_url("/wp-content/uploads/a.jpg"));
    }

    #[test]
    fn protocol_relative_urls_match_their_host() {
        let hosts = LocalHosts::new(["example.com"]);
        assert!(hosts.contains_url("//example.com/a.jpg"));
        assert!(hosts.contains_url("//EXAMPLE.com/wp-content/b.png?w=300"));
        assert!(!hosts.contains_url("//cdn.example.net/a.jpg"));
        assert!(!hosts.contains_url("/a.jpg"));
    }
}
