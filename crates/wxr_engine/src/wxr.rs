//! Reader for WordPress eXtended RSS (WXR) exports.

use roxmltree::{Document, Node};
use thiserror::Error;
use wxr_core::{RawAttachment, RawPost};
use wxr_logging::wxr_info;

use crate::decode::{decode_export, DecodeError};
use crate::normalize::caption_shortcode_text;

/// Every WXR version (1.0, 1.1, 1.2) uses a namespace under this prefix.
const WP_NAMESPACE_PREFIX: &str = "http://wordpress.org/export/";
const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

#[derive(Debug, Error)]
pub enum WxrError {
    #[error("export decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("export is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Records extracted from one export, in document order.
///
/// Posts carry their raw content and no attachments yet; the export run
/// assigns attachments after normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WxrExport {
    pub posts: Vec<RawPost>,
    pub attachments: Vec<RawAttachment>,
}

#[derive(Debug, Clone, Copy)]
enum Ns {
    Unqualified,
    Wp,
    Content,
    Excerpt,
}

impl Ns {
    fn matches(self, namespace: Option<&str>) -> bool {
        match (self, namespace) {
            (Ns::Unqualified, None) => true,
            (Ns::Wp, Some(ns)) => ns.starts_with(WP_NAMESPACE_PREFIX) && !ns.ends_with("/excerpt/"),
            (Ns::Excerpt, Some(ns)) => ns.starts_with(WP_NAMESPACE_PREFIX) && ns.ends_with("/excerpt/"),
            (Ns::Content, Some(ns)) => ns == CONTENT_NAMESPACE,
            _ => false,
        }
    }
}

/// Decode and parse raw export bytes.
pub fn read_export(bytes: &[u8]) -> Result<WxrExport, WxrError> {
    let decoded = decode_export(bytes)?;
    parse_export(without_declaration(&decoded.text))
}

/// The decoded text is UTF-8, so a declaration naming the file's original
/// encoding no longer describes it.
fn without_declaration(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml ") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    text
}

pub fn parse_export(xml: &str) -> Result<WxrExport, WxrError> {
    let document = Document::parse(xml)?;
    let items: Vec<Node> = document
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name("item"))
        .collect();

    let mut export = WxrExport::default();
    for item in &items {
        match child_text(*item, Ns::Wp, "post_type").as_deref() {
            Some("attachment") => export.attachments.push(read_attachment(*item)),
            Some("post") if child_text(*item, Ns::Wp, "status").as_deref() == Some("publish") => {
                export.posts.push(read_post(*item));
            }
            _ => {}
        }
    }

    wxr_info!(
        "Read export: {} items, {} published posts, {} attachments",
        items.len(),
        export.posts.len(),
        export.attachments.len()
    );
    Ok(export)
}

fn read_attachment(item: Node) -> RawAttachment {
    let caption = child_text(item, Ns::Excerpt, "encoded").or_else(|| {
        child_text(item, Ns::Content, "encoded").and_then(|content| caption_shortcode_text(&content))
    });
    RawAttachment {
        post_id: child_text(item, Ns::Wp, "post_id"),
        url: child_text(item, Ns::Wp, "attachment_url").unwrap_or_default(),
        mime_type: child_text(item, Ns::Wp, "post_mime_type"),
        caption,
        post_parent: child_text(item, Ns::Wp, "post_parent"),
    }
}

fn read_post(item: Node) -> RawPost {
    let tags = item
        .children()
        .filter(|node| {
            node.is_element()
                && node.has_tag_name("category")
                && node.tag_name().namespace().is_none()
                && node.attribute("domain") == Some("post_tag")
        })
        .filter_map(|node| node.text())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    RawPost {
        post_id: child_text(item, Ns::Wp, "post_id"),
        guid: child_text(item, Ns::Unqualified, "guid"),
        title: child_text(item, Ns::Unqualified, "title"),
        link: child_text(item, Ns::Unqualified, "link"),
        content: child_text(item, Ns::Content, "encoded").unwrap_or_default(),
        post_date: child_text(item, Ns::Wp, "post_date"),
        post_date_gmt: child_text(item, Ns::Wp, "post_date_gmt"),
        post_name: child_text(item, Ns::Wp, "post_name"),
        tags,
        attachments: Vec::new(),
        lat: None,
        lon: None,
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: Ns, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| {
        child.is_element()
            && child.tag_name().name() == name
            && ns.matches(child.tag_name().namespace())
    })
}

/// Trimmed text of the first matching child; empty text counts as absent.
fn child_text(node: Node, ns: Ns, name: &str) -> Option<String> {
    child(node, ns, name)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
