use sha1::{Digest, Sha1};
use uuid::Uuid;
use wxr_logging::wxr_debug;

use crate::{IntermediateAttachmentEntry, IntermediatePostEntry, RawAttachment, RawPost};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension to MIME type. Lookups are against the lowercased extension.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Content-addressed UUID: the first 16 bytes of the SHA-1 digest of `text`.
///
/// No version or variant bits are set, so ids stay compatible with archives
/// produced by earlier exporters.
pub fn hash_uuid(text: &str) -> Uuid {
    let digest = Sha1::digest(text.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// Path component of `url`, sliced from the text as written.
///
/// The scheme and authority are skipped, and the path ends at the first `?`
/// or `#`. Trailing `;params` on the last segment are dropped. The path is
/// neither percent-encoded nor normalized, since ids are hashed from it and
/// must not change with the URL library's canonical form. A value without an
/// authority is treated as a path on its own.
pub fn url_path(url: &str) -> String {
    let rest = strip_scheme(url);
    let rest = match rest.strip_prefix("//") {
        Some(authority) => authority
            .find(|c| matches!(c, '/' | '?' | '#'))
            .map_or("", |start| &authority[start..]),
        None => rest,
    };
    let path = rest
        .find(|c| matches!(c, '?' | '#'))
        .map_or(rest, |end| &rest[..end]);
    let segment_start = path.rfind('/').map_or(0, |slash| slash + 1);
    match path[segment_start..].find(';') {
        Some(params) => path[..segment_start + params].to_string(),
        None => path.to_string(),
    }
}

fn strip_scheme(url: &str) -> &str {
    let Some((scheme, rest)) = url.split_once(':') else {
        return url;
    };
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        rest
    } else {
        url
    }
}

/// Lowercased suffix after the last `.` of the final path segment.
pub fn extension_from_path(path: &str) -> String {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn mime_type_for_extension(extension: &str) -> &'static str {
    let extension = extension.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// `{id}.{extension}`, or just `{id}` when there is no extension.
pub fn attachment_filename(id: &Uuid, extension: &str) -> String {
    if extension.is_empty() {
        id.to_string()
    } else {
        format!("{id}.{extension}")
    }
}

/// Convert every post, preserving input order.
pub fn convert_posts(posts: &[RawPost]) -> Vec<IntermediatePostEntry> {
    posts.iter().map(convert_post).collect()
}

pub fn convert_post(post: &RawPost) -> IntermediatePostEntry {
    let identity = first_non_empty(&[
        post.guid.as_deref(),
        post.link.as_deref(),
        post.post_id.as_deref(),
    ]);
    let id = hash_uuid(identity.unwrap_or_default());
    let path = post.link.as_deref().map(url_path).unwrap_or_default();

    let (lat, lon) = match (post.lat, post.lon) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    let attachments: Vec<_> = post.attachments.iter().map(convert_attachment).collect();
    wxr_debug!(
        "Converted post {} ({} attachments)",
        id,
        attachments.len()
    );

    IntermediatePostEntry {
        id,
        paths: vec![path],
        date: post
            .post_date_gmt
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| post.post_date.clone()),
        title: post.title.clone(),
        source: post.content.clone(),
        tags: post.tags.clone(),
        attachments,
        slug: post.post_name.clone().filter(|s| !s.is_empty()),
        lat,
        lon,
    }
}

/// Attachment ids hash the URL path only, so the same upload reached through
/// another host or query string converges on one id.
pub fn convert_attachment(attachment: &RawAttachment) -> IntermediateAttachmentEntry {
    let path = url_path(&attachment.url);
    let id = hash_uuid(&path);
    let extension = extension_from_path(&path);

    IntermediateAttachmentEntry {
        id,
        url: attachment.url.clone(),
        paths: vec![path],
        mime_type: mime_type_for_extension(&extension).to_string(),
        file: attachment_filename(&id, &extension),
        caption: attachment.caption.clone().filter(|c| !c.is_empty()),
    }
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.is_empty())
}
