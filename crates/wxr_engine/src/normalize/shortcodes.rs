//! Text passes over raw post content, run before the markup is parsed.
//!
//! Shortcode grammar is permissive, so each pass is a single pattern/replace
//! and anything that does not match is left alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use wxr_logging::wxr_debug;

static CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[caption [^\]]*?\](.*?)<img ([^>]+)>.*?<br\s*/?>\s*(.*?)\[/caption\]")
        .expect("caption pattern")
});
static CAPTION_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[caption.*?\](.*?)\[/?caption\]").expect("caption body pattern"));
static CAPTION_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<br\s*/?>\s*(.*?)$").expect("caption tail pattern"));
static EMBED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[embed\](.*?)\[/embed\]").expect("embed pattern"));
static AUTOLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<(https?://[^\s<>"]+)>"#).expect("autolink pattern"));
static GALLERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[gallery[^\]]*\]").expect("gallery pattern"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));
static LEAFLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[leaflet-map\b([^\]]*)\]").expect("leaflet pattern"));
static LEAFLET_LAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blat\s*=\s*["']?([-+]?[0-9]*\.?[0-9]+)"#).expect("lat pattern")
});
static LEAFLET_LNG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blng\s*=\s*["']?([-+]?[0-9]*\.?[0-9]+)"#).expect("lng pattern")
});
static LINE_FEEDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("line feed pattern"));

pub(crate) fn decode_entities(text: &str) -> Cow<'_, str> {
    decode_html_entities(text)
}

/// `[caption ...]<img ...><br/>TEXT[/caption]` becomes a figure with a figcaption.
pub(crate) fn replace_caption_shortcodes(text: &str) -> Cow<'_, str> {
    CAPTION.replace_all(text, |caps: &Captures| {
        format!(
            "<figure><img {}><figcaption>{}</figcaption></figure>",
            &caps[2],
            caps[3].trim()
        )
    })
}

pub(crate) fn replace_embed_shortcodes(text: &str) -> Cow<'_, str> {
    EMBED.replace_all(text, |caps: &Captures| {
        let url = caps[1].trim();
        format!(
            r#"<div class="embed"><a href="{}">{}</a></div>"#,
            encode_double_quoted_attribute(url),
            encode_text(url)
        )
    })
}

/// Turns `<https://...>` autolinks, as emitted by the renderer, back into
/// anchors so that rendered output survives another pass.
pub(crate) fn expand_autolinks(text: &str) -> Cow<'_, str> {
    AUTOLINK.replace_all(text, |caps: &Captures| {
        format!(
            r#"<a href="{}">{}</a>"#,
            encode_double_quoted_attribute(&caps[1]),
            encode_text(&caps[1])
        )
    })
}

pub(crate) fn remove_gallery_shortcodes(text: &str) -> Cow<'_, str> {
    GALLERY.replace_all(text, "")
}

pub(crate) fn remove_comment_blocks(text: &str) -> Cow<'_, str> {
    COMMENT.replace_all(text, "")
}

/// Removes every `[leaflet-map ...]` shortcode. The last one carrying both a
/// numeric `lat` and `lng` supplies the coordinates.
pub(crate) fn extract_leaflet_coordinates(text: &str) -> (String, Option<(f64, f64)>) {
    let mut coordinates = None;
    for caps in LEAFLET.captures_iter(text) {
        let attrs = &caps[1];
        let lat = parse_coordinate(&LEAFLET_LAT, attrs);
        let lon = parse_coordinate(&LEAFLET_LNG, attrs);
        match (lat, lon) {
            (Some(lat), Some(lon)) => coordinates = Some((lat, lon)),
            _ => wxr_debug!("Dropping leaflet shortcode without usable coordinates: {}", &caps[0]),
        }
    }
    (LEAFLET.replace_all(text, "").into_owned(), coordinates)
}

fn parse_coordinate(pattern: &Regex, attrs: &str) -> Option<f64> {
    pattern
        .captures(attrs)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

pub(crate) fn consolidate_line_feeds(text: &str) -> Cow<'_, str> {
    LINE_FEEDS.replace_all(text, "\n")
}

/// Caption text of the first `[caption]` shortcode: whatever follows the
/// `<br/>` inside it.
pub fn caption_shortcode_text(content: &str) -> Option<String> {
    let body = CAPTION_BODY.captures(content)?;
    let inner = body[1].trim();
    let tail = CAPTION_TAIL.captures(inner)?;
    Some(tail[1].trim().to_string()).filter(|caption| !caption.is_empty())
}
