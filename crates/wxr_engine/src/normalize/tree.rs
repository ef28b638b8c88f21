use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use wxr_core::{AttachmentIndex, RawAttachment};
use wxr_logging::wxr_debug;

use super::{with_default_scheme, LocalHosts, UrlRewriter};

/// Attributes kept per element; elements not listed keep none.
pub const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("img", &["src", "alt", "data-attachment-id"]),
    ("div", &["class"]),
    ("figure", &[]),
    ("figcaption", &[]),
];

/// Elements dropped together with their content.
pub const DROPPED_ELEMENTS: &[&str] = &["script", "style"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_allowed_attribute(element: &str, attribute: &str) -> bool {
    ALLOWED_ATTRIBUTES
        .iter()
        .find(|(name, _)| *name == element)
        .is_some_and(|(_, attrs)| attrs.contains(&attribute))
}

pub(crate) struct TreeOutput {
    pub html: String,
    pub referenced: Vec<String>,
}

/// Moves local images into `index`, then serializes what is left through the
/// attribute allow-list.
pub(crate) fn resolve_and_sanitize(
    html: &str,
    index: &mut AttachmentIndex,
    local_hosts: &LocalHosts,
    rewriter: &dyn UrlRewriter,
) -> TreeOutput {
    let document = Html::parse_fragment(html);
    let mut removed = HashSet::new();
    let mut referenced = Vec::new();

    let images = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "img");

    for img in images {
        let Some(src) = img.value().attr("src").filter(|src| !src.is_empty()) else {
            continue;
        };
        if !local_hosts.contains_url(src) {
            continue;
        }

        let rewritten = rewriter.rewrite_image(&with_default_scheme(src));
        let figure = enclosing_figure(img);
        let caption = figure.and_then(figcaption_text);

        let (attachment, created) =
            index.get_or_insert_with(src, || RawAttachment::ad_hoc(rewritten));
        if created {
            wxr_debug!("Indexed ad-hoc attachment {}", src);
        }
        if !attachment.has_caption() {
            if let Some(caption) = caption {
                attachment.caption = Some(caption);
            }
        }

        if !referenced.iter().any(|r| r == src) {
            referenced.push(src.to_string());
        }
        removed.insert(figure.map_or(img.id(), |f| f.id()));
    }

    let mut writer = SanitizingWriter {
        out: String::with_capacity(html.len()),
        removed: &removed,
        rewriter,
    };
    for child in document.root_element().children() {
        writer.write_node(child);
    }

    TreeOutput {
        html: writer.out,
        referenced,
    }
}

fn enclosing_figure(img: ElementRef<'_>) -> Option<ElementRef<'_>> {
    img.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "figure")
}

fn figcaption_text(figure: ElementRef<'_>) -> Option<String> {
    figure
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "figcaption")
        .map(|caption| caption.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

struct SanitizingWriter<'a> {
    out: String,
    removed: &'a HashSet<NodeId>,
    rewriter: &'a dyn UrlRewriter,
}

impl SanitizingWriter<'_> {
    fn write_node(&mut self, node: NodeRef<'_, Node>) {
        if self.removed.contains(&node.id()) {
            return;
        }
        match node.value() {
            Node::Text(text) => {
                let text: &str = text;
                self.out.push_str(&encode_text(text));
            }
            Node::Element(element) => {
                let name = element.name();
                if DROPPED_ELEMENTS.contains(&name) {
                    return;
                }
                self.out.push('<');
                self.out.push_str(name);
                for (attr, value) in element.attrs() {
                    if !is_allowed_attribute(name, attr) {
                        continue;
                    }
                    let value = if name == "a" && attr == "href" {
                        self.rewriter.rewrite_link(value)
                    } else {
                        value.to_string()
                    };
                    self.out.push(' ');
                    self.out.push_str(attr);
                    self.out.push_str("=\"");
                    self.out.push_str(&encode_double_quoted_attribute(&value));
                    self.out.push('"');
                }
                self.out.push('>');
                if VOID_ELEMENTS.contains(&name) {
                    return;
                }
                for child in node.children() {
                    self.write_node(child);
                }
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
            _ => {
                for child in node.children() {
                    self.write_node(child);
                }
            }
        }
    }
}
