use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Renders sanitized markup to portable text.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, html: &str) -> String;
}

/// Markdown-like output: blank line between blocks, `<href>` autolinks when a
/// link's text is its own target, `[text](href)` otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortableMarkdownRenderer;

impl MarkupRenderer for PortableMarkdownRenderer {
    fn render(&self, html: &str) -> String {
        let document = Html::parse_fragment(html);
        let mut ctx = RenderContext::default();
        for child in document.root_element().children() {
            visit_node(child, &mut ctx);
        }
        ctx.into_output()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdRenderer;

impl MarkupRenderer for Html2MdRenderer {
    fn render(&self, html: &str) -> String {
        html2md::parse_html(html).trim().to_string()
    }
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut RenderContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, ctx);
            }
        }
    }
}

fn visit_element(element: ElementRef, ctx: &mut RenderContext) {
    let tag = element.value().name();
    match tag {
        "a" => render_anchor(element, ctx),
        "img" => render_image(element, ctx),
        "br" => ctx.line_break(),
        "hr" => {
            ctx.blank_line();
            ctx.push_str("---");
            ctx.blank_line();
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = usize::from(tag.as_bytes()[1] - b'0');
            ctx.blank_line();
            ctx.push_str(&"#".repeat(level));
            ctx.push_str(" ");
            visit_children(element, ctx);
            ctx.blank_line();
        }
        "li" => {
            ctx.ensure_newline();
            ctx.push_str("- ");
            visit_children(element, ctx);
            ctx.ensure_newline();
        }
        "strong" | "b" => wrap_inline(element, ctx, "**"),
        "em" | "i" => wrap_inline(element, ctx, "_"),
        "code" => wrap_inline(element, ctx, "`"),
        "pre" => {
            let code: String = element.text().collect();
            ctx.blank_line();
            ctx.push_str("```\n");
            ctx.push_str(code.trim_matches('\n'));
            ctx.push_str("\n```");
            ctx.blank_line();
        }
        "blockquote" => {
            let mut inner = RenderContext::default();
            for child in element.children() {
                visit_node(child, &mut inner);
            }
            ctx.blank_line();
            let quoted = inner.into_output();
            for (i, line) in quoted.lines().enumerate() {
                if i > 0 {
                    ctx.push_str("\n");
                }
                if line.is_empty() {
                    ctx.push_str(">");
                } else {
                    ctx.push_str("> ");
                    ctx.push_str(line);
                }
            }
            ctx.blank_line();
        }
        "p" | "div" | "section" | "article" | "header" | "footer" | "nav" | "figure"
        | "figcaption" | "ul" | "ol" | "table" | "tr" | "address" => {
            ctx.blank_line();
            visit_children(element, ctx);
            ctx.blank_line();
        }
        "td" | "th" => {
            visit_children(element, ctx);
            ctx.push_str(" ");
        }
        "script" | "style" | "noscript" | "iframe" | "template" => {}
        _ => visit_children(element, ctx),
    }
}

fn visit_children(element: ElementRef, ctx: &mut RenderContext) {
    for child in element.children() {
        visit_node(child, ctx);
    }
}

fn wrap_inline(element: ElementRef, ctx: &mut RenderContext, marker: &str) {
    ctx.push_str(marker);
    visit_children(element, ctx);
    ctx.push_str(marker);
}

fn render_anchor(element: ElementRef, ctx: &mut RenderContext) {
    let href = element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty());
    let start = ctx.len();
    visit_children(element, ctx);
    let Some(href) = href else {
        return;
    };
    let text = ctx.take_from(start);
    if text.is_empty() || text == href {
        ctx.push_str(&format!("<{href}>"));
    } else {
        ctx.push_str(&format!("[{text}]({href})"));
    }
}

fn render_image(element: ElementRef, ctx: &mut RenderContext) {
    let Some(src) = element.value().attr("src").map(str::trim) else {
        return;
    };
    if src.is_empty() {
        return;
    }
    let alt = element.value().attr("alt").unwrap_or_default().trim();
    ctx.push_str(&format!("![{alt}]({src})"));
}

#[derive(Default)]
struct RenderContext {
    builder: String,
    last_char: Option<char>,
}

impl RenderContext {
    fn into_output(self) -> String {
        self.builder.trim().to_string()
    }

    fn len(&self) -> usize {
        self.builder.len()
    }

    /// Collapses whitespace runs to one space; drops it at line starts.
    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if matches!(self.last_char, None | Some(' ') | Some('\n')) {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn push_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_char(ch);
        }
    }

    fn line_break(&mut self) {
        self.trim_trailing_spaces();
        if !self.builder.is_empty() {
            self.push_char('\n');
        }
    }

    fn ensure_newline(&mut self) {
        self.trim_trailing_spaces();
        if self.builder.is_empty() || self.last_char == Some('\n') {
            return;
        }
        self.push_char('\n');
    }

    fn blank_line(&mut self) {
        self.trim_trailing_spaces();
        if self.builder.is_empty() {
            return;
        }
        while !self.builder.ends_with("\n\n") {
            self.push_char('\n');
        }
    }

    /// Removes everything from `start` on and returns it trimmed.
    fn take_from(&mut self, start: usize) -> String {
        let taken = self.builder.split_off(start);
        self.last_char = self.builder.chars().last();
        taken.trim().to_string()
    }

    fn trim_trailing_spaces(&mut self) {
        while self.builder.ends_with(' ') {
            self.builder.pop();
        }
        self.last_char = self.builder.chars().last();
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}
