//! Prose renderers: plain text and a small block-level markdown subset.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::escape_html;

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("static regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\(([^)\s]+)\)").expect("static regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").expect("static regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("static regex"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_*])[*_]([^\s*_](?:[^*_\n]*[^\s*_])?)[*_]").expect("static regex")
});
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("static regex"));
static UNORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.+)$").expect("static regex"));
static ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+\.\s+(.+)$").expect("static regex"));

/// True if a link or image target may be emitted as-is.
///
/// Absolute targets must use `http`, `https` or `mailto`; anything without a
/// scheme is treated as relative.
pub fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        return true;
    }
    match lower.find(':') {
        Some(colon) => lower[..colon].contains(['/', '?', '#']),
        None => true,
    }
}

/// Applies inline formatting to already escaped text, outside code spans.
fn format_escaped(escaped: &str) -> String {
    let text = IMAGE.replace_all(escaped, |caps: &Captures| {
        if is_safe_url(&caps[2]) {
            format!(
                r#"<img src="{}" alt="{}" style="max-width: 100%; height: auto;" />"#,
                &caps[2], &caps[1]
            )
        } else {
            caps[1].to_string()
        }
    });
    let text = LINK.replace_all(&text, |caps: &Captures| {
        if is_safe_url(&caps[2]) {
            format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                &caps[2], &caps[1]
            )
        } else {
            caps[1].to_string()
        }
    });
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "$1<em>$2</em>");
    text.into_owned()
}

/// Escapes `text` and applies bold, italic, inline code, links and images.
pub fn inline_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in INLINE_CODE.captures_iter(text) {
        let Some(span) = caps.get(0) else { continue };
        out.push_str(&format_escaped(&escape_html(&text[last..span.start()])));
        out.push_str("<code>");
        out.push_str(&escape_html(&caps[1]));
        out.push_str("</code>");
        last = span.end();
    }
    out.push_str(&format_escaped(&escape_html(&text[last..])));
    out
}

/// Renders plain text with whitespace preserved.
pub fn render_text(text: &str) -> String {
    format!(
        r#"<div class="famarex-text" style="white-space: pre-wrap; line-height: 1.6;">{}</div>"#,
        inline_markdown(text)
    )
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

#[derive(Default)]
struct BlockWriter {
    out: String,
    list: Option<(ListKind, Vec<String>)>,
    code: Option<(String, Vec<String>)>,
}

impl BlockWriter {
    fn flush_list(&mut self) {
        if let Some((kind, items)) = self.list.take() {
            self.out.push_str(&format!("<{}>", kind.tag()));
            for item in items {
                self.out.push_str(&format!("<li>{}</li>", inline_markdown(&item)));
            }
            self.out.push_str(&format!("</{}>", kind.tag()));
        }
    }

    fn flush_code(&mut self) {
        if let Some((language, lines)) = self.code.take() {
            let class = if language.is_empty() {
                String::new()
            } else {
                format!(r#" class="language-{}""#, escape_html(&language))
            };
            self.out.push_str(&format!(
                r#"<pre style="white-space: pre-wrap;"><code{class}>{}</code></pre>"#,
                escape_html(&lines.join("\n"))
            ));
        }
    }

    fn push_list_item(&mut self, kind: ListKind, item: &str) {
        match &mut self.list {
            Some((current, items)) if *current == kind => items.push(item.to_string()),
            _ => {
                self.flush_list();
                self.list = Some((kind, vec![item.to_string()]));
            }
        }
    }

    fn line(&mut self, line: &str) {
        if let Some(fence) = line.strip_prefix("```") {
            if self.code.is_some() {
                self.flush_code();
            } else {
                self.flush_list();
                self.code = Some((fence.trim().to_string(), Vec::new()));
            }
            return;
        }
        if let Some((_, lines)) = &mut self.code {
            lines.push(line.to_string());
            return;
        }
        if let Some(caps) = HEADER.captures(line) {
            self.flush_list();
            let level = caps[1].len();
            self.out
                .push_str(&format!("<h{level}>{}</h{level}>", inline_markdown(&caps[2])));
        } else if let Some(caps) = UNORDERED.captures(line) {
            self.push_list_item(ListKind::Unordered, &caps[1]);
        } else if let Some(caps) = ORDERED.captures(line) {
            self.push_list_item(ListKind::Ordered, &caps[1]);
        } else {
            self.flush_list();
            if !line.trim().is_empty() {
                self.out.push_str(&format!("<p>{}</p>", inline_markdown(line)));
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush_list();
        self.flush_code();
        self.out
    }
}

/// Renders headings, lists, fenced code blocks and paragraphs.
pub fn render_markdown(text: &str) -> String {
    let mut writer = BlockWriter::default();
    for line in text.split('\n') {
        writer.line(line.trim_end_matches('\r'));
    }
    format!(
        r#"<div class="famarex-markdown" style="white-space: pre-wrap; line-height: 1.6;">{}</div>"#,
        writer.finish()
    )
}
