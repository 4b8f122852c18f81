//! Agent-authored HTML shown in a sandboxed frame.

use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;
use super::file::format_size;

/// Tags removed together with their content.
pub const DANGEROUS_TAGS: [&str; 8] = [
    "object", "embed", "applet", "iframe", "frame", "frameset", "meta", "link",
];

static SCRIPT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("static regex"));
static UNCLOSED_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*\z").expect("static regex"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:\s+|([/"']))on[a-z0-9_-]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("static regex")
});
static JAVASCRIPT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("static regex"));
static DANGEROUS_ELEMENTS: LazyLock<Vec<(Regex, Regex)>> = LazyLock::new(|| {
    DANGEROUS_TAGS
        .iter()
        .map(|tag| {
            (
                Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).expect("static regex"),
                Regex::new(&format!(r"(?i)</?{tag}\b[^>]*>")).expect("static regex"),
            )
        })
        .collect()
});
static UNSAFE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<script|javascript:|\bon\w+\s*=|<iframe|<object|<embed|<applet|<form")
        .expect("static regex")
});
static ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Strips scripts, event handlers, `javascript:` URIs and embedding tags.
pub fn sanitize_html(html: &str) -> String {
    let text = SCRIPT_ELEMENT.replace_all(html, "");
    let text = UNCLOSED_SCRIPT.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "${1}");
    let mut text = JAVASCRIPT_URI.replace_all(&text, "").into_owned();
    for (paired, standalone) in DANGEROUS_ELEMENTS.iter() {
        text = paired.replace_all(&text, "").into_owned();
        text = standalone.replace_all(&text, "").into_owned();
    }
    text
}

/// True if the markup contains anything the sanitizer would act on, or a form.
pub fn has_unsafe_content(html: &str) -> bool {
    UNSAFE_MARKERS.is_match(html)
}

const FRAME_STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 16px; line-height: 1.6; color: #333; } \
img { max-width: 100%; height: auto; } \
table { border-collapse: collapse; width: 100%; } \
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; } \
th { background-color: #f5f5f5; } \
pre { background-color: #f5f5f5; padding: 12px; border-radius: 4px; overflow-x: auto; } \
code { background-color: #f5f5f5; padding: 2px 4px; border-radius: 2px; }";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlMode {
    #[default]
    Rendered,
    Source,
}

/// View state for an HTML message.
#[derive(Debug, Clone)]
pub struct HtmlView {
    source: String,
    mode: HtmlMode,
    allow_unsafe: bool,
}

impl HtmlView {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            mode: HtmlMode::default(),
            allow_unsafe: false,
        }
    }

    pub fn with_allow_unsafe(mut self, allow_unsafe: bool) -> Self {
        self.allow_unsafe = allow_unsafe;
        self
    }

    pub fn set_mode(&mut self, mode: HtmlMode) {
        self.mode = mode;
    }

    pub fn set_allow_unsafe(&mut self, allow_unsafe: bool) {
        self.allow_unsafe = allow_unsafe;
    }

    pub fn is_unsafe(&self) -> bool {
        has_unsafe_content(&self.source)
    }

    /// The markup placed in the frame: sanitized unless unsafe content is allowed.
    pub fn display_content(&self) -> String {
        if self.allow_unsafe {
            self.source.clone()
        } else {
            sanitize_html(&self.source)
        }
    }

    /// Capabilities of the frame.  Same-origin access is never granted.
    pub fn sandbox(&self) -> &'static str {
        if self.allow_unsafe { "allow-scripts" } else { "" }
    }

    pub fn element_count(&self) -> usize {
        ELEMENT.find_iter(&self.source).count()
    }

    pub fn size(&self) -> String {
        format_size(self.source.len() as u64)
    }

    pub fn copy_text(&self) -> &str {
        &self.source
    }

    /// Full document for the frame's `srcdoc`.
    pub fn srcdoc(&self) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"><style>{FRAME_STYLE}</style></head><body>{}</body></html>"#,
            self.display_content()
        )
    }

    pub fn render(&self) -> String {
        let body = match self.mode {
            HtmlMode::Source => format!(
                r#"<pre class="html-source" style="white-space: pre-wrap; font-size: 0.875rem; line-height: 1.4; max-height: 400px; overflow: auto;">{}</pre>"#,
                escape_html(&self.source)
            ),
            HtmlMode::Rendered => {
                let warning = if self.is_unsafe() && !self.allow_unsafe {
                    r#"<div class="html-warning" role="alert" style="background: #fff4e5; padding: 8px; margin-bottom: 8px;">This HTML contains potentially unsafe content. Some elements have been removed for security.</div>"#
                } else {
                    ""
                };
                format!(
                    r#"{warning}<iframe title="HTML Preview" sandbox="{}" srcdoc="{}" style="width: 100%; min-height: 200px; border: none;"></iframe>"#,
                    self.sandbox(),
                    escape_html(&self.srcdoc())
                )
            }
        };
        format!(
            r#"<div class="famarex-html" style="border: 1px solid #e0e0e0; border-radius: 4px; padding: 16px;">{body}<div class="html-stats" style="color: #757575; font-size: 0.75rem;">{} elements • {}</div></div>"#,
            self.element_count(),
            self.size()
        )
    }
}
