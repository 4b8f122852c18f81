//! HTML renderers, one per content type.
//!
//! Every renderer is a pure function of its payload plus the view options and
//! yields a self-contained HTML fragment.  [`render_html`] picks the renderer
//! for a [`ParsedMessage`] and turns renderer failures into an inline notice.

pub mod chart;
pub mod code;
pub mod file;
pub mod html;
pub mod json;
pub mod markdown;
pub mod table;

pub use chart::{ChartData, ChartKind, ChartView, Dataset};
pub use code::{CodeView, highlight};
pub use file::{DownloadBlob, FilePayload};
pub use html::{HtmlMode, HtmlView, has_unsafe_content, sanitize_html};
pub use json::{JsonMode, JsonView};
pub use markdown::{render_markdown, render_text};
pub use table::{TableData, TableFormat, TableView};

use crate::classify::classify;
use crate::error::Result;
use crate::observability::content_type_counter;
use crate::types::ParsedMessage;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// View choices that are not part of the message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Show agent HTML without sanitizing (scripts allowed in the sandbox).
    pub allow_unsafe_html: bool,
    /// Show HTML as escaped source instead of a frame.
    pub html_source: bool,
    /// Draw charts as this kind instead of the requested one.
    pub chart_kind: Option<ChartKind>,
    /// Show JSON pretty-printed instead of as a tree.
    pub json_raw: bool,
    /// Table rows per page; sizes outside [`table::PAGE_SIZES`] keep the default.
    pub table_page_size: usize,
    /// Table search term.
    pub table_search: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_unsafe_html: false,
            html_source: false,
            chart_kind: None,
            json_raw: false,
            table_page_size: table::DEFAULT_PAGE_SIZE,
            table_search: None,
        }
    }
}

fn try_render(parsed: &ParsedMessage, options: &RenderOptions) -> Result<String> {
    match parsed {
        ParsedMessage::Text { content } => Ok(render_text(content)),
        ParsedMessage::Markdown { content } => Ok(render_markdown(content)),
        ParsedMessage::Json { content } => {
            let mut view = JsonView::new(content.clone());
            if options.json_raw {
                view.set_mode(JsonMode::Raw);
            }
            view.render()
        }
        ParsedMessage::Table {
            content,
            remaining_text,
        } => {
            let mut view = TableView::parse(content)?;
            if table::PAGE_SIZES.contains(&options.table_page_size) {
                view.set_page_size(options.table_page_size)?;
            }
            if let Some(term) = &options.table_search {
                view.set_search(term.clone());
            }
            let mut out = view.render();
            if let Some(rest) = remaining_text {
                out.push_str(&render_markdown(rest));
            }
            Ok(out)
        }
        ParsedMessage::Code { content, language } => {
            Ok(CodeView::new(content.clone(), language.clone()).render())
        }
        ParsedMessage::Chart {
            content,
            chart_type,
        } => {
            let mut view = ChartView::from_value(content, chart_type)?;
            if let Some(kind) = options.chart_kind {
                view.set_kind(kind);
            }
            Ok(view.render())
        }
        ParsedMessage::File {
            content,
            filename,
            file_type,
        } => Ok(FilePayload::new(content.clone(), filename.clone(), file_type.clone()).render()),
        ParsedMessage::Html { content } => {
            let mut view = HtmlView::new(content.clone()).with_allow_unsafe(options.allow_unsafe_html);
            if options.html_source {
                view.set_mode(HtmlMode::Source);
            }
            Ok(view.render())
        }
    }
}

/// Renders a classified message.  Never fails: a renderer error yields a
/// notice followed by the raw text.
pub fn render_html(parsed: &ParsedMessage, options: &RenderOptions) -> String {
    let content_type = parsed.content_type();
    content_type_counter(content_type).click();
    match try_render(parsed, options) {
        Ok(html) => html,
        Err(err) => format!(
            r#"<div class="famarex-render-error" role="note" style="color: #757575;"><p>Could not parse {content_type} content: {}</p><pre style="white-space: pre-wrap;">{}</pre></div>"#,
            escape_html(&err.to_string()),
            escape_html(&parsed.to_source())
        ),
    }
}

/// Classifies raw message text and renders it.
pub fn render_message(raw: &str, options: &RenderOptions) -> String {
    render_html(&classify(raw), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_all_specials() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn bad_chart_becomes_notice() {
        let parsed = ParsedMessage::Chart {
            content: json!(3),
            chart_type: "bar".into(),
        };
        let html = render_html(&parsed, &RenderOptions::default());
        assert!(html.contains("famarex-render-error"));
        assert!(html.contains("Could not parse chart content"));
    }

    #[test]
    fn unlisted_page_size_keeps_default() {
        let options = RenderOptions {
            table_page_size: 7,
            ..RenderOptions::default()
        };
        let html = render_message("| a |\n|---|\n| 1 |", &options);
        assert!(html.contains("famarex-table"), "{html}");
        assert!(!html.contains("famarex-render-error"), "{html}");
    }

    #[test]
    fn table_with_remaining_text() {
        let html = render_message(
            "| a |\n|---|\n| 1 |\nSee **above**.",
            &RenderOptions::default(),
        );
        assert!(html.contains("famarex-table"));
        assert!(html.contains("<strong>above</strong>"));
    }

    #[test]
    fn chart_kind_override() {
        let options = RenderOptions {
            chart_kind: Some(ChartKind::Pie),
            ..Default::default()
        };
        let html = render_message(r#"{"chart_type":"bar","chart_data":{"a":1}}"#, &options);
        assert!(html.contains(r#"data-chart-type="pie""#));
    }

    #[test]
    fn script_removed_unless_allowed() {
        let raw = "<script>alert(1)</script><p>hi</p>";
        let safe = HtmlView::new(raw).display_content();
        assert_eq!(safe, "<p>hi</p>");
        let options = RenderOptions {
            allow_unsafe_html: true,
            ..Default::default()
        };
        assert!(render_message(raw, &options).contains("alert(1)"));
        assert!(!render_message(raw, &RenderOptions::default()).contains("alert(1)"));
    }
}
