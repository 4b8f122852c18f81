//! Collapsible JSON tree.

use std::collections::HashSet;

use serde_json::Value;

use super::escape_html;
use crate::error::Result;

/// Nodes at depth 0 and 1 start expanded.
pub const DEFAULT_EXPANDED_DEPTH: usize = 1;

/// Tree or pretty-printed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonMode {
    #[default]
    Tree,
    Raw,
}

/// View state for a JSON payload.  The value itself is never modified.
///
/// Nodes are addressed by JSON pointer (`""` for the root, `/items/0` for
/// the first element of `items`).
#[derive(Debug, Clone)]
pub struct JsonView {
    value: Value,
    mode: JsonMode,
    toggled: HashSet<String>,
}

impl JsonView {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            mode: JsonMode::default(),
            toggled: HashSet::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn mode(&self) -> JsonMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: JsonMode) {
        self.mode = mode;
    }

    /// True if the container at `path` is shown expanded.
    pub fn is_expanded(&self, path: &str) -> bool {
        let by_default = depth_of(path) <= DEFAULT_EXPANDED_DEPTH;
        by_default != self.toggled.contains(path)
    }

    /// Flips the expansion of the node at `path` and returns the new state.
    ///
    /// Paths that do not name an object or array are left alone.
    pub fn toggle(&mut self, path: &str) -> bool {
        let is_container = self
            .value
            .pointer(path)
            .is_some_and(|v| v.is_object() || v.is_array());
        if is_container && !self.toggled.remove(path) {
            self.toggled.insert(path.to_string());
        }
        self.is_expanded(path)
    }

    /// The pretty-printed source.
    pub fn raw_text(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.value)?)
    }

    /// Text placed on the clipboard by the copy action.
    pub fn copy_text(&self) -> Result<String> {
        self.raw_text()
    }

    pub fn render(&self) -> Result<String> {
        let body = match self.mode {
            JsonMode::Raw => format!("<pre>{}</pre>", escape_html(&self.raw_text()?)),
            JsonMode::Tree => {
                let mut out = String::new();
                self.render_node(&mut out, None, &self.value, "");
                out
            }
        };
        Ok(format!(
            r#"<div class="famarex-json" style="background: #272822; color: #f8f8f2; padding: 16px; border-radius: 8px; font-family: monospace; font-size: 0.875rem; overflow-x: auto;">{body}</div>"#
        ))
    }

    fn render_node(&self, out: &mut String, key: Option<&str>, value: &Value, path: &str) {
        out.push_str(r#"<div class="json-node" style="padding-left: 16px;">"#);
        if let Some(key) = key {
            out.push_str(&format!(
                r#"<span class="json-key" style="color: #f92672;">"{}"</span>: "#,
                escape_html(key)
            ));
        }
        match value {
            Value::Object(map) => {
                if self.is_expanded(path) {
                    out.push_str(&format!(r#"<span class="json-toggle" data-path="{}">{{</span>"#, escape_html(path)));
                    for (k, v) in map {
                        self.render_node(out, Some(k), v, &child_path(path, k));
                    }
                    out.push('}');
                } else {
                    out.push_str(&collapsed(path, "{…}", map.len()));
                }
            }
            Value::Array(items) => {
                if self.is_expanded(path) {
                    out.push_str(&format!(r#"<span class="json-toggle" data-path="{}">[</span>"#, escape_html(path)));
                    for (i, v) in items.iter().enumerate() {
                        self.render_node(out, None, v, &child_path(path, &i.to_string()));
                    }
                    out.push(']');
                } else {
                    out.push_str(&collapsed(path, "[…]", items.len()));
                }
            }
            scalar => out.push_str(&render_scalar(scalar)),
        }
        out.push_str("</div>");
    }
}

fn collapsed(path: &str, marker: &str, count: usize) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    format!(
        r#"<span class="json-toggle json-collapsed" data-path="{}">{marker}</span> <span class="json-count" style="color: #75715e;">{count} {noun}</span>"#,
        escape_html(path)
    )
}

fn render_scalar(value: &Value) -> String {
    let (color, text) = match value {
        Value::String(s) => ("#e6db74", format!("\"{}\"", escape_html(s))),
        Value::Number(n) => ("#ae81ff", n.to_string()),
        Value::Bool(b) => ("#66d9ef", b.to_string()),
        _ => ("#66d9ef", "null".to_string()),
    };
    format!(r#"<span class="json-value" style="color: {color};">{text}</span>"#)
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}/{}", key.replace('~', "~0").replace('/', "~1"))
}

fn depth_of(path: &str) -> usize {
    path.matches('/').count()
}
