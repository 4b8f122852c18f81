//! Shape-sniffing for AI message text.
//!
//! [`classify`] runs an ordered chain of detectors over the raw text of a
//! message.  Each detector either recognizes the whole message and extracts
//! its payload, or declines; the first to accept wins and plain text is the
//! fallback.  Classification is total and never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::types::ParsedMessage;

type Detector = fn(&str) -> Option<ParsedMessage>;

const DETECTORS: &[Detector] = &[
    detect_json,
    detect_code_block,
    detect_table,
    detect_markdown,
    detect_html,
];

static MARKDOWN_HEADING_OR_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:#{1,6}[ \t]|[ \t]*(?:[-*+]|[0-9]+\.)[ \t])").expect("static regex")
});

static MARKDOWN_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^\n]*?\*\*").expect("static regex"));

static MARKDOWN_ITALIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:^|[^A-Za-z0-9_*])\*[^\s*](?:[^*\n]*[^\s*])?\*(?:[^A-Za-z0-9_*]|$)|(?:^|[^A-Za-z0-9_])_[^\s_](?:[^_\n]*[^\s_])?_(?:[^A-Za-z0-9_]|$)",
    )
    .expect("static regex")
});

static HTML_CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</[A-Za-z0-9_]+>\z").expect("static regex"));

/// Classifies a raw message into exactly one content type.
pub fn classify(raw: &str) -> ParsedMessage {
    DETECTORS
        .iter()
        .find_map(|detect| detect(raw))
        .unwrap_or_else(|| ParsedMessage::text(raw))
}

/// JavaScript-style truthiness, which is what the agent's payloads assume.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| truthy(v))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn strip_json_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json\n") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("\n```") {
        text = rest;
    } else if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn detect_json(raw: &str) -> Option<ParsedMessage> {
    let value: Value = serde_json::from_str(strip_json_fence(raw)).ok()?;
    if !value.is_object() && !value.is_array() {
        return None;
    }
    if let (Some(content), Some(name)) = (
        truthy_field(&value, "file_content"),
        truthy_field(&value, "file_name"),
    ) {
        let filename = as_text(name);
        let file_type = match truthy_field(&value, "file_type") {
            Some(file_type) => as_text(file_type),
            None => filename
                .rsplit('.')
                .next()
                .unwrap_or(filename.as_str())
                .to_string(),
        };
        return Some(ParsedMessage::File {
            content: as_text(content),
            filename,
            file_type,
        });
    }
    if let (Some(data), Some(chart_type)) = (
        truthy_field(&value, "chart_data"),
        truthy_field(&value, "chart_type"),
    ) {
        return Some(ParsedMessage::Chart {
            content: data.clone(),
            chart_type: as_text(chart_type),
        });
    }
    Some(ParsedMessage::Json { content: value })
}

fn detect_code_block(raw: &str) -> Option<ParsedMessage> {
    let rest = raw.trim().strip_prefix("```")?;
    let lang_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let (language, rest) = rest.split_at(lang_len);
    let body = rest.strip_prefix('\n')?.strip_suffix("\n```")?;
    let language = if language.is_empty() {
        "text"
    } else {
        language
    };
    Some(ParsedMessage::Code {
        content: body.to_string(),
        language: language.to_string(),
    })
}

fn is_table_row(line: &str) -> bool {
    line.contains('|')
}

fn is_separator_row(line: &str) -> bool {
    let line = line.trim_end_matches('\r');
    is_table_row(line)
        && line
            .chars()
            .all(|c| matches!(c, '-' | '|' | ':' | ' '))
}

fn detect_table(raw: &str) -> Option<ParsedMessage> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let start = (0..lines.len().saturating_sub(1))
        .find(|&i| is_table_row(lines[i]) && is_separator_row(lines[i + 1]))?;
    let end = lines[start..]
        .iter()
        .position(|line| !is_table_row(line))
        .map_or(lines.len(), |offset| start + offset);

    let table = lines[start..end].join("\n");
    let remaining = lines[..start]
        .iter()
        .chain(lines[end..].iter())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let remaining_text = if remaining.trim().is_empty() {
        None
    } else {
        Some(remaining)
    };
    Some(ParsedMessage::Table {
        content: table,
        remaining_text,
    })
}

/// True when the text shows any markdown signal.
pub fn looks_like_markdown(text: &str) -> bool {
    MARKDOWN_HEADING_OR_LIST.is_match(text)
        || MARKDOWN_BOLD.is_match(text)
        || MARKDOWN_ITALIC.is_match(text)
        || text.contains("```")
}

fn detect_markdown(raw: &str) -> Option<ParsedMessage> {
    looks_like_markdown(raw).then(|| ParsedMessage::Markdown {
        content: raw.to_string(),
    })
}

fn detect_html(raw: &str) -> Option<ParsedMessage> {
    let trimmed = raw.trim();
    (trimmed.starts_with('<') && HTML_CLOSING_TAG.is_match(trimmed)).then(|| {
        ParsedMessage::Html {
            content: raw.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use serde_json::json;

    #[test]
    fn scalars_are_text() {
        for raw in ["42", "\"quoted\"", "true", "null", ""] {
            assert_eq!(classify(raw).content_type(), ContentType::Text, "{raw:?}");
        }
    }

    #[test]
    fn json_object() {
        assert_eq!(
            classify(r#"{"a": [1, 2]}"#),
            ParsedMessage::Json {
                content: json!({"a": [1, 2]})
            }
        );
    }

    #[test]
    fn fenced_json_is_json() {
        let parsed = classify("```json\n[1, 2, 3]\n```");
        assert_eq!(parsed, ParsedMessage::Json { content: json!([1, 2, 3]) });
    }

    #[test]
    fn file_descriptor() {
        let parsed = classify(r#"{"file_content":"aGk=","file_name":"report.final.pdf"}"#);
        assert_eq!(
            parsed,
            ParsedMessage::File {
                content: "aGk=".into(),
                filename: "report.final.pdf".into(),
                file_type: "pdf".into(),
            }
        );
    }

    #[test]
    fn file_without_extension_uses_name() {
        let parsed = classify(r#"{"file_content":"x","file_name":"README"}"#);
        match parsed {
            ParsedMessage::File { file_type, .. } => assert_eq!(file_type, "README"),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_content_is_plain_json() {
        let parsed = classify(r#"{"file_content":"","file_name":"a.txt"}"#);
        assert_eq!(parsed.content_type(), ContentType::Json);
    }

    #[test]
    fn chart_descriptor() {
        let parsed = classify(r#"{"chart_type":"bar","chart_data":{"a":1}}"#);
        assert_eq!(
            parsed,
            ParsedMessage::Chart {
                content: json!({"a": 1}),
                chart_type: "bar".into(),
            }
        );
    }

    #[test]
    fn code_block_with_language() {
        let parsed = classify("```python\nprint('hi')\nx = 1\n```");
        assert_eq!(
            parsed,
            ParsedMessage::Code {
                content: "print('hi')\nx = 1".into(),
                language: "python".into(),
            }
        );
    }

    #[test]
    fn code_block_defaults_to_text() {
        let parsed = classify("  ```\nplain\n```  ");
        assert_eq!(
            parsed,
            ParsedMessage::Code {
                content: "plain".into(),
                language: "text".into(),
            }
        );
    }

    #[test]
    fn table_with_trailing_paragraph() {
        let raw = "| a | b |\n|---|---|\n| 1 | 2 |\nSome notes here.";
        assert_eq!(
            classify(raw),
            ParsedMessage::Table {
                content: "| a | b |\n|---|---|\n| 1 | 2 |".into(),
                remaining_text: Some("Some notes here.".into()),
            }
        );
    }

    #[test]
    fn table_with_surrounding_prose() {
        let raw = "Intro\n| a |\n| :-: |\n| 1 |\n\nOutro";
        match classify(raw) {
            ParsedMessage::Table {
                content,
                remaining_text,
            } => {
                assert_eq!(content, "| a |\n| :-: |\n| 1 |");
                assert_eq!(remaining_text.as_deref(), Some("Intro\n\nOutro"));
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn table_alone_has_no_remaining_text() {
        match classify("| a |\n|---|\n") {
            ParsedMessage::Table { remaining_text, .. } => assert_eq!(remaining_text, None),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn pipes_without_separator_are_not_a_table() {
        assert_eq!(classify("a | b\nc | d").content_type(), ContentType::Text);
    }

    #[test]
    fn markdown_signals() {
        for raw in [
            "# Title",
            "intro\n## Section",
            "- one\n- two",
            "  * nested",
            "1. first",
            "this is **bold** text",
            "an *emphasis* here",
            "an _emphasis_ here",
            "inline ``` fence",
        ] {
            assert_eq!(classify(raw).content_type(), ContentType::Markdown, "{raw:?}");
        }
    }

    #[test]
    fn identifiers_are_not_italic() {
        assert_eq!(
            classify("set file_name_here and 2*3*4").content_type(),
            ContentType::Text
        );
        assert_eq!(classify("#hashtag").content_type(), ContentType::Text);
    }

    #[test]
    fn html_document() {
        let raw = "<div><p>hi</p></div>";
        assert_eq!(
            classify(raw),
            ParsedMessage::Html {
                content: raw.into()
            }
        );
        assert_eq!(classify("<br>").content_type(), ContentType::Text);
        assert_eq!(classify("a <b>b</b>").content_type(), ContentType::Text);
    }

    #[test]
    fn plain_text() {
        assert_eq!(classify("hello there"), ParsedMessage::text("hello there"));
    }
}
