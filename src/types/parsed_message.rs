use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The tag the classifier assigns to a message's content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain prose.
    Text,
    /// A JSON object or array.
    Json,
    /// Markdown prose.
    Markdown,
    /// A pipe table, possibly embedded in prose.
    Table,
    /// A single fenced code block.
    Code,
    /// A chart descriptor.
    Chart,
    /// A file attachment descriptor.
    File,
    /// An HTML document or fragment.
    Html,
}

impl ContentType {
    /// Every content type, in classifier order of the structured kinds.
    pub const ALL: [ContentType; 8] = [
        ContentType::Json,
        ContentType::File,
        ContentType::Chart,
        ContentType::Code,
        ContentType::Table,
        ContentType::Markdown,
        ContentType::Html,
        ContentType::Text,
    ];

    /// The lowercase tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Json => "json",
            ContentType::Markdown => "markdown",
            ContentType::Table => "table",
            ContentType::Code => "code",
            ContentType::Chart => "chart",
            ContentType::File => "file",
            ContentType::Html => "html",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message's content after classification, with its extracted payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParsedMessage {
    /// Plain prose.
    Text {
        /// The original text.
        content: String,
    },

    /// A JSON object or array.
    Json {
        /// The parsed value.
        content: Value,
    },

    /// Markdown prose.
    Markdown {
        /// The original text.
        content: String,
    },

    /// A pipe table and whatever prose surrounded it.
    Table {
        /// The table lines: header, separator and rows.
        content: String,
        /// Every non-table line, joined with newlines; `None` when blank.
        remaining_text: Option<String>,
    },

    /// A single fenced code block.
    Code {
        /// The block body without fences.
        content: String,
        /// The fence's language tag, `text` when absent.
        language: String,
    },

    /// A chart descriptor (`chart_type` + `chart_data`).
    Chart {
        /// The raw `chart_data` value; normalized by the chart renderer.
        content: Value,
        /// The requested chart kind, e.g. `bar`.
        chart_type: String,
    },

    /// A file descriptor (`file_name` + `file_content`).
    File {
        /// Base64, a data URL, or plain text.
        content: String,
        /// File name as given by the agent.
        filename: String,
        /// Explicit `file_type`, or the file name's extension.
        file_type: String,
    },

    /// An HTML document or fragment.
    Html {
        /// The original markup.
        content: String,
    },
}

impl ParsedMessage {
    /// Plain text content.
    pub fn text(content: impl Into<String>) -> Self {
        ParsedMessage::Text {
            content: content.into(),
        }
    }

    /// The content type tag of this message.
    pub fn content_type(&self) -> ContentType {
        match self {
            ParsedMessage::Text { .. } => ContentType::Text,
            ParsedMessage::Json { .. } => ContentType::Json,
            ParsedMessage::Markdown { .. } => ContentType::Markdown,
            ParsedMessage::Table { .. } => ContentType::Table,
            ParsedMessage::Code { .. } => ContentType::Code,
            ParsedMessage::Chart { .. } => ContentType::Chart,
            ParsedMessage::File { .. } => ContentType::File,
            ParsedMessage::Html { .. } => ContentType::Html,
        }
    }

    /// Rebuilds a raw message that classifies to the same content type.
    pub fn to_source(&self) -> String {
        match self {
            ParsedMessage::Text { content }
            | ParsedMessage::Markdown { content }
            | ParsedMessage::Html { content } => content.clone(),
            ParsedMessage::Json { content } => content.to_string(),
            ParsedMessage::Table {
                content,
                remaining_text,
            } => match remaining_text {
                Some(rest) => format!("{content}\n{rest}"),
                None => content.clone(),
            },
            ParsedMessage::Code { content, language } => {
                format!("```{language}\n{content}\n```")
            }
            ParsedMessage::Chart {
                content,
                chart_type,
            } => json!({ "chart_type": chart_type, "chart_data": content }).to_string(),
            ParsedMessage::File {
                content,
                filename,
                file_type,
            } => json!({
                "file_content": content,
                "file_name": filename,
                "file_type": file_type,
            })
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_names() {
        let names: Vec<&str> = ContentType::ALL.iter().map(ContentType::as_str).collect();
        assert_eq!(
            names,
            vec!["json", "file", "chart", "code", "table", "markdown", "html", "text"]
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let parsed = ParsedMessage::Code {
            content: "fn main() {}".into(),
            language: "rust".into(),
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["type"], "code");
        assert_eq!(json["language"], "rust");
    }

    #[test]
    fn code_source_is_fenced() {
        let parsed = ParsedMessage::Code {
            content: "print(1)".into(),
            language: "python".into(),
        };
        assert_eq!(parsed.to_source(), "```python\nprint(1)\n```");
    }
}
