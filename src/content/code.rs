//! Code blocks with a line-number gutter and regex-based highlighting.

use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;

/// Class of a highlighted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Literal,
    String,
    Comment,
    Number,
    Property,
    Tag,
    Variable,
}

impl TokenKind {
    fn class(self) -> &'static str {
        match self {
            TokenKind::Keyword => "tok-keyword",
            TokenKind::Literal => "tok-literal",
            TokenKind::String => "tok-string",
            TokenKind::Comment => "tok-comment",
            TokenKind::Number => "tok-number",
            TokenKind::Property => "tok-property",
            TokenKind::Tag => "tok-tag",
            TokenKind::Variable => "tok-variable",
        }
    }

    fn style(self) -> &'static str {
        match self {
            TokenKind::Keyword => "color: #0066cc; font-weight: bold;",
            TokenKind::Literal => "color: #0066cc;",
            TokenKind::String => "color: #008000;",
            TokenKind::Comment => "color: #808080; font-style: italic;",
            TokenKind::Number => "color: #9c27b0;",
            TokenKind::Property => "color: #cc6600;",
            TokenKind::Tag => "color: #0066cc;",
            TokenKind::Variable => "color: #cc6600;",
        }
    }
}

/// One language's token table compiled into a single alternation.
///
/// Rule `i` is capture group `i + 1`, so rule patterns must only use
/// non-capturing groups.  Earlier rules win when two rules match at the same
/// offset.
struct TokenTable {
    regex: Regex,
    kinds: Vec<TokenKind>,
}

impl TokenTable {
    fn new(rules: &[(TokenKind, &str)]) -> Self {
        let pattern = rules
            .iter()
            .map(|(_, p)| format!("({p})"))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            regex: Regex::new(&pattern).expect("static token table"),
            kinds: rules.iter().map(|(kind, _)| *kind).collect(),
        }
    }

    fn highlight(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len() * 2);
        let mut last = 0;
        for caps in self.regex.captures_iter(code) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.as_str().is_empty() {
                continue;
            }
            let kind = (0..self.kinds.len())
                .find(|i| caps.get(i + 1).is_some())
                .map(|i| self.kinds[i]);
            let Some(kind) = kind else { continue };
            out.push_str(&escape_html(&code[last..whole.start()]));
            out.push_str(&format!(
                r#"<span class="{}" style="{}">{}</span>"#,
                kind.class(),
                kind.style(),
                escape_html(whole.as_str())
            ));
            last = whole.end();
        }
        out.push_str(&escape_html(&code[last..]));
        out
    }
}

const DQ_STRING: &str = r#""(?:[^"\\\n]|\\.)*""#;
const SQ_STRING: &str = r#"'(?:[^'\\\n]|\\.)*'"#;
const NUMBER: &str = r"\b[0-9]+(?:\.[0-9]+)?\b";

static JAVASCRIPT: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"//[^\n]*|/\*(?s:.*?)\*/"),
        (TokenKind::String, DQ_STRING),
        (TokenKind::String, SQ_STRING),
        (TokenKind::String, r"`(?:[^`\\]|\\.)*`"),
        (
            TokenKind::Keyword,
            r"\b(?:function|const|let|var|if|else|for|while|return|class|extends|import|export|from|default|new|async|await)\b",
        ),
        (TokenKind::Literal, r"\b(?:true|false|null|undefined)\b"),
        (TokenKind::Number, NUMBER),
    ])
});

static TYPESCRIPT: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"//[^\n]*|/\*(?s:.*?)\*/"),
        (TokenKind::String, DQ_STRING),
        (TokenKind::String, SQ_STRING),
        (TokenKind::String, r"`(?:[^`\\]|\\.)*`"),
        (
            TokenKind::Keyword,
            r"\b(?:function|const|let|var|if|else|for|while|return|class|extends|import|export|from|default|new|async|await|interface|type|enum)\b",
        ),
        (
            TokenKind::Literal,
            r"\b(?:true|false|null|undefined|string|number|boolean|any|void|never|unknown)\b",
        ),
        (TokenKind::Number, NUMBER),
    ])
});

static PYTHON: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"#[^\n]*"),
        (TokenKind::String, DQ_STRING),
        (TokenKind::String, SQ_STRING),
        (
            TokenKind::Keyword,
            r"\b(?:def|class|if|elif|else|for|while|return|import|from|as|try|except|finally|with|lambda|yield|in|not|and|or)\b",
        ),
        (TokenKind::Literal, r"\b(?:True|False|None)\b"),
        (TokenKind::Number, NUMBER),
    ])
});

static RUST: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"//[^\n]*|/\*(?s:.*?)\*/"),
        (TokenKind::String, DQ_STRING),
        (
            TokenKind::Keyword,
            r"\b(?:fn|let|mut|pub|struct|enum|impl|trait|use|mod|match|if|else|for|while|loop|return|async|await|self|Self|where|const|static|crate|move|ref|as|in)\b",
        ),
        (TokenKind::Literal, r"\b(?:true|false|None|Some|Ok|Err)\b"),
        (TokenKind::Number, NUMBER),
    ])
});

static HTML: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"<!--(?s:.*?)-->"),
        (TokenKind::Tag, r"</?[A-Za-z][A-Za-z0-9-]*|/?>"),
        (TokenKind::String, r#""[^"]*"|'[^']*'"#),
        (TokenKind::Property, r"\b[A-Za-z-]+="),
    ])
});

static CSS: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"/\*(?s:.*?)\*/"),
        (TokenKind::String, DQ_STRING),
        (TokenKind::String, SQ_STRING),
        (TokenKind::Property, r"\b[A-Za-z-]+\s*:"),
        (TokenKind::Literal, r"#[0-9A-Fa-f]{3,8}\b"),
        (TokenKind::Number, r"\b[0-9]+(?:\.[0-9]+)?(?:px|em|rem|vh|vw|%|s|ms)?"),
    ])
});

static JSON: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Property, r#""(?:[^"\\\n]|\\.)*"\s*:"#),
        (TokenKind::String, DQ_STRING),
        (TokenKind::Literal, r"\b(?:true|false|null)\b"),
        (TokenKind::Number, r"-?\b[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?\b"),
    ])
});

static BASH: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"#[^\n]*"),
        (TokenKind::String, DQ_STRING),
        (TokenKind::String, r"'[^']*'"),
        (TokenKind::Variable, r"\$\{?[A-Za-z_][A-Za-z0-9_]*\}?"),
        (
            TokenKind::Keyword,
            r"\b(?:if|then|else|elif|fi|for|do|done|while|case|esac|function|in|export|local|return)\b",
        ),
    ])
});

static SQL: LazyLock<TokenTable> = LazyLock::new(|| {
    TokenTable::new(&[
        (TokenKind::Comment, r"--[^\n]*"),
        (TokenKind::String, r"'(?:[^']|'')*'"),
        (
            TokenKind::Keyword,
            r"(?i:\b(?:select|from|where|insert|into|values|update|set|delete|create|table|join|left|right|inner|outer|on|group|by|order|having|limit|and|or|not|as|distinct)\b)",
        ),
        (TokenKind::Literal, r"(?i:\b(?:null|true|false|count|sum|avg|min|max)\b)"),
        (TokenKind::Number, NUMBER),
    ])
});

/// Maps a fence tag or alias onto a supported language name.
pub fn canonical_language(language: &str) -> Option<&'static str> {
    let lang = language.trim().to_ascii_lowercase();
    let canonical = match lang.as_str() {
        "javascript" | "js" | "jsx" | "mjs" => "javascript",
        "typescript" | "ts" | "tsx" => "typescript",
        "python" | "py" => "python",
        "rust" | "rs" => "rust",
        "html" | "htm" | "xml" => "html",
        "css" => "css",
        "json" => "json",
        "bash" | "sh" | "shell" | "zsh" => "bash",
        "sql" => "sql",
        _ => return None,
    };
    Some(canonical)
}

fn token_table(language: &str) -> Option<&'static TokenTable> {
    let table: &'static TokenTable = match canonical_language(language)? {
        "javascript" => &JAVASCRIPT,
        "typescript" => &TYPESCRIPT,
        "python" => &PYTHON,
        "rust" => &RUST,
        "html" => &HTML,
        "css" => &CSS,
        "json" => &JSON,
        "bash" => &BASH,
        "sql" => &SQL,
        _ => return None,
    };
    Some(table)
}

/// Escapes `code` and wraps recognized tokens in styled spans.
///
/// Unknown languages are escaped only.
pub fn highlight(code: &str, language: &str) -> String {
    match token_table(language) {
        Some(table) => table.highlight(code),
        None => escape_html(code),
    }
}

/// A code block as shown in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeView {
    code: String,
    language: String,
}

impl CodeView {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        let language = language.into();
        Self {
            code: code.into(),
            language: if language.trim().is_empty() {
                "text".to_string()
            } else {
                language
            },
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn line_count(&self) -> usize {
        self.code.split('\n').count()
    }

    pub fn char_count(&self) -> usize {
        self.code.chars().count()
    }

    pub fn footer(&self) -> String {
        format!("{} lines • {} characters", self.line_count(), self.char_count())
    }

    pub fn copy_text(&self) -> &str {
        &self.code
    }

    pub fn render(&self) -> String {
        let gutter = (1..=self.line_count())
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            concat!(
                r#"<div class="famarex-code" style="border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden; background: #fafafa;">"#,
                r#"<div class="code-header" style="padding: 4px 16px; background: #f5f5f5;"><span class="code-language">{language}</span></div>"#,
                r#"<div style="display: flex; max-height: 400px; overflow: auto;">"#,
                r#"<pre class="code-gutter" style="margin: 0; padding: 16px 8px; min-width: 40px; text-align: right; color: #757575; user-select: none; background: #eeeeee; line-height: 1.5rem;">{gutter}</pre>"#,
                r#"<pre class="code-body" style="margin: 0; padding: 16px; flex: 1; white-space: pre; line-height: 1.5rem;"><code>{body}</code></pre>"#,
                r#"</div>"#,
                r#"<div class="code-footer" style="padding: 4px 16px; background: #f5f5f5; color: #757575;">{footer}</div>"#,
                r#"</div>"#,
            ),
            language = escape_html(&self.language.to_uppercase()),
            gutter = gutter,
            body = highlight(&self.code, &self.language),
            footer = self.footer(),
        )
    }
}
