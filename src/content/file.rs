//! File attachments: preview and download decoding.

use base64::Engine;

use super::escape_html;
use crate::error::{Error, Result};

const IMAGE_TYPES: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
const TEXT_TYPES: &[&str] = &["txt", "json", "xml", "html", "css", "js", "ts", "md"];
const VIDEO_TYPES: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "webm"];
const AUDIO_TYPES: &[&str] = &["mp3", "wav", "ogg", "aac", "flac"];
const DOCUMENT_TYPES: &[&str] = &["doc", "docx", "txt", "rtf"];

/// Longest text preview, in characters.
pub const TEXT_PREVIEW_CHARS: usize = 1000;

const OCTET_STREAM: &str = "application/octet-stream";

/// Broad category of a file type, used for the badge and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Other,
}

impl FileCategory {
    pub fn of(file_type: &str) -> Self {
        let lower = file_type.to_ascii_lowercase();
        let t = lower.as_str();
        if IMAGE_TYPES.contains(&t) {
            FileCategory::Image
        } else if VIDEO_TYPES.contains(&t) {
            FileCategory::Video
        } else if AUDIO_TYPES.contains(&t) {
            FileCategory::Audio
        } else if t == "pdf" {
            FileCategory::Pdf
        } else if DOCUMENT_TYPES.contains(&t) {
            FileCategory::Document
        } else {
            FileCategory::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Pdf => "pdf",
            FileCategory::Document => "document",
            FileCategory::Other => "file",
        }
    }
}

pub fn is_image_type(file_type: &str) -> bool {
    IMAGE_TYPES.contains(&file_type.to_ascii_lowercase().as_str())
}

pub fn is_text_type(file_type: &str) -> bool {
    TEXT_TYPES.contains(&file_type.to_ascii_lowercase().as_str())
}

/// MIME type for a file extension.
pub fn mime_for_extension(file_type: &str) -> &'static str {
    match file_type.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "ts" => "text/typescript",
        "md" => "text/markdown",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => OCTET_STREAM,
    }
}

/// `0 Bytes`, `512 Bytes`, `1.5 KB`, ...
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// True for a `data:` URL or a well-formed raw base64 string.
pub fn is_base64_content(content: &str) -> bool {
    if content.starts_with("data:") {
        return true;
    }
    let body = content.trim_end_matches('=');
    !body.is_empty()
        && content.len() % 4 == 0
        && content.len() - body.len() <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Bytes ready to be saved, with their MIME type and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: String,
}

/// A file descriptor emitted by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub content: String,
    pub filename: String,
    pub file_type: String,
}

impl FilePayload {
    pub fn new(
        content: impl Into<String>,
        filename: impl Into<String>,
        file_type: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            file_type: file_type.into(),
        }
    }

    pub fn is_base64(&self) -> bool {
        is_base64_content(&self.content)
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::of(&self.file_type)
    }

    /// Decodes the content into downloadable bytes.
    pub fn decode(&self) -> Result<DownloadBlob> {
        let mut filename = if self.filename.is_empty() {
            format!("file-{}", time::OffsetDateTime::now_utc().unix_timestamp())
        } else {
            self.filename.clone()
        };
        if let Some(rest) = self.content.strip_prefix("data:") {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| Error::render("file", "data URL without a payload"))?;
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .unwrap_or(OCTET_STREAM)
                .to_string();
            let bytes = if header.ends_with(";base64") {
                base64::engine::general_purpose::STANDARD.decode(data)?
            } else {
                data.as_bytes().to_vec()
            };
            return Ok(DownloadBlob {
                bytes,
                mime,
                filename,
            });
        }
        if self.is_base64() {
            let bytes = base64::engine::general_purpose::STANDARD.decode(&self.content)?;
            return Ok(DownloadBlob {
                bytes,
                mime: mime_for_extension(&self.file_type).to_string(),
                filename,
            });
        }
        if !filename.contains('.') {
            filename.push_str(".txt");
        }
        Ok(DownloadBlob {
            bytes: self.content.as_bytes().to_vec(),
            mime: "text/plain".to_string(),
            filename,
        })
    }

    /// Size of the decoded file, or of the raw content if it does not decode.
    pub fn size(&self) -> u64 {
        match self.decode() {
            Ok(blob) => blob.bytes.len() as u64,
            Err(_) => self.content.len() as u64,
        }
    }

    fn preview(&self) -> String {
        if is_image_type(&self.file_type) && self.is_base64() {
            let src = if self.content.starts_with("data:") {
                self.content.clone()
            } else {
                format!(
                    "data:{};base64,{}",
                    mime_for_extension(&self.file_type),
                    self.content
                )
            };
            return format!(
                r#"<img class="file-preview" src="{}" alt="{}" style="max-width: 100%; max-height: 300px; object-fit: contain;" />"#,
                escape_html(&src),
                escape_html(&self.filename)
            );
        }
        if is_text_type(&self.file_type) && !self.is_base64() {
            let mut text: String = self.content.chars().take(TEXT_PREVIEW_CHARS).collect();
            if self.content.chars().count() > TEXT_PREVIEW_CHARS {
                text.push_str("...");
            }
            return format!(
                r#"<pre class="file-preview" style="max-height: 300px; overflow: auto; white-space: pre-wrap; font-size: 0.875rem;">{}</pre>"#,
                escape_html(&text)
            );
        }
        format!(
            r#"<p class="file-preview-unavailable">{} file - Preview not available</p>"#,
            escape_html(&self.file_type.to_uppercase())
        )
    }

    pub fn render(&self) -> String {
        format!(
            r#"<div class="famarex-file" data-category="{category}" style="border: 1px solid #e0e0e0; border-radius: 4px; padding: 16px;"><div class="file-header"><strong>{name}</strong> <span class="file-type">{file_type}</span> <span class="file-size">{size}</span></div>{preview}</div>"#,
            category = self.category().name(),
            name = escape_html(&self.filename),
            file_type = escape_html(&self.file_type.to_uppercase()),
            size = format_size(self.size()),
            preview = self.preview(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_detection() {
        assert!(is_base64_content("aGVsbG8="));
        assert!(is_base64_content("data:text/plain,hi"));
        assert!(!is_base64_content("hello"));
        assert!(!is_base64_content("hello world!"));
        assert!(!is_base64_content(""));
        assert!(!is_base64_content("===="));
    }

    #[test]
    fn decode_data_url() {
        let file = FilePayload::new("data:image/png;base64,aGk=", "a.png", "png");
        let blob = file.decode().unwrap();
        assert_eq!(blob.bytes, b"hi");
        assert_eq!(blob.mime, "image/png");
        assert_eq!(blob.filename, "a.png");
    }

    #[test]
    fn decode_data_url_without_mime() {
        let blob = FilePayload::new("data:;base64,aGk=", "a", "bin").decode().unwrap();
        assert_eq!(blob.mime, "application/octet-stream");
    }

    #[test]
    fn decode_raw_base64() {
        let blob = FilePayload::new("aGVsbG8=", "greeting.bin", "bin").decode().unwrap();
        assert_eq!(blob.bytes, b"hello");
        assert_eq!(blob.mime, "application/octet-stream");
    }

    #[test]
    fn plain_text_gets_extension() {
        let blob = FilePayload::new("plain notes", "notes", "notes").decode().unwrap();
        assert_eq!(blob.filename, "notes.txt");
        assert_eq!(blob.mime, "text/plain");
        let kept = FilePayload::new("plain notes", "notes.md", "md").decode().unwrap();
        assert_eq!(kept.filename, "notes.md");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn previews() {
        let image = FilePayload::new("aGk=", "x.png", "png").render();
        assert!(image.contains(r#"src="data:image/png;base64,aGk=""#));

        let long = "a ".repeat(800);
        let text = FilePayload::new(long, "notes.txt", "txt").render();
        assert!(text.contains("<pre"));
        assert!(text.contains("..."));

        let pdf = FilePayload::new("JVBERi0=", "r.pdf", "pdf").render();
        assert!(pdf.contains("PDF file - Preview not available"));
        assert!(pdf.contains(r#"data-category="pdf""#));
    }
}
