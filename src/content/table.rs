//! Tabular text: detection of the row format, search, paging and CSV export.

use super::escape_html;
use super::markdown::inline_markdown;
use crate::error::{Error, Result};

/// Page sizes offered by the pager.
pub const PAGE_SIZES: [usize; 5] = [5, 10, 25, 50, 100];

/// Initial page size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// How the table text was laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Markdown,
    TabSeparated,
    Csv,
    SpaceSeparated,
    KeyValue,
    SingleColumn,
}

impl TableFormat {
    pub fn label(&self) -> &'static str {
        match self {
            TableFormat::Markdown => "markdown",
            TableFormat::TabSeparated => "tab-separated",
            TableFormat::Csv => "csv",
            TableFormat::SpaceSeparated => "space-separated",
            TableFormat::KeyValue => "key-value",
            TableFormat::SingleColumn => "single-column",
        }
    }
}

/// Parsed table.  Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub format: TableFormat,
}

impl TableData {
    /// Parses table text, trying each layout in priority order.
    pub fn parse(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(Error::render("table", "no rows"));
        }
        let (headers, rows, format) = parse_pipe(&lines)
            .or_else(|| parse_tab(&lines))
            .or_else(|| parse_csv(&lines))
            .or_else(|| parse_space(&lines))
            .unwrap_or_else(|| parse_fallback(&lines));
        if headers.is_empty() {
            return Err(Error::render("table", "no columns"));
        }
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Ok(Self {
            headers,
            rows,
            format,
        })
    }

    /// All parsed rows as CSV, header first.  Cells are always quoted.
    pub fn to_csv(&self) -> String {
        let quote = |cell: &String| format!("\"{}\"", cell.replace('"', "\"\""));
        let mut lines = vec![self.headers.iter().map(quote).collect::<Vec<_>>().join(",")];
        for row in &self.rows {
            lines.push(row.iter().map(quote).collect::<Vec<_>>().join(","));
        }
        lines.join("\n")
    }
}

type Parsed = (Vec<String>, Vec<Vec<String>>, TableFormat);

fn split_pipe_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(|c| c.trim().to_string()).collect()
}

fn parse_pipe(lines: &[&str]) -> Option<Parsed> {
    let pipe_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| line.matches('|').count() >= 2)
        .collect();
    if pipe_lines.len() < 2 {
        return None;
    }
    let headers = split_pipe_row(pipe_lines[0]);
    let is_separator = pipe_lines[1]
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '|' | ':' | '-'));
    let start = if is_separator { 2 } else { 1 };
    let rows = pipe_lines[start..].iter().map(|l| split_pipe_row(l)).collect();
    Some((headers, rows, TableFormat::Markdown))
}

fn parse_tab(lines: &[&str]) -> Option<Parsed> {
    let tab_lines: Vec<&str> = lines.iter().copied().filter(|l| l.contains('\t')).collect();
    let (first, rest) = tab_lines.split_first()?;
    let split = |line: &str| -> Vec<String> {
        line.split('\t').map(|c| c.trim().to_string()).collect()
    };
    Some((
        split(first),
        rest.iter().map(|l| split(l)).collect(),
        TableFormat::TabSeparated,
    ))
}

/// Splits one CSV line, honouring quotes and doubled quotes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn parse_csv(lines: &[&str]) -> Option<Parsed> {
    if !lines.iter().any(|l| l.matches(',').count() >= 2) {
        return None;
    }
    let csv_lines: Vec<&str> = lines.iter().copied().filter(|l| l.contains(',')).collect();
    let (first, rest) = csv_lines.split_first()?;
    Some((
        parse_csv_line(first),
        rest.iter().map(|l| parse_csv_line(l)).collect(),
        TableFormat::Csv,
    ))
}

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// At least 80% of lines share the first line's column count.
fn has_consistent_columns(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let first = lines[0].split_whitespace().count();
    let consistent = lines
        .iter()
        .filter(|l| l.split_whitespace().count() == first)
        .count();
    consistent * 5 >= lines.len() * 4
}

fn parse_space(lines: &[&str]) -> Option<Parsed> {
    if !has_consistent_columns(lines) {
        return None;
    }
    let first = words(lines[0]);
    let second = words(lines[1]);
    let looks_like_headers = first
        .iter()
        .any(|cell| cell.parse::<f64>().is_err() && cell.chars().count() > 1);
    if looks_like_headers && first.len() == second.len() {
        let rows = lines[1..].iter().map(|l| words(l)).collect();
        Some((first, rows, TableFormat::SpaceSeparated))
    } else {
        let width = lines
            .iter()
            .map(|l| l.split_whitespace().count())
            .max()
            .unwrap_or(0);
        let headers = (1..=width).map(|i| format!("Column {i}")).collect();
        let rows = lines.iter().map(|l| words(l)).collect();
        Some((headers, rows, TableFormat::SpaceSeparated))
    }
}

fn parse_fallback(lines: &[&str]) -> Parsed {
    if lines.iter().all(|l| l.contains(':')) {
        let rows = lines
            .iter()
            .map(|line| match line.find(':') {
                Some(idx) if idx > 0 => vec![
                    line[..idx].trim().to_string(),
                    line[idx + 1..].trim().to_string(),
                ],
                _ => vec![line.trim().to_string(), String::new()],
            })
            .collect();
        (
            vec!["Property".to_string(), "Value".to_string()],
            rows,
            TableFormat::KeyValue,
        )
    } else {
        (
            vec!["Content".to_string()],
            lines.iter().map(|l| vec![l.trim().to_string()]).collect(),
            TableFormat::SingleColumn,
        )
    }
}

/// Interactive state over a parsed table: search filter and pager.
#[derive(Debug, Clone)]
pub struct TableView {
    data: TableData,
    search: String,
    page: usize,
    page_size: usize,
}

impl TableView {
    pub fn new(data: TableData) -> Self {
        Self {
            data,
            search: String::new(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self::new(TableData::parse(content)?))
    }

    pub fn data(&self) -> &TableData {
        &self.data
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Sets the case-insensitive search term and returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 0;
    }

    pub fn clear_search(&mut self) {
        self.set_search(String::new());
    }

    /// Changes the page size; only the sizes in [`PAGE_SIZES`] are accepted.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(Error::validation(
                format!("unsupported page size {page_size}"),
                Some("page_size".to_string()),
            ));
        }
        self.page_size = page_size;
        self.page = 0;
        Ok(())
    }

    /// Moves to `page`, clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count().saturating_sub(1));
    }

    /// Rows matching the search term.
    pub fn filtered_rows(&self) -> Vec<&Vec<String>> {
        let needle = self.search.to_lowercase();
        self.data
            .rows
            .iter()
            .filter(|row| {
                needle.is_empty() || row.iter().any(|cell| cell.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.filtered_rows().len().div_ceil(self.page_size).max(1)
    }

    /// Rows of the current page.
    pub fn visible_rows(&self) -> Vec<&Vec<String>> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Exports every parsed row, ignoring search and paging.
    pub fn to_csv(&self) -> String {
        self.data.to_csv()
    }

    pub fn render(&self) -> String {
        let mut out = String::from(
            r#"<div class="famarex-table" style="border: 1px solid #e0e0e0; border-radius: 4px;">"#,
        );
        out.push_str(&format!(
            r#"<div class="table-toolbar" style="padding: 8px; background: #fafafa;"><span class="table-size">{} rows × {} columns</span> <span class="table-format">{}</span></div>"#,
            self.data.rows.len(),
            self.data.headers.len(),
            self.data.format.label().replace('-', " ").to_uppercase(),
        ));
        out.push_str(r#"<table style="width: 100%; border-collapse: collapse;"><thead><tr>"#);
        for header in &self.data.headers {
            out.push_str(&format!(
                r#"<th style="background: #1976d2; color: #fff; text-align: left; padding: 6px;">{}</th>"#,
                escape_html(header)
            ));
        }
        out.push_str("</tr></thead><tbody>");
        let visible = self.visible_rows();
        if visible.is_empty() {
            let message = if self.search.is_empty() {
                "No data"
            } else {
                "No matching rows"
            };
            out.push_str(&format!(
                r#"<tr><td colspan="{}" style="text-align: center; padding: 12px;">{message}</td></tr>"#,
                self.data.headers.len()
            ));
        }
        for row in visible {
            out.push_str("<tr>");
            for cell in row {
                out.push_str(&format!(
                    r#"<td style="padding: 6px; border-top: 1px solid #eee;">{}</td>"#,
                    inline_markdown(cell)
                ));
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");
        out.push_str(&format!(
            r#"<div class="table-pager" style="padding: 8px;">Page {} of {}</div></div>"#,
            self.page + 1,
            self.page_count()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_table() {
        let data = TableData::parse("| Name | Reach |\n|---|---:|\n| FB | 1200 |\n| IG | |").unwrap();
        assert_eq!(data.format, TableFormat::Markdown);
        assert_eq!(data.headers, vec!["Name", "Reach"]);
        assert_eq!(data.rows, vec![vec!["FB", "1200"], vec!["IG", ""]]);
    }

    #[test]
    fn tab_separated() {
        let data = TableData::parse("a\tb\n1\t2\n3").unwrap();
        assert_eq!(data.format, TableFormat::TabSeparated);
        assert_eq!(data.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn csv_with_quotes() {
        let data = TableData::parse("name,quote,n\n\"Doe, J\",\"say \"\"hi\"\"\",3").unwrap();
        assert_eq!(data.format, TableFormat::Csv);
        assert_eq!(data.rows[0], vec!["Doe, J", "say \"hi\"", "3"]);
    }

    #[test]
    fn space_separated_with_headers() {
        let data = TableData::parse("channel reach clicks\nfb 100 5\nig 80 3").unwrap();
        assert_eq!(data.format, TableFormat::SpaceSeparated);
        assert_eq!(data.headers, vec!["channel", "reach", "clicks"]);
        assert_eq!(data.rows.len(), 2);
    }

    #[test]
    fn space_separated_without_headers() {
        let data = TableData::parse("1 2\n3 4").unwrap();
        assert_eq!(data.headers, vec!["Column 1", "Column 2"]);
        assert_eq!(data.rows.len(), 2);
    }

    #[test]
    fn key_value_and_single_column() {
        let kv = TableData::parse("Budget: 300\nReach: wide open").unwrap();
        assert_eq!(kv.format, TableFormat::KeyValue);
        assert_eq!(kv.rows[1], vec!["Reach", "wide open"]);

        let single = TableData::parse("just one line").unwrap();
        assert_eq!(single.format, TableFormat::SingleColumn);
        assert_eq!(single.headers, vec!["Content"]);
    }

    #[test]
    fn empty_is_an_error() {
        assert!(TableData::parse("  \n\n").unwrap_err().is_render());
    }

    #[test]
    fn search_resets_page() {
        let mut text = String::from("| n |\n|---|\n");
        for i in 0..30 {
            text.push_str(&format!("| row{i} |\n"));
        }
        let mut view = TableView::parse(&text).unwrap();
        assert_eq!(view.page_count(), 3);
        view.set_page(2);
        assert_eq!(view.visible_rows().len(), 10);
        view.set_search("ROW1");
        assert_eq!(view.page(), 0);
        assert_eq!(view.filtered_rows().len(), 11);
        view.set_page(9);
        assert_eq!(view.page(), 1);
        assert_eq!(view.visible_rows().len(), 1);
    }

    #[test]
    fn page_sizes() {
        let mut view = TableView::parse("| a |\n|---|\n| 1 |").unwrap();
        assert!(view.set_page_size(25).is_ok());
        assert!(view.set_page_size(7).unwrap_err().is_validation());
        assert_eq!(view.page_size(), 25);
    }

    #[test]
    fn csv_export_quotes_cells() {
        let view = TableView::parse("| a | b |\n|---|---|\n| x \"y\" | 2 |").unwrap();
        assert_eq!(view.to_csv(), "\"a\",\"b\"\n\"x \"\"y\"\"\",\"2\"");
    }

    #[test]
    fn render_escapes_cells() {
        let html = TableView::parse("| a |\n|---|\n| <b>x</b> |").unwrap().render();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("1 rows × 1 columns"));
    }
}
