//! Classify an agent message and print its HTML rendering.
//!
//! Reads one message from each file argument, or from stdin when no file is
//! given, and prints the fragment the chat view would show for it.
//!
//! # Usage
//!
//! ```bash
//! # Render a saved answer
//! famarex-render answer.txt
//!
//! # Only report what kind of content it is
//! echo '{"chart_type":"pie","chart_data":{"a":1}}' | famarex-render --type-only
//!
//! # Draw a chart as lines regardless of what the agent asked for
//! famarex-render --chart line chart.json
//! ```

use std::io::Read;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use famarex::content::ChartKind;
use famarex::content::table::PAGE_SIZES;
use famarex::{RenderOptions, classify, render_html};

/// Command-line arguments for the famarex-render tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    /// Print only the detected content type.
    #[arrrg(flag, "Print only the detected content type")]
    type_only: bool,

    /// Print agent HTML as escaped source instead of a frame.
    #[arrrg(flag, "Show HTML as source instead of a sandboxed frame")]
    html_source: bool,

    /// Let agent HTML keep its scripts inside the sandbox.
    #[arrrg(flag, "Do not sanitize agent HTML")]
    unsafe_html: bool,

    /// Pretty-print JSON instead of drawing a tree.
    #[arrrg(flag, "Show JSON pretty-printed instead of as a tree")]
    json_raw: bool,

    /// Chart kind override.
    #[arrrg(optional, "Draw charts as: bar, line, pie, scatter", "KIND")]
    chart: Option<String>,

    /// Table page size.
    #[arrrg(optional, "Table rows per page (default: 10)", "ROWS")]
    page_size: Option<usize>,

    /// Table search term.
    #[arrrg(optional, "Only show table rows containing TERM", "TERM")]
    search: Option<String>,
}

impl From<&Args> for RenderOptions {
    fn from(args: &Args) -> Self {
        let defaults = RenderOptions::default();
        RenderOptions {
            allow_unsafe_html: args.unsafe_html,
            html_source: args.html_source,
            chart_kind: args.chart.as_deref().map(ChartKind::from_name),
            json_raw: args.json_raw,
            table_page_size: args.page_size.unwrap_or(defaults.table_page_size),
            table_search: args.search.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, files) = Args::from_command_line_relaxed("famarex-render [OPTIONS] [FILES]...");
    if let Some(rows) = args.page_size.filter(|rows| !PAGE_SIZES.contains(rows)) {
        return Err(format!("unsupported page size {rows}; choose one of {PAGE_SIZES:?}").into());
    }
    let options = RenderOptions::from(&args);

    let mut inputs = Vec::with_capacity(files.len().max(1));
    if files.is_empty() {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        inputs.push(("-".to_string(), raw));
    } else {
        for file in files {
            let raw = std::fs::read_to_string(&file)
                .map_err(|err| format!("could not read {file}: {err}"))?;
            inputs.push((file, raw));
        }
    }

    let many = inputs.len() > 1;
    for (name, raw) in inputs {
        let parsed = classify(&raw);
        if many {
            println!("=== {} ===", name);
        }
        if args.type_only {
            println!("{}", parsed.content_type().as_str());
        } else {
            println!("{}", render_html(&parsed, &options));
        }
    }
    Ok(())
}
