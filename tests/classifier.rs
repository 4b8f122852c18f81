//! Properties of message classification and rendering across the public API.

use famarex::{ContentType, ParsedMessage, RenderOptions, classify, render_html, render_message};
use serde_json::json;

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "plain words",
    "42",
    "\"a string\"",
    "null",
    r#"{"campaign": "spring", "budget": 120}"#,
    "[1, 2, 3]",
    "```json\n{\"a\": true}\n```",
    r#"{"file_content":"aGVsbG8=","file_name":"hello.txt"}"#,
    r#"{"chart_type":"line","chart_data":{"labels":["a","b"],"datasets":[{"label":"x","data":[1,2]}]}}"#,
    "```rust\nfn main() {}\n```",
    "```\nno language\n```",
    "| ad | clicks |\n|----|--------|\n| a | 3 |\n\nBest performer is a.",
    "# Weekly report\n\n- reach up\n- spend flat",
    "Some **bold** claim",
    "<section><h2>Preview</h2></section>",
    "<br>",
    "{not json",
    "a | b",
];

#[test]
fn every_input_gets_exactly_one_type() {
    for raw in SAMPLES {
        let parsed = classify(raw);
        assert!(ContentType::ALL.contains(&parsed.content_type()), "{raw:?}");
    }
}

#[test]
fn source_reclassifies_to_same_type() {
    for raw in SAMPLES {
        let parsed = classify(raw);
        let again = classify(&parsed.to_source());
        assert_eq!(again.content_type(), parsed.content_type(), "{raw:?}");
    }
}

#[test]
fn scalars_never_classify_as_json() {
    for raw in ["1", "-2.5", "true", "false", "null", "\"x\""] {
        assert_eq!(classify(raw).content_type(), ContentType::Text, "{raw:?}");
    }
}

#[test]
fn json_round_trips_objects_and_arrays() {
    let value = json!({"ads": [{"id": 1, "ctr": 0.5}], "ok": true});
    assert_eq!(
        classify(&value.to_string()),
        ParsedMessage::Json { content: value }
    );
}

#[test]
fn fenced_block_keeps_language_and_body() {
    let body = "SELECT *\nFROM ads\nWHERE spend > 10";
    assert_eq!(
        classify(&format!("```sql\n{body}\n```")),
        ParsedMessage::Code {
            content: body.to_string(),
            language: "sql".to_string(),
        }
    );
}

#[test]
fn table_keeps_following_paragraph() {
    let raw = "| a | b |\n|---|---|\n| 1 | 2 |\nThe paragraph stays verbatim.";
    match classify(raw) {
        ParsedMessage::Table { remaining_text, .. } => {
            assert_eq!(
                remaining_text.as_deref(),
                Some("The paragraph stays verbatim.")
            );
        }
        other => panic!("expected table, got {other:?}"),
    }
}

#[test]
fn scripts_are_removed_unless_unsafe() {
    let raw = "<script>alert(1)</script><p>hi</p>";
    let parsed = classify(raw);
    assert_eq!(parsed.content_type(), ContentType::Html);

    let safe = render_html(&parsed, &RenderOptions::default());
    assert!(!safe.contains("alert(1)"));
    assert!(safe.contains("&lt;p&gt;hi&lt;/p&gt;"));

    let options = RenderOptions {
        allow_unsafe_html: true,
        ..RenderOptions::default()
    };
    let unsafe_render = render_html(&parsed, &options);
    assert!(unsafe_render.contains("alert(1)"));
}

#[test]
fn every_sample_renders() {
    for raw in SAMPLES {
        if raw.trim().is_empty() {
            continue;
        }
        let html = render_message(raw, &RenderOptions::default());
        assert!(!html.is_empty(), "{raw:?}");
    }
}
