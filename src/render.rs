// ABOUTME: Renders decoded Notion block trees as Markdown text
// ABOUTME: Covers text, list, media, code, and table blocks with rich-text annotations

use crate::model::Record;
use serde_json::Value;

const INDENT: &str = "    ";

static NO_PAYLOAD: Value = Value::Null;

pub fn render_blocks(blocks: &[Record]) -> String {
    let mut out = String::new();
    let mut prev_was_list = false;
    let mut number = 0usize;

    for block in blocks {
        let kind = block.block_type().unwrap_or_default();
        number = if kind == "numbered_list_item" { number + 1 } else { 0 };

        let Some(text) = render_block(block, number) else {
            continue;
        };

        let is_list = is_list_item(kind);
        if !out.is_empty() {
            out.push_str(if is_list && prev_was_list { "\n" } else { "\n\n" });
        }
        out.push_str(&text);
        prev_was_list = is_list;
    }

    out
}

fn is_list_item(kind: &str) -> bool {
    matches!(
        kind,
        "bulleted_list_item" | "numbered_list_item" | "to_do" | "toggle"
    )
}

fn render_block(block: &Record, number: usize) -> Option<String> {
    let kind = block.block_type().unwrap_or_default();
    let payload = block.payload().unwrap_or(&NO_PAYLOAD);
    let text = rich_text(payload.get("rich_text"));

    let body = match kind {
        "paragraph" => text,
        "heading_1" => format!("# {}", text),
        "heading_2" => format!("## {}", text),
        "heading_3" => format!("### {}", text),
        "bulleted_list_item" | "toggle" => format!("- {}", text),
        "numbered_list_item" => format!("{}. {}", number, text),
        "to_do" => {
            let checked = payload
                .get("checked")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!("- [{}] {}", if checked { "x" } else { " " }, text)
        }
        "quote" => quote(&text),
        "callout" => {
            let icon = payload
                .get("icon")
                .and_then(|i| i.get("emoji"))
                .and_then(Value::as_str);
            match icon {
                Some(emoji) => quote(&format!("{} {}", emoji, text)),
                None => quote(&text),
            }
        }
        "code" => {
            let language = payload
                .get("language")
                .and_then(Value::as_str)
                .filter(|l| *l != "plain text")
                .unwrap_or_default();
            format!(
                "```{}\n{}\n```",
                language,
                plain_text(payload.get("rich_text"))
            )
        }
        "divider" => "---".to_string(),
        "equation" => {
            let expression = payload
                .get("expression")
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("$$\n{}\n$$", expression)
        }
        "image" => {
            let url = file_url(payload)?;
            format!("![{}]({})", rich_text(payload.get("caption")), url)
        }
        "file" | "pdf" | "video" | "audio" => {
            let url = file_url(payload)?;
            link(&rich_text(payload.get("caption")), url)
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = payload.get("url").and_then(Value::as_str)?;
            link(&rich_text(payload.get("caption")), url)
        }
        "child_page" | "child_database" => {
            let title = payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Untitled");
            format!("**{}**", title)
        }
        "table" => return render_table(block),
        "column_list" | "column" | "synced_block" => {
            let inner = render_blocks(block.children());
            return (!inner.is_empty()).then_some(inner);
        }
        other => {
            tracing::debug!(block_type = other, id = %block.id, "skipping unsupported block");
            return None;
        }
    };

    let nested = render_blocks(block.children());
    if nested.is_empty() {
        Some(body)
    } else if is_list_item(kind) {
        Some(format!("{}\n{}", body, indent(&nested)))
    } else {
        Some(format!("{}\n\n{}", body, nested))
    }
}

/// Markdown for a rich-text array, honoring annotations and links.
pub fn rich_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_array)
        .map(|spans| spans.iter().map(render_span).collect())
        .unwrap_or_default()
}

/// Concatenated `plain_text` of a rich-text array.
pub fn plain_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_array)
        .map(|spans| {
            spans
                .iter()
                .filter_map(|s| s.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn render_span(span: &Value) -> String {
    let text = span
        .get("plain_text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if text.is_empty() {
        return String::new();
    }
    if span.get("type").and_then(Value::as_str) == Some("equation") {
        return format!("${}$", text);
    }

    let annotations = span.get("annotations");
    let flag = |name: &str| {
        annotations
            .and_then(|a| a.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    let mut out = text.to_string();
    if flag("code") {
        out = format!("`{}`", out);
    }
    if flag("bold") {
        out = format!("**{}**", out);
    }
    if flag("italic") {
        out = format!("*{}*", out);
    }
    if flag("strikethrough") {
        out = format!("~~{}~~", out);
    }
    if let Some(href) = span.get("href").and_then(Value::as_str) {
        out = format!("[{}]({})", out, href);
    }
    out
}

/// Title of a page-metadata record: the plain text of its `title` property.
pub fn page_title(page: &Record) -> Option<String> {
    let properties = page.get("properties")?.as_object()?;
    properties
        .values()
        .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        .map(|p| plain_text(p.get("title")))
        .filter(|t| !t.trim().is_empty())
}

fn file_url(payload: &Value) -> Option<&str> {
    let source = payload.get("type")?.as_str()?;
    payload.get(source)?.get("url")?.as_str()
}

fn link(caption: &str, url: &str) -> String {
    if caption.is_empty() {
        format!("[{}]({})", url, url)
    } else {
        format!("[{}]({})", caption, url)
    }
}

fn quote(text: &str) -> String {
    if text.is_empty() {
        return ">".to_string();
    }
    text.lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(table: &Record) -> Option<String> {
    let rows: Vec<Vec<String>> = table
        .children()
        .iter()
        .filter(|row| row.block_type() == Some("table_row"))
        .map(|row| {
            row.payload()
                .and_then(|p| p.get("cells"))
                .and_then(Value::as_array)
                .map(|cells| {
                    cells
                        .iter()
                        .map(|cell| rich_text(Some(cell)).replace('|', "\\|"))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let width = rows.iter().map(Vec::len).max().filter(|w| *w > 0)?;
    let line = |cells: &[String]| {
        let padded: Vec<&str> = (0..width)
            .map(|i| cells.get(i).map(String::as_str).unwrap_or_default())
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = vec![line(rows[0].as_slice()), format!("|{}", " --- |".repeat(width))];
    lines.extend(rows[1..].iter().map(|r| line(r.as_slice())));
    Some(lines.join("\n"))
}
