//! Plain-text rendering for chat replies.

use serde_json::Value;

use crate::dataset::Record;
use crate::error::ConsoleError;
use crate::remote::PollOutcome;

/// Discord caps messages at 2000 chars; leave headroom.
pub const MESSAGE_LIMIT: usize = 1990;

const MAX_TABLE_ROWS: usize = 15;
const MAX_CELL_WIDTH: usize = 24;

/// Bytes of a response body or driver message quoted in an error reply.
const MAX_ERROR_DETAIL: usize = 1500;

/// Split `text` into pieces of at most `limit` bytes, preferring line then
/// word boundaries. Never splits inside a UTF-8 sequence.
pub fn chunk(text: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= limit {
            pieces.push(remaining);
            break;
        }
        let mut end = limit;
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let split_at = remaining[..end]
            .rfind('\n')
            .or_else(|| remaining[..end].rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(end.max(first_char_len(remaining)));
        pieces.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    pieces
}

fn first_char_len(s: &str) -> usize {
    s.chars().next().map_or(0, char::len_utf8)
}

/// Like [`chunk`], but every piece is wrapped in its own code fence.
pub fn fenced_chunks(lang: &str, body: &str, limit: usize) -> Vec<String> {
    let overhead = lang.len() + "```\n\n```".len();
    let inner = limit.saturating_sub(overhead).max(1);
    let body = if body.is_empty() { " " } else { body };
    chunk(body, inner)
        .into_iter()
        .map(|piece| format!("```{}\n{}\n```", lang, piece.trim_end_matches('\n')))
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Fixed-width table of the first rows, columns in first-seen order.
pub fn render_table(rows: &[Record]) -> String {
    let shown = &rows[..rows.len().min(MAX_TABLE_ROWS)];

    let mut columns: Vec<&str> = Vec::new();
    for row in shown {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let cells: Vec<Vec<String>> = shown
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&row.get(*c).map(cell).unwrap_or_default(), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count().min(MAX_CELL_WIDTH)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(shown.len() + 3);
    out.push(line(columns.iter().map(|c| truncate(c, MAX_CELL_WIDTH)).collect()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in cells {
        out.push(line(row));
    }
    if rows.len() > shown.len() {
        out.push(format!("... {} more rows", rows.len() - shown.len()));
    }
    out.join("\n")
}

/// Reply body for a result poll.
pub fn render_poll(outcome: &PollOutcome) -> Vec<String> {
    match outcome {
        PollOutcome::Json(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            fenced_chunks("json", &pretty, MESSAGE_LIMIT)
        }
        PollOutcome::Text(text) => fenced_chunks("", text, MESSAGE_LIMIT),
    }
}

/// Operator-facing description of a failure. Quoted bodies are clipped so
/// the reply fits one message with room for a caller prefix.
pub fn describe_error(err: &ConsoleError) -> String {
    match err {
        ConsoleError::UnexpectedStatus { status, body } if body.trim().is_empty() => {
            format!("unexpected status {}", status)
        }
        ConsoleError::UnexpectedStatus { status, body } => {
            let quoted = clip(&break_backtick_runs(body.trim_end()), MAX_ERROR_DETAIL);
            format!("unexpected status {}:\n```\n{}\n```", status, quoted)
        }
        ConsoleError::Connection(msg) => {
            format!("connection error: {}", clip(msg, MAX_ERROR_DETAIL))
        }
        other => clip(&other.to_string(), MAX_ERROR_DETAIL),
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, marking the cut.
fn clip(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

/// Put a zero-width space between adjacent backticks so quoted text can
/// never close the surrounding fence.
fn break_backtick_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_tick = false;
    for c in text.chars() {
        if c == '`' && after_tick {
            out.push('\u{200b}');
        }
        after_tick = c == '`';
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn chunk_prefers_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(chunk(text, 10), vec!["aaaa\nbbbb\n", "cccc"]);
    }

    #[test]
    fn chunk_respects_utf8_boundaries() {
        let text = "ñññññ";
        let pieces = chunk(text, 3);
        assert!(pieces.iter().all(|p| p.len() <= 3));
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn chunk_short_text_is_untouched() {
        assert_eq!(chunk("hola", MESSAGE_LIMIT), vec!["hola"]);
        assert!(chunk("", MESSAGE_LIMIT).is_empty());
    }

    #[test]
    fn fenced_chunks_stay_under_limit() {
        let body = (0..400).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let pieces = fenced_chunks("json", &body, 200);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.len() <= 200, "{} bytes", piece.len());
            assert!(piece.starts_with("```json\n"));
            assert!(piece.ends_with("\n```"));
        }
    }

    #[test]
    fn table_lists_columns_in_first_seen_order() {
        let rows = vec![
            record(json!({"Gravedad": "Leve", "Estado": "Madrid"})),
            record(json!({"Gravedad": "Grave", "Heridos": 3, "Estado": null})),
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Gravedad | Estado | Heridos");
        assert_eq!(lines[1], "---------+--------+--------");
        assert_eq!(lines[2], "Leve     | Madrid |");
        assert_eq!(lines[3], "Grave    |        | 3");
    }

    #[test]
    fn table_truncates_long_cells_and_rows() {
        let rows: Vec<Record> = (0..20)
            .map(|i| record(json!({"Causa": format!("{} {}", "Exceso de velocidad en vía urbana", i)})))
            .collect();
        let table = render_table(&rows);

        assert!(table.lines().nth(2).unwrap().ends_with('…'));
        assert!(table.ends_with("... 5 more rows"));
    }

    #[test]
    fn poll_text_is_shown_verbatim() {
        let pieces = render_poll(&PollOutcome::Text("not json".into()));
        assert_eq!(pieces, vec!["```\nnot json\n```".to_string()]);
    }

    #[test]
    fn poll_json_is_pretty_printed() {
        let pieces = render_poll(&PollOutcome::Json(json!({"a": 1})));
        assert_eq!(pieces, vec!["```json\n{\n  \"a\": 1\n}\n```".to_string()]);
    }

    #[test]
    fn status_errors_carry_code_and_body() {
        let err = ConsoleError::UnexpectedStatus {
            status: 404,
            body: "{\"message\":\"Not Found\"}".into(),
        };
        let text = describe_error(&err);
        assert!(text.contains("404"));
        assert!(text.contains("{\"message\":\"Not Found\"}"));
    }

    #[test]
    fn oversized_error_page_fits_one_message() {
        let err = ConsoleError::UnexpectedStatus {
            status: 500,
            body: format!("<html>{}", "x".repeat(5000)),
        };
        let reply = format!("Error fetching results: {}", describe_error(&err));

        assert!(reply.len() <= MESSAGE_LIMIT, "{} bytes", reply.len());
        assert!(reply.starts_with("Error fetching results: unexpected status 500:\n```\n<html>"));
        assert!(reply.ends_with("…\n```"));
        assert_eq!(chunk(&reply, MESSAGE_LIMIT), vec![reply.as_str()]);
    }

    #[test]
    fn long_driver_messages_are_clipped_on_char_boundaries() {
        let err = ConsoleError::Connection("ñ".repeat(3000));
        let text = describe_error(&err);
        assert!(text.len() <= MESSAGE_LIMIT);
        assert!(text.starts_with("connection error: ñ"));
        assert!(text.ends_with('…'));
    }

    #[test]
    fn quoted_fences_cannot_close_the_error_block() {
        let err = ConsoleError::UnexpectedStatus {
            status: 422,
            body: "see ```docs``` and ````more````".into(),
        };
        let text = describe_error(&err);
        assert_eq!(text.matches("``").count(), 2);
        assert!(text.starts_with("unexpected status 422:\n```\n"));
        assert!(text.ends_with("\n```"));
        assert_eq!(text.replace('\u{200b}', "").matches("```").count(), 6);
    }
}
