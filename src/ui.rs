use ratatui::prelude::*;

/// Simple JSON syntax highlighting for the response pane
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    text.lines().map(highlight_line).collect()
}

fn highlight_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find('"') {
        push_plain(&mut spans, &rest[..start]);
        let tail = &rest[start..];
        match closing_quote(tail) {
            Some(end) => {
                let (quoted, after) = tail.split_at(end + 1);
                let color = if after.trim_start().starts_with(':') {
                    Color::Cyan
                } else {
                    Color::Green
                };
                spans.push(Span::styled(
                    quoted.to_string(),
                    Style::default().fg(color),
                ));
                rest = after;
            }
            None => {
                spans.push(Span::styled(
                    tail.to_string(),
                    Style::default().fg(Color::Green),
                ));
                rest = "";
            }
        }
    }
    push_plain(&mut spans, rest);

    Line::from(spans)
}

/// Byte offset of the quote ending a string that starts at byte 0
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

/// Colors numbers and JSON keywords in text outside string literals
fn push_plain(spans: &mut Vec<Span<'static>>, text: &str) {
    if text.is_empty() {
        return;
    }
    let mut chunk = String::new();
    let mut chunk_is_word = false;
    for c in text.chars() {
        let is_word = c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.');
        if is_word != chunk_is_word && !chunk.is_empty() {
            spans.push(plain_span(std::mem::take(&mut chunk), chunk_is_word));
        }
        chunk_is_word = is_word;
        chunk.push(c);
    }
    if !chunk.is_empty() {
        spans.push(plain_span(chunk, chunk_is_word));
    }
}

fn plain_span(text: String, wordish: bool) -> Span<'static> {
    if wordish {
        if text == "true" || text == "false" || text == "null" {
            return Span::styled(text, Style::default().fg(Color::Magenta));
        }
        if text.parse::<f64>().is_ok() {
            return Span::styled(text, Style::default().fg(Color::Yellow));
        }
    }
    Span::raw(text)
}

/// Track for a slider row; the filled portion reflects where the value
/// sits between the bounds
pub fn slider_track(value: f64, min: f64, max: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = max - min;
    let ratio = if span > 0.0 {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Replacement text for the key input while hidden
pub fn masked(text: &str) -> String {
    "*".repeat(text.chars().count())
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_values_get_distinct_colors() {
        let lines = highlight_json(r#"{"name": "Vanillin", "tokens": 5}"#);
        let spans = &lines[0].spans;
        let key = spans
            .iter()
            .find(|s| s.content.contains("name"))
            .unwrap();
        assert_eq!(key.style.fg, Some(Color::Cyan));
        let value = spans
            .iter()
            .find(|s| s.content.contains("Vanillin"))
            .unwrap();
        assert_eq!(value.style.fg, Some(Color::Green));
        let number = spans.iter().find(|s| s.content == "5").unwrap();
        assert_eq!(number.style.fg, Some(Color::Yellow));
    }

    #[test]
    fn escaped_quotes_stay_inside_the_string() {
        let lines = highlight_json(r#"{"note": "say \"hi\""}"#);
        let spans = &lines[0].spans;
        let value = spans
            .iter()
            .find(|s| s.content.contains("hi"))
            .unwrap();
        assert_eq!(value.style.fg, Some(Color::Green));
    }

    #[test]
    fn slider_track_clamps_to_its_bounds() {
        assert_eq!(slider_track(0.0, 0.0, 10.0, 4), "░░░░");
        assert_eq!(slider_track(10.0, 0.0, 10.0, 4), "████");
        assert_eq!(slider_track(5.0, 0.0, 10.0, 4), "██░░");
        assert_eq!(slider_track(50.0, 0.0, 10.0, 4), "████");
        // degenerate range draws an empty track
        assert_eq!(slider_track(5.0, 5.0, 5.0, 4), "░░░░");
    }

    #[test]
    fn masking_counts_characters_not_bytes() {
        assert_eq!(masked("abc"), "***");
        assert_eq!(masked("clé"), "***");
        assert_eq!(masked(""), "");
    }
}
