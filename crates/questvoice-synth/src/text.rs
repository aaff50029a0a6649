//! Text preparation for speech synthesis.
//!
//! Story messages arrive as markdown interleaved with game markup. Only the
//! narration should reach the synthesis endpoint:
//!
//! - reasoning blocks (`<think>…</think>`, `<reasoning>…</reasoning>`) are dropped
//! - fenced code blocks are dropped
//! - game directives (`[[roll d20]]`, `{{hp: 12}}`) are dropped
//! - headings, list markers, blockquotes and emphasis are unwrapped
//! - links keep their text, images keep their alt text
//! - remaining HTML tags are removed and whitespace is collapsed

/// Reduce a message to speakable plain text. May return an empty string.
#[must_use]
pub fn sanitize_for_speech(text: &str) -> String {
    let text = strip_block(text, "<think", "</think>");
    let text = strip_block(&text, "<reasoning", "</reasoning>");
    let text = strip_block(&text, "[[", "]]");
    let text = strip_block(&text, "{{", "}}");

    let mut spoken = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || is_rule(trimmed) {
            continue;
        }

        let plain = unwrap_line(trimmed);
        let plain = plain.trim();
        if !plain.is_empty() {
            if !spoken.is_empty() {
                spoken.push(' ');
            }
            spoken.push_str(plain);
        }
    }

    collapse_whitespace(&spoken)
}

/// Remove every `open…close` span, matching `open` case-insensitively.
/// An unterminated span is kept.
fn strip_block(text: &str, open: &str, close: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let open = open.to_ascii_lowercase();
    let close = close.to_ascii_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(start) = lower[cursor..].find(&open).map(|i| cursor + i) {
        let body = start + open.len();
        let Some(end) = lower[body..].find(&close).map(|i| body + i + close.len()) else {
            break;
        };
        out.push_str(&text[cursor..start]);
        out.push(' ');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn is_rule(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|&c| c == marks[0])
}

fn unwrap_line(line: &str) -> String {
    let mut s = line.trim_start_matches('>').trim_start();
    s = s.trim_start_matches('#').trim_start();
    s = strip_list_marker(s);

    let s = unwrap_links(s);
    let s = strip_tags(&s);
    s.chars()
        .filter(|c| !matches!(c, '*' | '`' | '~'))
        .collect::<String>()
        .replace("__", "")
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
    {
        return rest;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &line[digits..];
        if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return rest;
        }
    }
    line
}

/// `[text](url)` → `text`, `![alt](url)` → `alt`.
fn unwrap_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let label_start = open + 1;
        let parsed = rest[label_start..].find("](").and_then(|label_len| {
            let url_start = label_start + label_len + 2;
            rest[url_start..]
                .find(')')
                .map(|url_len| (label_len, url_start + url_len + 1))
        });

        match parsed {
            Some((label_len, end)) => {
                out.push_str(rest[..open].strip_suffix('!').unwrap_or(&rest[..open]));
                out.push_str(&rest[label_start..label_start + label_len]);
                rest = &rest[end..];
            }
            None => {
                out.push_str(&rest[..label_start]);
                rest = &rest[label_start..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
