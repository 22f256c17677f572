//! Commit-message trailer parsing and emission.
//!
//! A trailer block is the final paragraph of a message, separated from the
//! body by a blank line, in which every line is `Key: Value` with
//! `Key = [A-Za-z][A-Za-z0-9-]*`. Unrecognized trailers are preserved
//! verbatim; `append` replaces an existing key in place.

pub const ENTIRE_CHECKPOINT: &str = "Entire-Checkpoint";
pub const ENTIRE_SESSION: &str = "Entire-Session";
pub const ENTIRE_STRATEGY: &str = "Entire-Strategy";

/// True when the line is a syntactically valid trailer.
fn is_trailer_line(line: &str) -> bool {
    let Some((key, _value)) = line.split_once(':') else {
        return false;
    };
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Split a message into (body, trailer lines). The body keeps no trailing
/// blank line; messages without a trailer block come back with an empty
/// trailer vec.
fn split_trailers(msg: &str) -> (String, Vec<String>) {
    let lines: Vec<&str> = msg.lines().collect();

    // Find the last paragraph: trailing non-empty lines.
    let end = match lines.iter().rposition(|l| !l.trim().is_empty()) {
        Some(i) => i + 1,
        None => return (msg.trim_end().to_string(), Vec::new()),
    };
    let start = lines[..end]
        .iter()
        .rposition(|l| l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);

    let paragraph = &lines[start..end];
    let all_trailers = !paragraph.is_empty() && paragraph.iter().all(|l| is_trailer_line(l));

    // A message that is nothing but trailers has no body to separate from;
    // treat the sole paragraph as the subject unless it follows a body.
    if !all_trailers || start == 0 {
        return (msg.trim_end().to_string(), Vec::new());
    }

    let body = lines[..start - 1].join("\n").trim_end().to_string();
    let trailers = paragraph.iter().map(|l| l.to_string()).collect();
    (body, trailers)
}

/// Value of `key` in the message's trailer block, if present.
pub fn parse(msg: &str, key: &str) -> Option<String> {
    let (_body, trailers) = split_trailers(msg);
    for line in &trailers {
        if let Some((k, v)) = line.split_once(':')
            && k == key
        {
            return Some(v.trim().to_string());
        }
    }
    None
}

/// Append (or replace) `key: value` in the message's trailer block,
/// preserving every other trailer untouched. Idempotent: appending an
/// existing key/value yields an identical message.
pub fn append(msg: &str, key: &str, value: &str) -> String {
    let (body, mut trailers) = split_trailers(msg);

    let new_line = format!("{}: {}", key, value);
    let mut replaced = false;
    for line in trailers.iter_mut() {
        if line.split_once(':').map(|(k, _)| k) == Some(key) {
            *line = new_line.clone();
            replaced = true;
        }
    }
    if !replaced {
        trailers.push(new_line);
    }

    if body.is_empty() {
        format!("{}\n", trailers.join("\n"))
    } else {
        format!("{}\n\n{}\n", body, trailers.join("\n"))
    }
}
