use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// How much of the (repaired) text a [`ParseError`] keeps for diagnostics.
const PREVIEW_CHARS: usize = 800;

#[derive(Debug, Error)]
#[error("could not parse JSON after repairs; first {PREVIEW_CHARS} chars: {preview}")]
pub struct ParseError {
    pub preview: String,
}

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[a-zA-Z0-9_-]*\s*").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//[^\r\n]*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\{\[,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)(\s*):").unwrap());
static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'([^'\\]*(?:\\.[^'\\]*)*)'").unwrap());

const SMART_QUOTES: &[(char, char)] = &[
    ('\u{201c}', '"'),
    ('\u{201d}', '"'),
    ('\u{201e}', '"'),
    ('\u{201f}', '"'),
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201a}', '\''),
    ('\u{201b}', '\''),
];

/// Parse model output that is supposed to be JSON but often is not quite.
///
/// Strictly valid text parses unchanged. Otherwise the text is run through the
/// repair steps in [`sanitize_json_text`] and parsed again; a repaired parse
/// that yields a top-level array is wrapped as `{"_data": [...]}` so callers
/// always see an object. Exhaustion returns a [`ParseError`] carrying a
/// preview of the repaired text.
pub fn parse_loose(text: &str) -> Result<Value, ParseError> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Ok(v);
    }
    let repaired = sanitize_json_text(text);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Array(items)) => Ok(serde_json::json!({ "_data": items })),
        Ok(v) => Ok(v),
        Err(_) => {
            let preview: String = repaired
                .chars()
                .take(PREVIEW_CHARS)
                .collect::<String>()
                .replace('\n', "\\n");
            Err(ParseError { preview })
        }
    }
}

/// Apply the repair steps in order. Each step is idempotent and a no-op when
/// its pattern is absent, so running the whole chain twice is a fixed point.
pub fn sanitize_json_text(text: &str) -> String {
    let mut t = text.trim().to_string();

    if t.starts_with("```") {
        t = FENCE_OPEN.replace(&t, "").into_owned();
        t = FENCE_CLOSE.replace(&t, "").into_owned();
    }

    for &(smart, plain) in SMART_QUOTES {
        if t.contains(smart) {
            t = t.replace(smart, &plain.to_string());
        }
    }

    t = LINE_COMMENT.replace_all(&t, "").into_owned();
    t = BLOCK_COMMENT.replace_all(&t, "").into_owned();

    if let Some(candidate) = extract_balanced_json_or_array(&t) {
        t = candidate.to_string();
    }

    t = TRAILING_COMMA.replace_all(&t, "$1").into_owned();
    t = BARE_KEY.replace_all(&t, "$1\"$2\"$3:").into_owned();

    t = SINGLE_QUOTED
        .replace_all(&t, |caps: &regex::Captures| {
            let inner = caps[1].replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{inner}\"")
        })
        .into_owned();

    escape_stray_inner_quotes(&t)
}

/// First balanced `{...}` span, falling back to the first balanced `[...]`.
///
/// Balance is tracked by depth-counting the open/close characters verbatim,
/// not quote-aware: a brace inside a string value can mis-balance the span.
/// Known-imprecise heuristic, kept as-is to match observed behavior.
pub fn extract_balanced_json_or_array(s: &str) -> Option<&str> {
    extract_balanced(s, '{', '}').or_else(|| extract_balanced(s, '[', ']'))
}

fn extract_balanced(s: &str, open: char, close: char) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        if ch == open {
            if depth == 0 {
                start = Some(i);
            }
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(b) = start {
                    return Some(&s[b..i + close.len_utf8()]);
                }
            }
        }
    }
    None
}

/// Best-effort repair for a stray quote pair nested inside a quoted value,
/// e.g. `"note": "he said "hi" today"`. The inner pair is recognized when a
/// quote opens mid-string on a letter, closes within a short run, and yet
/// another quote still follows. Not guaranteed correct for adversarial input.
fn escape_stray_inner_quotes(t: &str) -> String {
    let chars: Vec<char> = t.chars().collect();
    let mut out = String::with_capacity(t.len() + 8);
    let mut in_string = false;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            out.push(c);
            if i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if c == '"' {
            if in_string {
                if let Some(close) = stray_inner_close(&chars, i) {
                    out.push_str("\\\"");
                    for &inner in &chars[i + 1..close] {
                        out.push(inner);
                    }
                    out.push_str("\\\"");
                    i = close + 1;
                    continue;
                }
                in_string = false;
            } else {
                in_string = true;
            }
            out.push('"');
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Find the closing quote of a stray inner pair opening at `open`, or `None`
/// when the quote at `open` should be treated as the real string terminator.
fn stray_inner_close(chars: &[char], open: usize) -> Option<usize> {
    let first = *chars.get(open + 1)?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    // short run only: mirrors the original's 20-char window
    let limit = (open + 22).min(chars.len().saturating_sub(1));
    let mut j = open + 2;
    while j <= limit {
        if chars[j] == '"' {
            // only a stray pair if the enclosing string still has a closer
            if chars[j + 1..].contains(&'"') {
                return Some(j);
            }
            return None;
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_json_passes_through_unchanged() {
        let text = r#"{"a": [1, 2.5, "x"], "b": null, "c": true}"#;
        let direct: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parse_loose(text).unwrap(), direct);
    }

    #[test]
    fn strict_array_passes_through_unchanged() {
        let text = r#"[1, "two", {"three": 3}]"#;
        let direct: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parse_loose(text).unwrap(), direct);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = "```json\n{title: 'A', // note\n tags: ['x','y',],}\n```";
        let once = sanitize_json_text(raw);
        let twice = sanitize_json_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn trailing_commas_and_bare_keys_repair() {
        let raw = "{title: 'A', tags: ['x','y',],}";
        let parsed = parse_loose(raw).unwrap();
        assert_eq!(parsed, json!({"title": "A", "tags": ["x", "y"]}));
    }

    #[test]
    fn fenced_block_parses_like_inner_content() {
        let inner = r#"{"caption": "best boy"}"#;
        let fenced = format!("```json\n{inner}\n```");
        assert_eq!(parse_loose(&fenced).unwrap(), parse_loose(inner).unwrap());
    }

    #[test]
    fn smart_quotes_are_folded() {
        let raw = "{\u{201c}disease\u{201d}: \u{2018}kennel cough\u{2019}}";
        let parsed = parse_loose(raw).unwrap();
        assert_eq!(parsed, json!({"disease": "kennel cough"}));
    }

    #[test]
    fn comments_are_stripped() {
        let raw = "{\n  \"a\": 1, // inline note\n  /* block\n  note */ \"b\": 2\n}";
        assert_eq!(parse_loose(raw).unwrap(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn balanced_object_extracted_from_prose() {
        let raw = "Sure! Here is the JSON you asked for: {\"ok\": true} Hope it helps.";
        assert_eq!(parse_loose(raw).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn repaired_array_is_wrapped_as_object() {
        let raw = "```\n['sit', 'stay',]\n```";
        let parsed = parse_loose(raw).unwrap();
        assert_eq!(parsed, json!({"_data": ["sit", "stay"]}));
    }

    #[test]
    fn stray_inner_quotes_are_escaped() {
        let raw = r#"{"note": "he said "hi" today", "ok": true}"#;
        let parsed = parse_loose(raw).unwrap();
        assert_eq!(parsed["note"], json!("he said \"hi\" today"));
        assert_eq!(parsed["ok"], json!(true));
    }

    #[test]
    fn exhaustion_reports_preview() {
        let err = parse_loose("not json at all {{{").unwrap_err();
        assert!(err.preview.contains("not json at all") || err.preview.contains("{{{"));
    }
}
