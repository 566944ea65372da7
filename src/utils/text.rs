use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Coerce a loosely-typed provider value into a probability in [0, 1].
/// Numbers and numeric strings are accepted; anything else is the default.
pub fn clamp01_or(v: Option<&Value>, default: f64) -> f64 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f.clamp(0.0, 1.0),
        _ => default,
    }
}

pub fn clamp01(v: Option<&Value>) -> f64 {
    clamp01_or(v, 0.0)
}

/// Char-boundary-safe truncation.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Pull a string field out of a provider object, defaulted and length-capped.
pub fn str_field(obj: &Value, key: &str, default: &str, max: usize) -> String {
    let raw = match &obj[key] {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if raw.is_empty() {
        default.to_string()
    } else {
        truncate_chars(&raw, max)
    }
}

/// Provider arrays of "mostly strings": stringify each item, cap item length
/// and item count.
pub fn string_list(v: &Value, max_items: usize, max_len: usize) -> Vec<String> {
    v.as_array()
        .map(|arr| {
            arr.iter()
                .map(|x| match x {
                    Value::String(s) => truncate_chars(s, max_len),
                    other => truncate_chars(&other.to_string(), max_len),
                })
                .take(max_items)
                .collect()
        })
        .unwrap_or_default()
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// URL-safe slug, never empty.
pub fn slug(s: &str) -> String {
    let lowered = s.to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    let trimmed = dashed.trim_matches('-');
    if trimmed.is_empty() {
        "pet".into()
    } else {
        trimmed.to_string()
    }
}

/// Canonical breed name: lowercase, parentheticals removed, spaces collapsed.
pub fn canonical(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = PARENTHETICAL.replace_all(&lowered, "");
    MULTI_SPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Lenient integer parse for budget-style input ("6,000" → 6000).
pub fn parse_int_loose(s: &str) -> i64 {
    s.replace(',', "")
        .trim()
        .parse::<f64>()
        .map(|f| f as i64)
        .unwrap_or(0)
}
