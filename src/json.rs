//! JSON payload flattening
//!
//! Nested objects are walked depth first and their keys joined with `.`.
//! Anything that is not an object is a leaf, arrays included: a nested
//! array is rendered as one comma-joined value rather than expanded per
//! element.
//!
//! Keys are visited the way `Object.entries` lists them: integer-like keys
//! first in ascending numeric order, then the rest in document order.

use serde_json::{Map, Number, Value};

/// Separator between parent and child keys
pub const KEY_SEPARATOR: char = '.';

/// Parse `text` and flatten it when it is a JSON object or array.
///
/// Returns `None` for invalid JSON and for bare scalars.
pub fn parse_structured(text: &str) -> Option<Vec<(String, String)>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(flatten_object(&map)),
        Value::Array(items) => Some(flatten_array(&items)),
        _ => None,
    }
}

/// Flatten the entries of an object into `key.path` / value pairs
pub fn flatten_object(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in entries(map) {
        flatten_into(&mut out, key, value);
    }
    out
}

/// Flatten a top-level array, using element indices as keys
pub fn flatten_array(items: &[Value]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (index, value) in items.iter().enumerate() {
        flatten_into(&mut out, &index.to_string(), value);
    }
    out
}

fn flatten_into(out: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (child, nested) in entries(map) {
                let path = format!("{}{}{}", key, KEY_SEPARATOR, child);
                flatten_into(out, &path, nested);
            }
        }
        leaf => push_unique(out, key.to_string(), stringify(leaf)),
    }
}

/// Object entries with array-index keys first, ascending
fn entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    // Stable sort keeps document order among the non-index keys
    entries.sort_by_key(|(key, _)| array_index(key).unwrap_or(u64::MAX));
    entries
}

/// Canonical array index: digits without a leading zero, below 2^32 - 1
fn array_index(key: &str) -> Option<u64> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u64>().ok().filter(|&i| i < u64::from(u32::MAX))
}

// A flattened path can collide with a literal dotted key; the later value
// replaces the earlier one in place.
fn push_unique(out: &mut Vec<(String, String)>, key: String, value: String) {
    match out.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => out.push((key, value)),
    }
}

/// Render a leaf value the way a browser's `String(value)` would
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_array(items),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            other => stringify(other),
        })
        .collect::<Vec<_>>()
        .join(",")
}

// Integers beyond 2^53 lose precision in a browser, so they go through
// the float path like everything else.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        if (i.unsigned_abs() as f64) <= MAX_SAFE_INTEGER {
            return i.to_string();
        }
    }
    match n.as_f64() {
        Some(f) => format_f64(f),
        None => n.to_string(),
    }
}

/// ECMAScript `Number::toString`: plain digits for 1e-6 <= |f| < 1e21,
/// exponent notation (`1e+21`, `1e-7`) outside that range
fn format_f64(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if f < 0.0 { "-" } else { "" };
    // Shortest round-trip digits, e.g. "1.2345e2"
    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let exp_sign = if n - 1 >= 0 { "+" } else { "-" };
        if rest.is_empty() {
            format!("{}e{}{}", first, exp_sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, exp_sign, (n - 1).abs())
        }
    };

    format!("{}{}", sign, body)
}
