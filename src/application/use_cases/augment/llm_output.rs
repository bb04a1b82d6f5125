//! Escalating-leniency JSON decoding for provider replies.
//!
//! Providers return anything from clean JSON to fenced markdown with prose,
//! trailing commas, or pseudo-code string expressions. Each rung of the
//! ladder is cheap and strictly more permissive than the previous one; the
//! original reply is never mutated in place.

use crate::domain::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap());

static TRAILING_COMMA_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

static STRING_MULTIPLICATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"\s*\*\s*(\d+)"#).unwrap());

const EXPANSION_CAP: usize = 10_000;

/// Decodes a provider reply into `T`, escalating through: strict parse,
/// fence stripping, bracket-span extraction, then heuristic repairs.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str(&unfenced) {
        return Ok(value);
    }

    let span = extract_json_span(&unfenced).unwrap_or(unfenced.as_str());
    if let Ok(value) = serde_json::from_str(span) {
        return Ok(value);
    }

    let repaired = repair(span);
    if let Ok(value) = serde_json::from_str(&repaired) {
        return Ok(value);
    }

    let requoted = fix_unescaped_quotes(&repaired);
    serde_json::from_str(&requoted).map_err(|e| {
        AppError::ParseError(format!("Unparseable model output after repairs: {}", e))
    })
}

/// Returns the body of the first fenced block, or the input untouched.
fn strip_code_fences(text: &str) -> String {
    match FENCE_PATTERN.captures(text) {
        Some(captures) => captures[1].trim().to_string(),
        None => text.to_string(),
    }
}

/// Greedy span from the first opening bracket to the last matching closer,
/// which drops prose before and after the payload.
fn extract_json_span(text: &str) -> Option<&str> {
    let array_start = text.find('[');
    let object_start = text.find('{');
    let (start, closer) = match (array_start, object_start) {
        (Some(a), Some(o)) if a < o => (a, ']'),
        (Some(a), None) => (a, ']'),
        (_, Some(o)) => (o, '}'),
        (None, None) => return None,
    };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn repair(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    let expanded = expand_string_multiplication(&cleaned);
    TRAILING_COMMA_PATTERN
        .replace_all(&expanded, "$1")
        .into_owned()
}

/// Rewrites pseudo-code like `"x" * 10000` into the literal repeated string,
/// capped so a hostile count cannot balloon memory.
fn expand_string_multiplication(text: &str) -> String {
    STRING_MULTIPLICATION_PATTERN
        .replace_all(text, |captures: &regex::Captures| {
            let unit = &captures[1];
            let count: usize = captures[2].parse().unwrap_or(1);
            let repeats = if unit.is_empty() {
                0
            } else {
                count.min(EXPANSION_CAP / unit.len().max(1))
            };
            format!("\"{}\"", unit.repeat(repeats))
        })
        .into_owned()
}

/// Escapes stray interior quotes. A quote inside a string is treated as
/// closing only when the next non-whitespace character is structural JSON.
/// Last-resort rung: it can mangle exotic but valid inputs, so it runs only
/// after every stricter attempt has failed.
fn fix_unescaped_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string && c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == '"' {
            if !in_string {
                in_string = true;
                out.push(c);
            } else {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let closes = j >= chars.len() || matches!(chars[j], ',' | ':' | '}' | ']');
                if closes {
                    in_string = false;
                    out.push(c);
                } else {
                    out.push('\\');
                    out.push('"');
                }
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}
