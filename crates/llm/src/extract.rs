//! Lenient extraction of a JSON string list from model output.
//!
//! Query-generation and style prompts instruct the model to answer with a
//! JSON array of strings, but models wrap arrays in markdown fences or
//! surround them with prose often enough that strict parsing of the whole
//! reply is useless. The extractor locates the bracketed array inside the
//! reply and parses that.

use serde_json::Value;

use crate::error::LlmError;
use crate::Result;

/// Pull a `Vec<String>` out of a model reply.
///
/// Accepts the array bare, inside a ``` / ```json fence, or embedded in
/// surrounding prose. Non-string entries inside the array are skipped.
/// A reply containing no array at all is a [`LlmError::ResponseFormat`].
pub fn extract_string_list(text: &str) -> Result<Vec<String>> {
    let candidate = strip_fences(text);

    let start = candidate
        .find('[')
        .ok_or_else(|| format_err(text, "no JSON array found"))?;
    let end = candidate
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| format_err(text, "unterminated JSON array"))?;

    let value: Value = serde_json::from_str(&candidate[start..=end])
        .map_err(|e| format_err(text, &format!("array did not parse: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(format_err(text, "expected a JSON array")),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => {
                let s = s.trim().to_string();
                (!s.is_empty()).then_some(s)
            }
            _ => None,
        })
        .collect())
}

/// Drop a single surrounding markdown fence if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Optional language tag on the opening fence.
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(inner) = rest.trim_start().strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

fn format_err(text: &str, reason: &str) -> LlmError {
    let preview: String = text.chars().take(120).collect();
    LlmError::ResponseFormat(format!("{reason}; reply started with: {preview:?}"))
}
