//! Turns an analysis response into result cards.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use shared::protocol::AnalysisResult;

pub const ERROR_CARD_TITLE: &str = "Analysis Failed";
pub const DOWNLOAD_IMAGE_LABEL: &str = "Download Image";

/// Strings must be longer than this to be considered inline images.
const IMAGE_MIN_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum CardBody {
    /// Base64 PNG data as received (trimmed). Decoding may still fail; the
    /// front-end shows a broken image in that case.
    Image { base64: String, download_name: String },
    /// Pretty-printed JSON for objects, arrays and null.
    Preformatted(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub key: String,
    pub title: String,
    pub body: CardBody,
}

impl ResultCard {
    pub fn is_image(&self) -> bool {
        matches!(self.body, CardBody::Image { .. })
    }
}

impl CardBody {
    pub fn decode_image(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        match self {
            Self::Image { base64, .. } => Some(STANDARD.decode(base64)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCard {
    pub title: &'static str,
    pub message: String,
}

impl ErrorCard {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: ERROR_CARD_TITLE,
            message: message.into(),
        }
    }
}

/// Cards follow the response's key order. A browser walking the same object
/// would list integer-like keys first in ascending order; this does not.
pub fn render_results(result: &AnalysisResult) -> Vec<ResultCard> {
    result
        .iter()
        .map(|(key, value)| render_card(key, value))
        .collect()
}

pub fn render_card(key: &str, value: &Value) -> ResultCard {
    let body = match value {
        Value::String(text) if is_base64_image(text) => CardBody::Image {
            base64: text.trim().to_string(),
            download_name: format!("{key}.png"),
        },
        Value::Object(_) | Value::Array(_) | Value::Null => {
            CardBody::Preformatted(
                serde_json::to_string_pretty(&integral_floats_as_ints(value)).unwrap_or_default(),
            )
        }
        Value::String(text) => CardBody::Text(text.clone()),
        Value::Number(number) => CardBody::Text(number_text(number)),
        Value::Bool(flag) => CardBody::Text(flag.to_string()),
    };

    ResultCard {
        key: key.to_string(),
        title: title_from_key(key),
        body,
    }
}

/// `edge_count` -> `Edge Count`. Underscores become spaces and every letter
/// that starts a word is upper-cased; the rest of the key is kept as is.
pub fn title_from_key(key: &str) -> String {
    let mut title = String::with_capacity(key.len());
    let mut prev_is_word = false;
    for ch in key.chars() {
        let is_word = ch.is_ascii_alphanumeric();
        if ch == '_' {
            title.push(' ');
        } else if is_word && !prev_is_word {
            title.push(ch.to_ascii_uppercase());
        } else {
            title.push(ch);
        }
        prev_is_word = is_word;
    }
    title
}

/// Length and charset test only; the payload is never decoded here.
pub fn is_base64_image(text: &str) -> bool {
    if text.len() <= IMAGE_MIN_LEN {
        return false;
    }
    let trimmed = text.trim();
    let body = trimmed.trim_end_matches('=');
    let padding = trimmed.len() - body.len();
    padding <= 2
        && !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

fn integral_float(number: &serde_json::Number) -> Option<f64> {
    let float = number.as_f64().filter(|_| number.is_f64())?;
    // `-0.0 + 0.0` is `+0.0`, so negative zero prints as `0`
    (float.fract() == 0.0 && float.abs() < 1e21).then_some(float + 0.0)
}

fn number_text(number: &serde_json::Number) -> String {
    match integral_float(number) {
        Some(float) => format!("{float:.0}"),
        None => number.to_string(),
    }
}

/// Copy of `value` with integral floats (`2.0`) turned into integers so
/// nested numbers print like top-level ones. Values outside the `i64`
/// range keep their float form.
fn integral_floats_as_ints(value: &Value) -> Value {
    match value {
        Value::Number(number) => integral_float(number)
            .filter(|float| *float >= i64::MIN as f64 && *float < i64::MAX as f64)
            .map(|float| Value::from(float as i64))
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(integral_floats_as_ints).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), integral_floats_as_ints(item)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
