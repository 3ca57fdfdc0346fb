//! Recovery of a JSON object from free-form model output.
//!
//! Generated text often wraps the payload in prose or a markdown fence, so
//! extraction is done in two stages:
//!
//! 1. the first ```` ```json ```` fenced block whose body is an object,
//! 2. otherwise everything from the first `{` to the last `}`.
//!
//! Neither stage balances braces. Several objects in one response, or braces
//! inside string values outside a fence, can produce a span that does not
//! parse; that surfaces as [`ExtractError::JsonParse`].

use crate::error::ExtractError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;

/// Where a JSON candidate was found in a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonCandidate<'a> {
    Fenced(&'a str),
    BraceSpan(&'a str),
    NotFound,
}

impl<'a> JsonCandidate<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Fenced(s) | Self::BraceSpan(s) => Some(s),
            Self::NotFound => None,
        }
    }
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)```json\n(\{.*?\})\n```").expect("fence pattern is valid"))
}

/// Body of the first `json` fenced block, if any.
pub fn find_fenced(text: &str) -> Option<&str> {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Widest span from the first `{` to the last `}`, inclusive.
pub fn find_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

pub fn locate_json(text: &str) -> JsonCandidate<'_> {
    if let Some(body) = find_fenced(text) {
        return JsonCandidate::Fenced(body);
    }
    match find_brace_span(text) {
        Some(span) => JsonCandidate::BraceSpan(span),
        None => JsonCandidate::NotFound,
    }
}

/// Parses the located candidate. A fenced block that fails to parse is an
/// error; the brace span is only tried when there is no fence at all.
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    let candidate = locate_json(text)
        .as_str()
        .ok_or(ExtractError::NoJsonFound)?;
    Ok(serde_json::from_str(candidate)?)
}

/// Like [`extract_json`] but decodes into `T`. A payload missing required
/// keys is reported as [`ExtractError::JsonParse`].
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let value = extract_json(text)?;
    Ok(serde_json::from_value(value)?)
}
