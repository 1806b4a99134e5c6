//! Recovers the question list from free-form model output.
//!
//! The model is asked for bare JSON but often wraps it in a markdown fence
//! or surrounds it with prose. Extraction is purely lexical: a fenced block
//! wins, then a bare top-level array, otherwise the span from the first `{`
//! to the last `}` is used.
//! Braces inside string literals or in surrounding prose are not special
//! cased, so text holding several independent objects will not parse.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::error::{ExtractError, Result};
use super::types::QuestionRecord;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```json\r?\n([\s\S]*?)\r?\n```").expect("JSON fence pattern is valid")
});

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([\s\S]*?)```").expect("fence pattern is valid"));

/// Where the JSON candidate was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    JsonFence,
    AnyFence,
    BareArray,
    BraceSpan,
    WholeText,
}

/// Pick the substring most likely to hold the JSON payload.
pub fn candidate_json(text: &str) -> (CandidateSource, &str) {
    if let Some(inner) = JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
        return (CandidateSource::JsonFence, inner.as_str());
    }
    if let Some(inner) = ANY_FENCE.captures(text).and_then(|c| c.get(1)) {
        return (CandidateSource::AnyFence, inner.as_str());
    }
    // The brace span would cut a bare array down to its first and last element
    if text.trim_start().starts_with('[') {
        return (CandidateSource::BareArray, text);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return (CandidateSource::BraceSpan, &text[start..=end]);
        }
    }
    (CandidateSource::WholeText, text)
}

/// Parse the JSON payload out of model output.
pub fn extract_payload(text: &str) -> Result<Value> {
    let (source, candidate) = candidate_json(text);
    debug!(?source, len = candidate.len(), "Parsing JSON candidate");
    serde_json::from_str(candidate.trim()).map_err(ExtractError::InvalidJson)
}

/// Shape of the parsed payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Sequence(Vec<Value>),
    KeyedObject(Map<String, Value>),
    Scalar(Value),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::Sequence(items),
            Value::Object(map) => Payload::KeyedObject(map),
            other => Payload::Scalar(other),
        }
    }
}

type Lookup = fn(&Map<String, Value>) -> Option<&Vec<Value>>;

/// Tried in order on a keyed object; the first hit is the question list
const LOOKUPS: &[(&str, Lookup)] = &[
    ("first-sequence-property", first_sequence_property),
    ("questions", questions_property),
    ("data", data_property),
];

fn first_sequence_property(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.values().find_map(Value::as_array)
}

fn questions_property(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.get("questions").and_then(Value::as_array)
}

fn data_property(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.get("data").and_then(Value::as_array)
}

/// Select the question sequence from a parsed payload.
pub fn select_questions(payload: Payload) -> Vec<Value> {
    match payload {
        Payload::Sequence(items) => items,
        Payload::KeyedObject(map) => LOOKUPS
            .iter()
            .find_map(|(name, lookup)| {
                lookup(&map).map(|items| {
                    debug!(lookup = *name, count = items.len(), "Selected question sequence");
                    items.clone()
                })
            })
            .unwrap_or_else(|| {
                warn!("No question sequence found in model output object");
                Vec::new()
            }),
        Payload::Scalar(value) => {
            warn!(%value, "Model output is neither a sequence nor an object");
            Vec::new()
        }
    }
}

/// Extract and select the questions in one model completion.
///
/// Only unparseable output is an error. A count different from `expected`
/// is logged, never corrected, and an item without an id, a known type or
/// a question text is logged and skipped.
pub fn parse_questions(text: &str, expected: usize) -> Result<Vec<QuestionRecord>> {
    let items = select_questions(Payload::from(extract_payload(text)?));

    if items.len() != expected {
        warn!(
            produced = items.len(),
            requested = expected,
            "Question count does not match the request"
        );
    }

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<QuestionRecord>(item) {
            Ok(question) => questions.push(question),
            Err(e) => warn!(index, "Skipping question outside the schema: {}", e),
        }
    }
    Ok(questions)
}
