//! Pulls a recipe out of free-form model output.
//!
//! The model is asked for bare JSON but routinely wraps it in prose or a
//! markdown fence, and sometimes leaves trailing commas behind. Extraction is
//! tolerant of that packaging and strict about content: a reply either yields a
//! complete [`RecipeDraft`] or an [`ExtractionError`], never a partial record.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

lazy_static! {
    static ref FENCED_JSON_RE: Regex = Regex::new(r"(?i)```json\s*([\s\S]*?)\s*```").unwrap();
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
}

/// Recipe as proposed by the model, after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeField {
    Title,
    Description,
    Ingredients,
    Instructions,
    PrepTime,
}

impl RecipeField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Ingredients => "ingredients",
            Self::Instructions => "instructions",
            Self::PrepTime => "prep_time",
        }
    }
}

impl fmt::Display for RecipeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("JSON object in model output is malformed: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` {problem}")]
pub struct ValidationError {
    pub field: RecipeField,
    pub problem: &'static str,
}

impl ValidationError {
    pub fn new(field: RecipeField, problem: &'static str) -> Self {
        Self { field, problem }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Extracts and validates a recipe from raw model output.
pub fn extract_recipe(text: &str) -> Result<RecipeDraft, ExtractionError> {
    let object = extract_json_object(text)?;
    Ok(validate_recipe(&object)?)
}

/// Finds the first recoverable JSON object in `text`.
///
/// Attempts, in order: a ```` ```json ```` fenced block, the span from the first
/// `{` to the last `}`, and that same span with trailing commas removed.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    for caps in FENCED_JSON_RE.captures_iter(text) {
        let body = caps.get(1).map_or("", |m| m.as_str());
        if let Ok(object) = serde_json::from_str::<Map<String, Value>>(body) {
            debug!("recipe json taken from fenced block");
            return Ok(object);
        }
    }

    let span = brace_span(text).ok_or(ParseError::NoJsonObject)?;
    let first_err = match serde_json::from_str::<Map<String, Value>>(span) {
        Ok(object) => {
            debug!("recipe json taken from brace span");
            return Ok(object);
        }
        Err(e) => e,
    };

    let repaired = TRAILING_COMMA_RE.replace_all(span, "$1");
    match serde_json::from_str::<Map<String, Value>>(&repaired) {
        Ok(object) => {
            debug!(parse_error = %first_err, "recipe json recovered after trailing-comma repair");
            Ok(object)
        }
        Err(e) => Err(ParseError::InvalidJson(e.to_string())),
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Checks a parsed object against the recipe schema. Fields are checked in
/// declaration order and the first failure is reported.
pub fn validate_recipe(object: &Map<String, Value>) -> Result<RecipeDraft, ValidationError> {
    Ok(RecipeDraft {
        title: non_empty_string(object, RecipeField::Title)?,
        description: non_empty_string(object, RecipeField::Description)?,
        ingredients: non_empty_list(object, RecipeField::Ingredients)?,
        instructions: non_empty_list(object, RecipeField::Instructions)?,
        prep_time: string(object, RecipeField::PrepTime)?,
    })
}

fn string(object: &Map<String, Value>, field: RecipeField) -> Result<String, ValidationError> {
    match object.get(field.key()) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "is missing")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
    }
}

fn non_empty_string(
    object: &Map<String, Value>,
    field: RecipeField,
) -> Result<String, ValidationError> {
    let s = string(object, field)?;
    if s.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(s)
}

fn non_empty_list(
    object: &Map<String, Value>,
    field: RecipeField,
) -> Result<Vec<String>, ValidationError> {
    let items = match object.get(field.key()) {
        None | Some(Value::Null) => return Err(ValidationError::new(field, "is missing")),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::new(field, "must be an array")),
    };
    if items.is_empty() {
        return Err(ValidationError::new(field, "must have at least one element"));
    }
    // Non-string entries (e.g. {"item": .., "qty": ..}) are kept as their JSON text.
    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}
