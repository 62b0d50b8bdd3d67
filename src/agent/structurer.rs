//! Structuring capability: raw search text → schema-shaped JSON.
//!
//! [`LlmStructurer`] asks a JSON-mode model to fill a JSON Schema generated
//! from the record types with `schemars`. [`decode_records`] turns the
//! returned value into typed records, tolerating the wrapper shapes models
//! commonly produce.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::config::AgentConfig;
use super::prompt::{build_extraction_prompt, build_extraction_system_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::ResearchRecord;
use crate::error::StructuringError;

/// Maximum records accepted per category.
pub const MAX_RECORDS_PER_CATEGORY: usize = 5;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)```").unwrap_or_else(|_| unreachable!())
});

/// JSON Schema for one category's output object.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    /// Property holding the record list (the category key).
    pub name: &'static str,
    /// The schema document.
    pub schema: Value,
}

impl SchemaDescriptor {
    /// Builds the `{ "<key>": [record, ...] }` schema for a record type.
    #[must_use]
    pub fn for_records<T: ResearchRecord>() -> Self {
        let name = T::CATEGORY.key();
        let mut item = serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null);
        if let Some(obj) = item.as_object_mut() {
            obj.remove("$schema");
        }

        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                name: {
                    "type": "array",
                    "maxItems": MAX_RECORDS_PER_CATEGORY,
                    "items": item,
                }
            },
            "required": [name],
        });

        Self { name, schema }
    }

    /// Pretty-printed schema for prompts.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Capability that structures raw text into a schema.
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Structures `raw_text` into a JSON value shaped by `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuringError`] when the model call fails or its
    /// output is not JSON.
    async fn structure(
        &self,
        instruction: &str,
        raw_text: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value, StructuringError>;
}

/// Agent that performs one extraction call.
struct ExtractionAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

#[async_trait]
impl Agent for ExtractionAgent {
    fn name(&self) -> &'static str {
        "extraction"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// [`Structurer`] backed by a JSON-mode language model.
pub struct LlmStructurer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    preamble: String,
}

impl LlmStructurer {
    /// Creates a structurer using the extraction model from `config`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig, preamble: String) -> Self {
        Self {
            provider,
            model: config.extraction_model.clone(),
            max_tokens: config.extraction_max_tokens,
            preamble,
        }
    }
}

impl std::fmt::Debug for LlmStructurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmStructurer")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Structurer for LlmStructurer {
    async fn structure(
        &self,
        instruction: &str,
        raw_text: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value, StructuringError> {
        let agent = ExtractionAgent {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system_prompt: build_extraction_system_prompt(
                &self.preamble,
                instruction,
                &schema.to_pretty_string(),
            ),
        };

        let response = agent
            .execute(&*self.provider, &build_extraction_prompt(raw_text))
            .await?;

        let truncated = response.finish_reason.as_deref() == Some("length");
        parse_json_value(&response.content).map_err(|e| {
            if truncated {
                StructuringError::InvalidJson {
                    message: format!(
                        "response truncated (max_tokens={}): {e}",
                        self.max_tokens
                    ),
                }
            } else {
                e
            }
        })
    }
}

/// Extracts the JSON payload from model output, tolerating code fences.
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str().trim())
}

/// Parses model output as JSON.
///
/// # Errors
///
/// Returns [`StructuringError::InvalidJson`] when the content is not JSON.
pub fn parse_json_value(content: &str) -> Result<Value, StructuringError> {
    let json_str = strip_code_fences(content);
    serde_json::from_str(json_str).map_err(|e| {
        let preview: String = json_str.chars().take(200).collect();
        StructuringError::InvalidJson {
            message: format!(
                "{e}. Response length: {} bytes, preview: {preview:?}",
                json_str.len()
            ),
        }
    })
}

/// Decodes a structured value into records.
///
/// Accepts `{"<key>": [...]}`, a bare array, an object whose only array
/// property holds the records, or a single record object. Items that do
/// not deserialize are dropped; blank identities are dropped; the result
/// is capped at [`MAX_RECORDS_PER_CATEGORY`].
///
/// # Errors
///
/// Returns [`StructuringError::SchemaMismatch`] when no record list can be
/// found, or when items were present but none of them were valid.
pub fn decode_records<T: ResearchRecord>(
    value: Value,
    schema: &SchemaDescriptor,
) -> Result<Vec<T>, StructuringError> {
    let mismatch = |message: String| StructuringError::SchemaMismatch {
        schema: schema.name.to_string(),
        message,
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(Value::Array(items)) = obj.remove(schema.name) {
                items
            } else {
                let arrays: Vec<&Vec<Value>> = obj.values().filter_map(Value::as_array).collect();
                let single = match arrays.as_slice() {
                    [items] => Some((*items).clone()),
                    _ => None,
                };
                match single {
                    Some(items) => items,
                    None => match serde_json::from_value::<T>(Value::Object(obj)) {
                        Ok(record) => return Ok(sanitize(vec![record])),
                        Err(e) => {
                            return Err(mismatch(format!("no `{}` list: {e}", schema.name)));
                        }
                    },
                }
            }
        }
        Value::Null => Vec::new(),
        other => return Err(mismatch(format!("unexpected JSON type: {other}"))),
    };

    let total = items.len();
    let mut last_error = None;
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                last_error = Some(e.to_string());
                None
            }
        })
        .collect();

    if records.is_empty()
        && let Some(e) = last_error
    {
        return Err(mismatch(format!("all {total} items invalid: {e}")));
    }
    if records.len() < total {
        debug!(
            schema = schema.name,
            dropped = total - records.len(),
            "dropped invalid records"
        );
    }

    Ok(sanitize(records))
}

fn sanitize<T: ResearchRecord>(mut records: Vec<T>) -> Vec<T> {
    records.retain(|r| !r.identity().trim().is_empty());
    records.truncate(MAX_RECORDS_PER_CATEGORY);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventOption, FlightOption};

    fn flights_schema() -> SchemaDescriptor {
        SchemaDescriptor::for_records::<FlightOption>()
    }

    #[test]
    fn test_schema_shape() {
        let schema = flights_schema();
        assert_eq!(schema.name, "flights");
        let list = &schema.schema["properties"]["flights"];
        assert_eq!(list["maxItems"], 5);
        assert!(list["items"]["properties"]["airline"].is_object());
        assert!(list["items"].get("$schema").is_none());
        let required = list["items"]["required"].as_array().cloned().unwrap_or_default();
        assert!(required.contains(&Value::from("airline")));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("Here:\n```\n[]\n```\nDone"), "[]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_value_invalid() {
        let err = parse_json_value("I could not find any flights.");
        assert!(matches!(err, Err(StructuringError::InvalidJson { .. })));
    }

    #[test]
    fn test_decode_wrapped_list() {
        let value = serde_json::json!({
            "flights": [
                {"airline": "Air France", "price": 540},
                {"airline": "Delta", "price": "$610"}
            ]
        });
        let records: Vec<FlightOption> =
            decode_records(value, &flights_schema()).unwrap_or_default();
        assert_eq!(records.len(), 2);
        assert!((records[1].price - 610.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_alternate_wrapper_and_bare_array() {
        let wrapped = serde_json::json!({"results": [{"airline": "KLM", "price": 0}]});
        let records: Vec<FlightOption> =
            decode_records(wrapped, &flights_schema()).unwrap_or_default();
        assert_eq!(records.len(), 1);

        let bare = serde_json::json!([{"airline": "KLM", "price": 300}]);
        let records: Vec<FlightOption> = decode_records(bare, &flights_schema()).unwrap_or_default();
        assert_eq!(records[0].airline, "KLM");
    }

    #[test]
    fn test_decode_drops_invalid_and_blank() {
        let value = serde_json::json!({
            "flights": [
                {"airline": "Air France"},
                {"airline": "  ", "price": 100},
                {"airline": "Delta", "price": 610}
            ]
        });
        let records: Vec<FlightOption> =
            decode_records(value, &flights_schema()).unwrap_or_default();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].airline, "Delta");
    }

    #[test]
    fn test_decode_all_invalid_is_mismatch() {
        let value = serde_json::json!({"flights": [{"airline": "Air France"}]});
        let result: Result<Vec<FlightOption>, _> = decode_records(value, &flights_schema());
        assert!(matches!(result, Err(StructuringError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_decode_truncates_to_five() {
        let items: Vec<Value> = (0..8)
            .map(|i| serde_json::json!({"name": format!("Event {i}"), "location": "Paris"}))
            .collect();
        let value = serde_json::json!({ "events": items });
        let schema = SchemaDescriptor::for_records::<EventOption>();
        let records: Vec<EventOption> = decode_records(value, &schema).unwrap_or_default();
        assert_eq!(records.len(), MAX_RECORDS_PER_CATEGORY);
        assert_eq!(records[0].name, "Event 0");
    }

    #[test]
    fn test_decode_empty_list_is_ok() {
        let value = serde_json::json!({"flights": []});
        let result: Result<Vec<FlightOption>, _> = decode_records(value, &flights_schema());
        assert!(result.is_ok_and(|r| r.is_empty()));
    }
}
