//! Tolerant deserialization of descriptor lists, attribute values and
//! callback responses.
//!
//! The entry points take a `&serde_json::Value`. Document-level problems
//! (wrong top-level shape) are errors; problems with an individual
//! descriptor are recorded in [`ParsedDescriptors::rejected`] and the
//! descriptor is skipped, so siblings still render.

use crate::types::*;
use std::collections::BTreeSet;
use std::fmt;

/// Errors during interchange JSON deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// The document does not have the expected top-level shape.
    InvalidDocument(String),
    /// An attribute value entry could not be read.
    ValueError { name: String, message: String },
    /// A callback response could not be interpreted.
    InvalidResponse(String),
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::InvalidDocument(msg) => write!(f, "invalid document: {}", msg),
            InterchangeError::ValueError { name, message } => {
                write!(f, "attribute '{}': {}", name, message)
            }
            InterchangeError::InvalidResponse(msg) => {
                write!(f, "invalid callback response: {}", msg)
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// A descriptor that was skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDescriptor {
    /// Position in the source array.
    pub index: usize,
    /// Name, when one could be read.
    pub name: Option<String>,
    pub reason: String,
}

/// Result of parsing a descriptor list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDescriptors {
    pub descriptors: Vec<AttributeDescriptor>,
    pub rejected: Vec<RejectedDescriptor>,
}

/// Parse a descriptor list.
///
/// Accepts either a bare array or an object with a `descriptors` array.
/// Entries that are not objects, lack a name, fail to deserialize, or
/// repeat an earlier name are rejected individually.
pub fn parse_descriptors(doc: &serde_json::Value) -> Result<ParsedDescriptors, InterchangeError> {
    let arr = match doc {
        serde_json::Value::Array(arr) => arr,
        serde_json::Value::Object(obj) => obj
            .get("descriptors")
            .and_then(|d| d.as_array())
            .ok_or_else(|| {
                InterchangeError::InvalidDocument("missing 'descriptors' array".to_string())
            })?,
        _ => {
            return Err(InterchangeError::InvalidDocument(
                "expected an array of attribute descriptors".to_string(),
            ))
        }
    };
    Ok(parse_descriptor_array(arr))
}

fn parse_descriptor_array(arr: &[serde_json::Value]) -> ParsedDescriptors {
    let mut parsed = ParsedDescriptors::default();
    let mut seen = BTreeSet::new();

    for (index, obj) in arr.iter().enumerate() {
        let name = obj
            .get("name")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        if !obj.is_object() {
            parsed.rejected.push(RejectedDescriptor {
                index,
                name,
                reason: "descriptor is not an object".to_string(),
            });
            continue;
        }
        let Some(ref n) = name else {
            parsed.rejected.push(RejectedDescriptor {
                index,
                name: None,
                reason: "missing 'name' field".to_string(),
            });
            continue;
        };
        if n.is_empty() {
            parsed.rejected.push(RejectedDescriptor {
                index,
                name,
                reason: "empty 'name' field".to_string(),
            });
            continue;
        }
        if seen.contains(n) {
            parsed.rejected.push(RejectedDescriptor {
                index,
                name,
                reason: "duplicate attribute name".to_string(),
            });
            continue;
        }

        match serde_json::from_value::<AttributeDescriptor>(obj.clone()) {
            Ok(descriptor) => {
                seen.insert(n.clone());
                parsed.descriptors.push(descriptor);
            }
            Err(e) => parsed.rejected.push(RejectedDescriptor {
                index,
                name,
                reason: e.to_string(),
            }),
        }
    }

    parsed
}

/// Parse existing attribute values (`AttributeResponseModel[]`).
pub fn parse_attribute_values(
    doc: &serde_json::Value,
) -> Result<Vec<AttributeResponseModel>, InterchangeError> {
    let arr = doc.as_array().ok_or_else(|| {
        InterchangeError::InvalidDocument("expected an array of attribute values".to_string())
    })?;

    arr.iter()
        .map(|v| {
            serde_json::from_value::<AttributeResponseModel>(v.clone()).map_err(|e| {
                InterchangeError::ValueError {
                    name: v
                        .get("name")
                        .and_then(|n| n.as_str())
                        .unwrap_or("<unnamed>")
                        .to_string(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// Interpret a raw callback response.
///
/// An array whose entries all look like descriptors (objects carrying
/// `name` and `contentType`) is a group expansion; anything else is
/// content. Bare scalars are wrapped as `{data}` and a single object is
/// treated as a one-element list.
pub fn parse_callback_response(
    doc: &serde_json::Value,
) -> Result<CallbackResponse, InterchangeError> {
    let items: Vec<serde_json::Value> = match doc {
        serde_json::Value::Array(arr) => arr.clone(),
        serde_json::Value::Null => {
            return Err(InterchangeError::InvalidResponse(
                "empty response body".to_string(),
            ))
        }
        other => vec![other.clone()],
    };

    let looks_like_descriptor = |v: &serde_json::Value| {
        v.get("name").is_some() && v.get("contentType").is_some() && v.get("data").is_none()
    };

    if !items.is_empty() && items.iter().all(looks_like_descriptor) {
        return Ok(CallbackResponse::Descriptors(parse_descriptor_array(
            &items,
        )));
    }

    let mut content = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::Object(ref obj) if obj.contains_key("data") => {
                let c = serde_json::from_value::<AttributeContent>(item.clone())
                    .map_err(|e| InterchangeError::InvalidResponse(e.to_string()))?;
                content.push(c);
            }
            serde_json::Value::Object(_) => {
                return Err(InterchangeError::InvalidResponse(
                    "mixed descriptors and content in one response".to_string(),
                ))
            }
            scalar => content.push(AttributeContent::new(scalar)),
        }
    }
    Ok(CallbackResponse::Content(content))
}

// ── Tests ───────────────────────────────────────────────────────────
