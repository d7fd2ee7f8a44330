//! Content types spread over several form paths: File, Secret, Codeblock.

use attrform_interchange::{AttributeContent, AttributeDescriptor, ContentType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Map, Value};

use super::{ContentContext, ContentHandler, Control};
use crate::constraints::Validator;
use crate::error::CollectError;
use crate::paths::{
    FieldPath, CODE_LANGUAGE, CODE_TEXT_AREA, FILE_CONTENT, FILE_MIME_TYPE, FILE_NAME,
    SECRET_PROTECTION_LEVEL,
};
use crate::values::{first_text, FormState};

const DEFAULT_LANGUAGE: &str = "plaintext";

fn data_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn first_data(content: &[AttributeContent]) -> Option<&Map<String, Value>> {
    content.first().and_then(|c| c.data.as_object())
}

/// Default content's value for `key`, used when the form has none.
fn default_str(descriptor: &AttributeDescriptor, key: &str) -> Option<String> {
    descriptor
        .default_content()
        .first()
        .and_then(|c| data_str(&c.data, key).map(str::to_string))
}

// ── File ────────────────────────────────────────────────────────────

pub(crate) struct FileHandler;

impl ContentHandler for FileHandler {
    fn content_type(&self) -> ContentType {
        ContentType::File
    }

    fn control(&self, _descriptor: &AttributeDescriptor) -> Control {
        Control::FileDrop
    }

    fn paths(&self, path: &FieldPath) -> Vec<String> {
        vec![
            path.part(FILE_CONTENT),
            path.part(FILE_NAME),
            path.part(FILE_MIME_TYPE),
        ]
    }

    fn value_path(&self, path: &FieldPath) -> String {
        path.part(FILE_CONTENT)
    }

    fn input_validator(&self, _descriptor: &AttributeDescriptor) -> Option<Validator> {
        Some(Validator::Base64)
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        _descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        let Some(data) = first_data(content) else {
            return vec![];
        };
        [FILE_CONTENT, FILE_NAME, FILE_MIME_TYPE]
            .into_iter()
            .filter_map(|part| {
                data.get(part)
                    .and_then(Value::as_str)
                    .map(|s| (path.part(part), Value::String(s.to_string())))
            })
            .collect()
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        let Some(content) = first_text(state.get(&path.part(FILE_CONTENT))) else {
            return Ok(None);
        };
        let content = content.trim().to_string();
        if let Err(e) = BASE64.decode(&content) {
            return Err(CollectError::Encoding {
                name: descriptor.name.clone(),
                message: format!("file content is not base64: {}", e),
            });
        }
        let file_name = first_text(state.get(&path.part(FILE_NAME))).unwrap_or_default();
        let mime_type = first_text(state.get(&path.part(FILE_MIME_TYPE))).unwrap_or_default();
        Ok(Some(vec![AttributeContent::new(json!({
            FILE_CONTENT: content,
            FILE_NAME: file_name,
            FILE_MIME_TYPE: mime_type,
        }))]))
    }
}

// ── Secret ──────────────────────────────────────────────────────────

pub(crate) struct SecretHandler;

impl ContentHandler for SecretHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Secret
    }

    fn control(&self, _descriptor: &AttributeDescriptor) -> Control {
        Control::Password
    }

    fn paths(&self, path: &FieldPath) -> Vec<String> {
        vec![path.to_string(), path.sub(SECRET_PROTECTION_LEVEL)]
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        _descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        let Some(data) = first_data(content) else {
            return vec![];
        };
        let mut values = vec![];
        if let Some(secret) = data.get("secret").and_then(Value::as_str) {
            values.push((path.to_string(), Value::String(secret.to_string())));
        }
        if let Some(level) = data.get(SECRET_PROTECTION_LEVEL).and_then(Value::as_str) {
            values.push((path.sub(SECRET_PROTECTION_LEVEL), Value::String(level.to_string())));
        }
        values
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        let Some(secret) = first_text(state.get(path.as_str())) else {
            return Ok(None);
        };
        let mut data = Map::new();
        data.insert("secret".to_string(), Value::String(secret));
        let level = first_text(state.get(&path.sub(SECRET_PROTECTION_LEVEL)))
            .or_else(|| default_str(descriptor, SECRET_PROTECTION_LEVEL));
        if let Some(level) = level {
            data.insert(SECRET_PROTECTION_LEVEL.to_string(), Value::String(level));
        }
        Ok(Some(vec![AttributeContent::new(Value::Object(data))]))
    }
}

// ── Codeblock ───────────────────────────────────────────────────────

/// Plain code in the form, base64 on the wire.
pub(crate) struct CodeblockHandler;

impl ContentHandler for CodeblockHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Codeblock
    }

    fn control(&self, _descriptor: &AttributeDescriptor) -> Control {
        Control::CodeEditor
    }

    fn paths(&self, path: &FieldPath) -> Vec<String> {
        vec![path.sub(CODE_TEXT_AREA), path.sub(CODE_LANGUAGE)]
    }

    fn value_path(&self, path: &FieldPath) -> String {
        path.sub(CODE_TEXT_AREA)
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        let Some(data) = first_data(content) else {
            return vec![];
        };
        let mut values = vec![];
        if let Some(code) = data.get("code").and_then(Value::as_str) {
            let text = match BASE64.decode(code.trim()).map(String::from_utf8) {
                Ok(Ok(text)) => text,
                _ => {
                    tracing::warn!(
                        target: "attrform::content",
                        attribute = %descriptor.name,
                        "code block content is not base64 text; loading it verbatim"
                    );
                    code.to_string()
                }
            };
            values.push((path.sub(CODE_TEXT_AREA), Value::String(text)));
        }
        let language = data
            .get(CODE_LANGUAGE)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LANGUAGE);
        values.push((path.sub(CODE_LANGUAGE), Value::String(language.to_string())));
        values
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        let Some(code) = first_text(state.get(&path.sub(CODE_TEXT_AREA))) else {
            return Ok(None);
        };
        let language = first_text(state.get(&path.sub(CODE_LANGUAGE)))
            .or_else(|| default_str(descriptor, CODE_LANGUAGE))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Ok(Some(vec![AttributeContent::new(json!({
            "code": BASE64.encode(code.as_bytes()),
            CODE_LANGUAGE: language,
        }))]))
    }
}
