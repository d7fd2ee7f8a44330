pub(crate) mod check;
pub(crate) mod collect;
pub(crate) mod render;

use std::path::Path;
use std::process;

use attrform_engine::{AttributeEditor, EditorProps};
use attrform_interchange::{
    parse_attribute_values, parse_descriptors, AttributeResponseModel, ParsedDescriptors,
};

use crate::config::Settings;
use crate::{report_error, OutputFormat};

/// Read and parse a JSON file, exiting on failure.
pub(crate) fn read_json(path: &Path, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn load_descriptors(path: &Path, output: OutputFormat, quiet: bool) -> ParsedDescriptors {
    let doc = read_json(path, output, quiet);
    match parse_descriptors(&doc) {
        Ok(parsed) => {
            for rejected in &parsed.rejected {
                tracing::warn!(
                    index = rejected.index,
                    name = rejected.name.as_deref().unwrap_or("<unnamed>"),
                    reason = %rejected.reason,
                    "descriptor skipped"
                );
            }
            parsed
        }
        Err(e) => {
            let msg = format!("error in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn load_attributes(
    path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> Vec<AttributeResponseModel> {
    let Some(path) = path else {
        return Vec::new();
    };
    let doc = read_json(path, output, quiet);
    match parse_attribute_values(&doc) {
        Ok(values) => values,
        Err(e) => {
            let msg = format!("error in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Mount an editor from loaded inputs and effective settings.
pub(crate) fn mount(
    parsed: ParsedDescriptors,
    attributes: Vec<AttributeResponseModel>,
    settings: &Settings,
) -> AttributeEditor {
    let mut props = EditorProps::new(settings.namespace.clone(), parsed.descriptors)
        .with_attributes(attributes)
        .with_remove_action(settings.remove_action);
    if let Some(offset) = settings.local_offset {
        props = props.with_local_offset(offset);
    }
    if let Some(scope) = &settings.scope {
        props = props.with_scope(scope.clone());
    }
    let editor = AttributeEditor::mount(props);
    for warning in editor.warnings() {
        tracing::warn!("{}", warning);
    }
    editor
}
