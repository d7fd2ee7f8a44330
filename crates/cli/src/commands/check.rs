use std::path::Path;
use std::process;

use attrform_engine::handler_for;
use attrform_interchange::parse_descriptors;

use super::read_json;
use crate::{report_error, OutputFormat};

static DESCRIPTOR_SCHEMA_STR: &str =
    include_str!("../../../../docs/attribute-descriptor-schema.json");

/// Schema-validate a descriptor list, then run it through the tolerant
/// parser and report what the engine would skip.
pub(crate) fn cmd_check(path: &Path, output: OutputFormat, quiet: bool) {
    let schema: serde_json::Value = match serde_json::from_str(DESCRIPTOR_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!(
                "internal error: failed to parse embedded descriptor schema: {}",
                e
            );
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: invalid descriptor schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc = read_json(path, output, quiet);
    let mut errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();

    let mut warnings = Vec::new();
    let mut count = 0;
    match parse_descriptors(&doc) {
        Ok(parsed) => {
            count = parsed.descriptors.len();
            for rejected in &parsed.rejected {
                errors.push(format!(
                    "descriptor {} ({}): {}",
                    rejected.index,
                    rejected.name.as_deref().unwrap_or("<unnamed>"),
                    rejected.reason
                ));
            }
            for descriptor in &parsed.descriptors {
                if handler_for(&descriptor.content_type).is_none() {
                    warnings.push(format!(
                        "attribute '{}': unsupported content type '{}' will not be rendered",
                        descriptor.name, descriptor.content_type
                    ));
                }
            }
        }
        Err(e) => errors.push(e.to_string()),
    }
    errors.dedup();

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => {
                    println!("valid ({} descriptors)", count);
                    for warning in &warnings {
                        eprintln!("warning: {}", warning);
                    }
                }
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "valid": true,
                        "descriptors": count,
                        "warnings": warnings,
                    });
                    println!("{}", json);
                }
            }
        }
    } else {
        match output {
            OutputFormat::Text => {
                if !quiet {
                    eprintln!("invalid");
                    for err in &errors {
                        eprintln!("  - {}", err);
                    }
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": false,
                    "errors": errors,
                    "warnings": warnings,
                });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        }
        process::exit(1);
    }
}
