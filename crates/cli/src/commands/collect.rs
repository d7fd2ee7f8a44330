use std::path::Path;
use std::process;

use attrform_engine::paths::{split_key, FieldPath};
use attrform_engine::{
    AttributeEditor, CallbackStatus, CallbackTransport, EditorError, StaticTransport,
    TransportConfig,
};
use serde_json::Value;

use super::{load_attributes, load_descriptors, mount, read_json};
use crate::config::Settings;
use crate::{report_error, OutputFormat};

pub(crate) struct CollectArgs<'a> {
    pub descriptors: &'a Path,
    pub form: &'a Path,
    pub attributes: Option<&'a Path>,
    pub callbacks: Option<&'a Path>,
    pub api_url: Option<&'a str>,
}

pub(crate) fn cmd_collect(
    args: &CollectArgs<'_>,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) {
    let parsed = load_descriptors(args.descriptors, output, quiet);
    let attributes = load_attributes(args.attributes, output, quiet);
    let form = match read_json(args.form, output, quiet) {
        Value::Object(map) => map,
        _ => {
            let msg = format!(
                "error in '{}': expected an object of form values",
                args.form.display()
            );
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let transport = select_transport(args, settings, output, quiet);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let mut editor = mount(parsed, attributes, settings);
    let entries: Vec<(String, Value)> = form.into_iter().collect();
    let result = runtime.block_on(fill(&mut editor, entries, transport.as_deref()));
    if let Err(e) = result {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    }

    if transport.is_none() {
        let unresolved = editor.take_pending_callbacks();
        if !unresolved.is_empty() {
            tracing::warn!(
                callbacks = unresolved.len(),
                "no callback transport configured; callbacks left unresolved"
            );
        }
    }
    for descriptor in editor.list_active() {
        if let CallbackStatus::Failed { message } = editor.callback_status(&descriptor.name) {
            tracing::warn!(attribute = %descriptor.name, %message, "callback failed");
        }
    }

    match editor.submit() {
        Ok(requests) => match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&requests).unwrap_or_default()
                );
            }
            OutputFormat::Text => {
                for request in &requests {
                    let content =
                        serde_json::to_string(&request.content).unwrap_or_default();
                    println!("{} = {}", request.name, content);
                }
            }
        },
        Err(EditorError::Validation { errors }) => {
            match output {
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("invalid form");
                        for (name, message) in &errors {
                            eprintln!("  - {}: {}", name, message);
                        }
                    }
                }
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "valid": false,
                        "errors": errors,
                    });
                    eprintln!(
                        "{}",
                        serde_json::to_string_pretty(&json).unwrap_or_default()
                    );
                }
            }
            process::exit(1);
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

/// Apply form entries in dependency order.
///
/// Entries whose attribute is not active yet (because a callback has not
/// injected it) are retried after every applied entry until a full pass
/// makes no progress.
async fn fill(
    editor: &mut AttributeEditor,
    mut entries: Vec<(String, Value)>,
    transport: Option<&dyn CallbackTransport>,
) -> Result<(), EditorError> {
    resolve(editor, transport).await?;
    loop {
        let mut deferred = Vec::new();
        let before = entries.len();
        for (key, value) in entries {
            activate_optional(editor, &key)?;
            let applied = if split_key(&key).is_some() {
                editor.set_field(&key, value.clone())
            } else {
                editor.set_value(&key, value.clone())
            };
            match applied {
                Ok(()) => resolve(editor, transport).await?,
                Err(EditorError::UnknownAttribute { .. }) | Err(EditorError::UnknownField { .. }) => {
                    deferred.push((key, value));
                }
                Err(e) => return Err(e),
            }
        }
        if deferred.is_empty() {
            return Ok(());
        }
        if deferred.len() == before {
            let (key, _) = &deferred[0];
            return Err(if split_key(key).is_some() {
                EditorError::UnknownField { path: key.clone() }
            } else {
                EditorError::UnknownAttribute { name: key.clone() }
            });
        }
        entries = deferred;
    }
}

/// Add the optional attribute a form entry targets, if it is not active.
fn activate_optional(editor: &mut AttributeEditor, key: &str) -> Result<(), EditorError> {
    let namespace = editor.namespace().to_string();
    let target = editor
        .list_selectable()
        .iter()
        .map(|d| d.name.clone())
        .find(|name| name == key || FieldPath::new(&namespace, name).owns(key));
    match target {
        Some(name) => {
            tracing::debug!(attribute = %name, "adding optional attribute from form");
            editor.add_attribute(&name)
        }
        None => Ok(()),
    }
}

async fn resolve(
    editor: &mut AttributeEditor,
    transport: Option<&dyn CallbackTransport>,
) -> Result<(), EditorError> {
    if let Some(transport) = transport {
        editor.resolve_callbacks(transport).await?;
    }
    Ok(())
}

fn select_transport(
    args: &CollectArgs<'_>,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) -> Option<Box<dyn CallbackTransport>> {
    if let Some(path) = args.callbacks {
        let doc = read_json(path, output, quiet);
        return match StaticTransport::from_json(&doc) {
            Some(transport) => Some(Box::new(transport)),
            None => {
                let msg = format!(
                    "error in '{}': expected an object of responses keyed by attribute name",
                    path.display()
                );
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };
    }

    let config = match args.api_url {
        Some(url) => {
            let mut config = settings
                .transport
                .clone()
                .unwrap_or_else(|| TransportConfig::new(url));
            config.base_url = url.to_string();
            Some(config.with_env_fallback())
        }
        None => settings
            .transport
            .clone()
            .map(TransportConfig::with_env_fallback)
            .or_else(TransportConfig::from_env),
    }?;
    http_transport(config)
}

#[cfg(feature = "http")]
fn http_transport(config: TransportConfig) -> Option<Box<dyn CallbackTransport>> {
    tracing::debug!(url = %config.base_url, "using HTTP callback transport");
    Some(Box::new(attrform_engine::HttpTransport::new(config)))
}

#[cfg(not(feature = "http"))]
fn http_transport(config: TransportConfig) -> Option<Box<dyn CallbackTransport>> {
    tracing::warn!(
        url = %config.base_url,
        "built without the http feature; callbacks stay unresolved"
    );
    None
}
