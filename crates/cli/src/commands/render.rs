use std::path::Path;

use attrform_engine::render::FieldSpec;
use attrform_engine::{CallbackStatus, Control};

use super::{load_attributes, load_descriptors, mount};
use crate::config::Settings;
use crate::OutputFormat;

pub(crate) fn cmd_render(
    descriptors: &Path,
    attributes: Option<&Path>,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) {
    let parsed = load_descriptors(descriptors, output, quiet);
    let attributes = load_attributes(attributes, output, quiet);
    let mut editor = mount(parsed, attributes, settings);
    let plan = editor.render_plan();

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            println!("namespace: {}", plan.namespace);
            for field in &plan.fields {
                print_field(field);
            }
            if let Some(add) = &plan.add_control {
                let names: Vec<&str> = add.options.iter().map(|o| o.name.as_str()).collect();
                println!("add attribute: {}", names.join(", "));
            }
            if !quiet {
                for warning in &plan.warnings {
                    eprintln!("warning: {}", warning);
                }
            }
        }
    }
}

fn print_field(field: &FieldSpec) {
    let indent = if field.parent_group.is_some() { "    " } else { "  " };
    let mut flags = Vec::new();
    if field.required {
        flags.push("required".to_string());
    }
    if field.read_only {
        flags.push("read-only".to_string());
    }
    if field.disabled {
        flags.push("disabled".to_string());
    }
    if field.removable {
        flags.push("removable".to_string());
    }
    match &field.callback {
        Some(CallbackStatus::Pending) => flags.push("callback pending".to_string()),
        Some(CallbackStatus::Failed { message }) => {
            flags.push(format!("callback failed: {}", message))
        }
        _ => {}
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    println!(
        "{}{} ({}): {}{}",
        indent,
        field.label,
        field.name,
        control_label(&field.control),
        flags
    );

    for option in &field.options {
        println!("{}  - {}", indent, option);
    }
    for (path, value) in &field.values {
        println!("{}  {} = {}", indent, path, value);
    }
    for info in &field.info {
        println!("{}  {}", indent, info.display_label());
    }
    if let Some(error) = &field.error {
        println!("{}  error: {}", indent, error);
    }
}

fn control_label(control: &Control) -> &'static str {
    match control {
        Control::TextInput => "text",
        Control::TextArea => "textarea",
        Control::NumberInput { integer: true } => "integer",
        Control::NumberInput { integer: false } => "number",
        Control::Checkbox => "checkbox",
        Control::DatePicker => "date",
        Control::TimePicker => "time",
        Control::DateTimePicker => "datetime",
        Control::FileDrop => "file",
        Control::Select { multi: true } => "multiselect",
        Control::Select { multi: false } => "select",
        Control::Password => "password",
        Control::CodeEditor => "code",
        Control::Info => "info",
        Control::Group => "group",
    }
}
