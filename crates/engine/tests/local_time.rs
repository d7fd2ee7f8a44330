//! Wall-clock date-times in the host time zone.
//!
//! Every test here runs with `TZ=Europe/Prague` (CET in winter, CEST in
//! summer), so this file is its own test binary.

use std::sync::Once;

use attrform_engine::{collect, AttributeEditor, EditorProps, FormState, LocalZone};
use attrform_interchange::{AttributeContent, AttributeDescriptor};
use serde_json::json;

static PRAGUE: Once = Once::new();

fn in_prague() {
    PRAGUE.call_once(|| std::env::set_var("TZ", "Europe/Prague"));
}

fn when() -> Vec<AttributeDescriptor> {
    serde_json::from_value(json!([
        { "uuid": "1", "name": "validFrom", "type": "data", "contentType": "datetime" }
    ]))
    .unwrap()
}

fn submitted(local: &str) -> AttributeContent {
    in_prague();
    let mut editor = AttributeEditor::mount(EditorProps::new("ns", when()));
    editor.set_value("validFrom", json!(local)).unwrap();
    let mut requests = editor.submit().unwrap();
    requests.remove(0).content.remove(0)
}

#[test]
fn winter_date_uses_standard_time() {
    assert_eq!(
        submitted("2017-01-15T08:30"),
        AttributeContent::new("2017-01-15T07:30:00.000Z")
    );
}

#[test]
fn summer_date_uses_daylight_time() {
    assert_eq!(
        submitted("2017-06-01T08:30"),
        AttributeContent::new("2017-06-01T06:30:00.000Z")
    );
}

#[test]
fn each_value_takes_its_own_offset() {
    in_prague();
    let descriptors: Vec<AttributeDescriptor> = serde_json::from_value(json!([
        { "uuid": "1", "name": "validFrom", "type": "data", "contentType": "datetime" },
        { "uuid": "2", "name": "validTo", "type": "data", "contentType": "datetime" }
    ]))
    .unwrap();
    let mut editor = AttributeEditor::mount(EditorProps::new("ns", descriptors));
    editor.set_value("validFrom", json!("2017-03-25T12:00")).unwrap();
    editor.set_value("validTo", json!("2017-03-26T12:00")).unwrap();
    let requests = editor.submit().unwrap();
    assert_eq!(requests[0].content[0].data, json!("2017-03-25T11:00:00.000Z"));
    assert_eq!(requests[1].content[0].data, json!("2017-03-26T10:00:00.000Z"));
}

#[test]
fn skipped_hour_reads_with_the_earlier_offset() {
    // 02:30 does not exist on 2017-03-26 in Prague.
    assert_eq!(
        submitted("2017-03-26T02:30"),
        AttributeContent::new("2017-03-26T01:30:00.000Z")
    );
}

#[test]
fn repeated_hour_reads_with_the_earlier_offset() {
    // 02:30 happens twice on 2017-10-29 in Prague; the first is CEST.
    assert_eq!(
        submitted("2017-10-29T02:30"),
        AttributeContent::new("2017-10-29T00:30:00.000Z")
    );
}

#[test]
fn stored_values_load_in_their_own_offset() {
    in_prague();
    let descriptors: Vec<AttributeDescriptor> = serde_json::from_value(json!([
        { "uuid": "1", "name": "validFrom", "type": "data", "contentType": "datetime",
          "content": [{ "data": "2017-01-15T07:30:00.000Z" }] },
        { "uuid": "2", "name": "validTo", "type": "data", "contentType": "datetime",
          "content": [{ "data": "2017-06-01T06:30:00.000Z" }] }
    ]))
    .unwrap();
    let mut editor = AttributeEditor::mount(EditorProps::new("ns", descriptors.clone()));
    assert_eq!(
        editor.state().get("__attributes__ns__.validFrom"),
        Some(&json!("2017-01-15T08:30:00"))
    );
    assert_eq!(
        editor.state().get("__attributes__ns__.validTo"),
        Some(&json!("2017-06-01T08:30:00"))
    );
    let requests = editor.submit().unwrap();
    for (request, descriptor) in requests.iter().zip(&descriptors) {
        assert_eq!(request.content, descriptor.default_content());
    }
}

#[test]
fn fixed_offset_overrides_the_host_zone() {
    in_prague();
    let props = EditorProps::new("ns", when()).with_local_zone(LocalZone::Fixed(time::UtcOffset::UTC));
    let mut editor = AttributeEditor::mount(props);
    editor.set_value("validFrom", json!("2017-01-15T08:30")).unwrap();
    let requests = editor.submit().unwrap();
    assert_eq!(requests[0].content[0].data, json!("2017-01-15T08:30:00.000Z"));
}

#[test]
fn standalone_collect_reads_the_host_zone() {
    in_prague();
    let mut state = FormState::new();
    state.set("__attributes__ns__.validFrom", json!("2017-01-15T08:30"));
    let requests = collect("ns", &when(), &state).unwrap();
    assert_eq!(
        requests[0].content,
        vec![AttributeContent::new("2017-01-15T07:30:00.000Z")]
    );

    state.set("__attributes__ns__.validFrom", json!("2017-06-01T08:30"));
    let requests = collect("ns", &when(), &state).unwrap();
    assert_eq!(
        requests[0].content,
        vec![AttributeContent::new("2017-06-01T06:30:00.000Z")]
    );
}
