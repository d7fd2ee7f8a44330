//! attrform-interchange: wire types for server-described attributes.
//!
//! Provides typed structs for attribute descriptors, content, constraints,
//! callback wiring and the request/response models exchanged with the
//! platform API, plus tolerant entry points that deserialize
//! `serde_json::Value` documents without letting one malformed descriptor
//! poison the rest of the list.
//!
//! The engine crate depends on this crate for initial JSON parsing and
//! interprets content payloads per content type.

pub mod deserialize;
pub mod types;

pub use deserialize::{
    parse_attribute_values, parse_callback_response, parse_descriptors, InterchangeError,
    ParsedDescriptors, RejectedDescriptor,
};
pub use types::*;
