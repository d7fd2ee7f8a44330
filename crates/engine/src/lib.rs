//! Attribute form engine -- mounts server-declared attribute descriptors
//! as a headless form, validates edits, resolves callbacks and collects
//! typed attribute requests.
//!
//! The engine consumes the interchange model from `attrform-interchange`
//! and never renders anything itself: hosts read a [`RenderPlan`] and feed
//! user input back through [`AttributeEditor`].

pub mod attribute_set;
pub mod callback;
pub mod collect;
pub mod constraints;
pub mod content;
pub mod editor;
pub mod error;
pub mod paths;
pub mod render;
pub mod temporal;
pub mod transport;
pub mod values;

pub use callback::{CallbackRequest, CallbackStatus, PendingCallback};
pub use collect::{collect, collect_active};
pub use constraints::{compose_validators, validate, Validator};
pub use content::{handler_for, ContentContext, ContentHandler, Control};
pub use editor::{AttributeEditor, EditorProps, MAX_CALLBACK_ROUNDS};
pub use error::{CollectError, EditorError};
pub use paths::FieldPath;
pub use render::{FieldSpec, RenderPlan};
pub use temporal::LocalZone;
pub use transport::{CallbackTransport, StaticTransport, TransportConfig, TransportError};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use values::FormState;
