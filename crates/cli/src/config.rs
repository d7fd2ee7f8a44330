//! `attrform.toml` loading and flag precedence.
//!
//! ```toml
//! [editor]
//! namespace = "raProfile"
//! utc_offset = "+02:00"
//!
//! [editor.scope]
//! scope = "connector"
//! functionGroupCode = "authorityProvider"
//! connectorUuid = "..."
//! kind = "EJBCA"
//!
//! [transport]
//! base_url = "https://platform.example.com/api"
//! timeout_secs = 10
//! ```
//!
//! Command-line flags win over the file; the file wins over the
//! environment. Without `utc_offset` wall-clock values follow the host
//! time zone, including its summer-time rules.

use std::path::{Path, PathBuf};

use attrform_engine::TransportConfig;
use attrform_interchange::CallbackScope;
use serde::Deserialize;
use time::UtcOffset;

pub(crate) const DEFAULT_NAMESPACE: &str = "attributes";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EditorSection {
    pub namespace: Option<String>,
    pub utc_offset: Option<String>,
    pub remove_action: Option<bool>,
    pub scope: Option<CallbackScope>,
}

impl ConfigFile {
    pub(crate) fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        toml::from_str(&text)
            .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
    }
}

/// Global flags that override the config file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub namespace: Option<String>,
    pub utc_offset: Option<String>,
    pub config: Option<PathBuf>,
}

/// Effective settings for mounting an editor.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub namespace: String,
    /// `None` follows the host time zone.
    pub local_offset: Option<UtcOffset>,
    pub remove_action: bool,
    pub scope: Option<CallbackScope>,
    pub transport: Option<TransportConfig>,
}

impl Settings {
    pub(crate) fn resolve(overrides: &Overrides) -> Result<Self, String> {
        let file = match &overrides.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let namespace = overrides
            .namespace
            .clone()
            .or(file.editor.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        if namespace.is_empty() {
            return Err("namespace must not be empty".to_string());
        }

        let local_offset = overrides
            .utc_offset
            .as_deref()
            .or(file.editor.utc_offset.as_deref())
            .map(parse_offset)
            .transpose()?;

        Ok(Settings {
            namespace,
            local_offset,
            remove_action: file.editor.remove_action.unwrap_or(true),
            scope: file.editor.scope,
            transport: file.transport,
        })
    }
}

/// Parse `Z`, `UTC`, `+HH:MM` or `-HH:MM`.
pub(crate) fn parse_offset(s: &str) -> Result<UtcOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let format = time::macros::format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(s, format).map_err(|e| format!("invalid UTC offset '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("Z").unwrap(), UtcOffset::UTC);
        assert_eq!(
            parse_offset("+02:00").unwrap(),
            UtcOffset::from_hms(2, 0, 0).unwrap()
        );
        assert_eq!(
            parse_offset("-05:30").unwrap(),
            UtcOffset::from_hms(-5, -30, 0).unwrap()
        );
        assert!(parse_offset("two hours").is_err());
    }

    #[test]
    fn config_file_sections() {
        let file: ConfigFile = toml::from_str(
            r#"
            [editor]
            namespace = "raProfile"
            utc_offset = "+01:00"

            [editor.scope]
            scope = "resource"
            resource = "raProfiles"
            parentUuid = "p-1"

            [transport]
            base_url = "https://platform.example.com/api"
            "#,
        )
        .unwrap();
        assert_eq!(file.editor.namespace.as_deref(), Some("raProfile"));
        assert_eq!(
            file.editor.scope,
            Some(CallbackScope::Resource {
                resource: "raProfiles".to_string(),
                parent_uuid: "p-1".to_string(),
            })
        );
        let transport = file.transport.unwrap();
        assert_eq!(transport.base_url, "https://platform.example.com/api");
        assert_eq!(transport.timeout_secs, 30);
    }

    #[test]
    fn flags_override_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("attrform.toml");
        std::fs::write(&path, "[editor]\nnamespace = \"fromFile\"\nutc_offset = \"+03:00\"\n").unwrap();

        let settings = Settings::resolve(&Overrides {
            namespace: Some("fromFlag".to_string()),
            utc_offset: None,
            config: Some(path.clone()),
        })
        .unwrap();
        assert_eq!(settings.namespace, "fromFlag");
        assert_eq!(settings.local_offset, Some(UtcOffset::from_hms(3, 0, 0).unwrap()));
        assert!(settings.remove_action);
    }

    #[test]
    fn no_offset_follows_the_host_zone() {
        let settings = Settings::resolve(&Overrides::default()).unwrap();
        assert_eq!(settings.local_offset, None);
        assert_eq!(settings.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ConfigFile>("[editor]\nnamspace = \"x\"\n").is_err());
    }
}
