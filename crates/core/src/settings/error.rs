use super::catalog::SettingKind;

/// Errors raised by the settings bridge.
///
/// `UnknownKind` and `InvalidSchema` are construction-time failures: a catalog
/// that reports them cannot be used at all. `Parse` is raised when a stored
/// override no longer parses under its descriptor and is surfaced on the single
/// property being read.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Unknown setting kind `{kind}` for `{key}`")]
    UnknownKind { key: String, kind: String },
    #[error("Invalid schema entry `{key}`: {reason}")]
    InvalidSchema { key: String, reason: String },
    #[error("Failed to parse `{value}` as {expected:?} for setting `{key}`")]
    Parse {
        key: String,
        value: String,
        expected: SettingKind,
    },
    #[error("Property `{key}` expects a {expected:?} value")]
    TypeMismatch { key: String, expected: SettingKind },
    #[error("Unknown property `{0}`")]
    UnknownProperty(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SettingsError {
    /// Whether the error comes from an untrustworthy catalog.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            SettingsError::UnknownKind { .. } | SettingsError::InvalidSchema { .. }
        )
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        SettingsError::InvalidSchema {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
