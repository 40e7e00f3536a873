//! Key/value variables

use serde::{Deserialize, Serialize};

/// Kind of a user-facing variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyValType {
    #[default]
    String,
    Choice,
    Script,
}

/// A variable declared on a catalog entry or overridden on a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: KeyValType,
    pub is_credential: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choice_option: Vec<String>,
}

impl KeyVal {
    /// Creates a plain, non-credential string variable
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}
