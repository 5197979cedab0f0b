use serde::{Deserialize, Serialize};

pub const DRAFT_VERSION: u32 = 1;

/// On-disk shape of one draft file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftRecord {
    pub version: u32,
    pub key: String,
    pub updated_at: String,
    pub text: String,
}

impl DraftRecord {
    #[must_use]
    pub fn v1(
        key: impl Into<String>,
        updated_at: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            version: DRAFT_VERSION,
            key: key.into(),
            updated_at: updated_at.into(),
            text: text.into(),
        }
    }
}
