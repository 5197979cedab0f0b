use std::path::{Path, PathBuf};

use crate::error::DraftStoreError;

pub const DRAFT_DIR: [&str; 2] = [".studio", "drafts"];

const MAX_KEY_LEN: usize = 128;

#[must_use]
pub fn draft_root(cwd: &Path) -> PathBuf {
    cwd.join(DRAFT_DIR[0]).join(DRAFT_DIR[1])
}

/// Keys become file names, so only `[A-Za-z0-9._-]` is accepted and dot-only
/// keys are refused.
pub fn validate_key(key: &str) -> Result<(), DraftStoreError> {
    let invalid = |reason| DraftStoreError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid("key is longer than 128 bytes"));
    }
    if key.chars().all(|c| c == '.') {
        return Err(invalid("key may not consist only of dots"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("key may only contain ASCII letters, digits, '.', '_' or '-'"));
    }

    Ok(())
}

#[must_use]
pub fn draft_file_name(key: &str) -> String {
    format!("{key}.json")
}
