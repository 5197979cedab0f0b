use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::DraftStoreError;
use crate::paths::{draft_file_name, validate_key};
use crate::record::{DraftRecord, DRAFT_VERSION};
use crate::DraftStorage;

/// One JSON file per key under a root directory.
///
/// Saves write a sibling temp file and rename it over the target, so a crash
/// mid-write leaves the previous draft intact.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    root: PathBuf,
}

impl FileDraftStore {
    /// The root is created lazily on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, DraftStoreError> {
        validate_key(key)?;
        Ok(self.root.join(draft_file_name(key)))
    }

    /// Reads the full record, including its timestamp.
    pub fn load_record(&self, key: &str) -> Result<Option<DraftRecord>, DraftStoreError> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DraftStoreError::io("reading draft file", &path, source)),
        };

        let record = serde_json::from_str::<DraftRecord>(&raw)
            .map_err(|source| DraftStoreError::json_parse(&path, source))?;
        validate_record(&path, key, &record)?;
        Ok(Some(record))
    }
}

impl DraftStorage for FileDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        Ok(self.load_record(key)?.map(|record| record.text))
    }

    fn save(&self, key: &str, text: &str) -> Result<(), DraftStoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .map_err(|source| DraftStoreError::io("creating draft directory", &self.root, source))?;

        let record = DraftRecord::v1(key, now_rfc3339()?, text);
        let mut payload = serde_json::to_vec_pretty(&record)
            .map_err(|source| DraftStoreError::json_serialize(&path, source))?;
        payload.push(b'\n');

        let temp_path = self
            .root
            .join(format!(".{}.{}.tmp", draft_file_name(key), Uuid::new_v4()));
        if let Err(error) = write_synced(&temp_path, &payload) {
            let _ = fs::remove_file(&temp_path);
            return Err(error);
        }
        if let Err(source) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(DraftStoreError::io("replacing draft file", &path, source));
        }

        debug!(key, bytes = text.len(), path = %path.display(), "draft saved");
        Ok(())
    }
}

fn write_synced(path: &Path, payload: &[u8]) -> Result<(), DraftStoreError> {
    let mut file = File::create(path)
        .map_err(|source| DraftStoreError::io("creating temp draft file", path, source))?;
    file.write_all(payload)
        .map_err(|source| DraftStoreError::io("writing temp draft file", path, source))?;
    file.sync_all()
        .map_err(|source| DraftStoreError::io("syncing temp draft file", path, source))
}

fn validate_record(path: &Path, key: &str, record: &DraftRecord) -> Result<(), DraftStoreError> {
    if record.version != DRAFT_VERSION {
        return Err(DraftStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: record.version,
        });
    }
    if record.key != key {
        return Err(DraftStoreError::KeyMismatch {
            path: path.to_path_buf(),
            expected: key.to_string(),
            found: record.key.clone(),
        });
    }
    if OffsetDateTime::parse(&record.updated_at, &Rfc3339).is_err() {
        return Err(DraftStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: record.updated_at.clone(),
        });
    }

    Ok(())
}

fn now_rfc3339() -> Result<String, DraftStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(DraftStoreError::ClockFormat)
}
