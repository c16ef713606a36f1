//! Disk persistence for annotation records.

use crate::error::PersistError;
use crate::schema::{AnnotationRecord, DecodeLimits, SchemaViolation};
use log::{debug, info};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Replace `path` with `bytes` so that readers see either the old file or the
/// complete new one, never a partial write.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(path = %path.as_ref().display(), len = bytes.len()))
)]
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), PersistError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

impl AnnotationRecord {
    pub fn to_json(&self, pretty: bool) -> Result<String, PersistError> {
        let doc = self.to_document();
        let json = if pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(json)
    }

    /// Parse and validate a document. Syntax and shape errors surface as
    /// [`SchemaViolation::Malformed`].
    pub fn from_json(raw: &str, limits: &DecodeLimits) -> Result<Self, PersistError> {
        let doc = serde_json::from_str(raw).map_err(|e| SchemaViolation::from(&e))?;
        Ok(Self::from_document(&doc, limits)?)
    }

    /// Write the record as JSON, replacing any existing file atomically.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(image = %self.image_path)))]
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<(), PersistError> {
        let path = path.as_ref();
        let json = self.to_json(pretty)?;
        write_atomic(path, json.as_bytes())?;
        info!(
            "saved {} landmarks for {} to {}",
            self.landmarks.total(),
            self.image_path,
            path.display()
        );
        Ok(())
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(path = %path.as_ref().display())))]
    pub fn load(path: impl AsRef<Path>, limits: &DecodeLimits) -> Result<Self, PersistError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let record = Self::from_json(&raw, limits)?;
        debug!(
            "loaded {} landmarks from {}",
            record.landmarks.total(),
            path.as_ref().display()
        );
        Ok(record)
    }
}
