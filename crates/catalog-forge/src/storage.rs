//! On-disk store for processed product images.

use std::path::{Path, PathBuf};

use crate::types::{CatalogError, CatalogResult};

/// URL prefix under which stored files are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Directory of processed uploads, owned by the hosting process.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> CatalogResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Upload store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh image id: millisecond timestamp plus a random suffix.
    pub fn new_id() -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{millis}-{}", &suffix[..8])
    }

    /// Path of a file inside the store. Rejects names that could escape it.
    pub fn path_for(&self, filename: &str) -> CatalogResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// Public URL of a stored file.
    pub fn url_for(filename: &str) -> String {
        format!("{UPLOADS_URL_PREFIX}/{filename}")
    }

    /// Write bytes under `filename`.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> CatalogResult<PathBuf> {
        let path = self.path_for(filename)?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Read a stored file.
    pub fn read(&self, filename: &str) -> CatalogResult<Vec<u8>> {
        let path = self.path_for(filename)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::NotFound(filename.to_string()),
            _ => CatalogError::Io(e),
        })
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Delete the processed original of an image id.
    pub fn delete(&self, id: &str) -> CatalogResult<()> {
        validate_id(id)?;
        let filename = format!("{id}.webp");
        let path = self.path_for(&filename)?;
        std::fs::remove_file(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::NotFound(id.to_string()),
            _ => CatalogError::Io(e),
        })?;
        tracing::info!("Deleted image: {id}");
        Ok(())
    }
}

/// Image ids are restricted to ASCII alphanumerics and `-`.
pub fn validate_id(id: &str) -> CatalogResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(CatalogError::InvalidInput(format!("Invalid image id: {id}")));
    }
    Ok(())
}

fn validate_filename(filename: &str) -> CatalogResult<()> {
    let ok = !filename.is_empty()
        && !filename.starts_with('.')
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'));
    if !ok {
        return Err(CatalogError::InvalidInput(format!("Invalid file name: {filename}")));
    }
    Ok(())
}
