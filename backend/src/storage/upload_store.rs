use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Original,
    Suspected,
}

impl ImageRole {
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "original_image" => Some(ImageRole::Original),
            "suspected_image" => Some(ImageRole::Suspected),
            _ => None,
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            ImageRole::Original => "original_",
            ImageRole::Suspected => "suspected_",
        }
    }
}

/// Where an upload was written: the full path plus the owning session and
/// bare file name, kept separately so the file can still be found if the
/// upload directory moves.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub session_id: Uuid,
    pub file_name: String,
}

#[derive(Clone, Debug)]
pub struct UploadStore {
    upload_dir: PathBuf,
}

impl UploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Each session writes under its own subdirectory.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.upload_dir.join(session_id.to_string())
    }

    /// `sanitized_name` must already have gone through `secure_filename`.
    pub fn path_for(&self, session_id: Uuid, role: ImageRole, sanitized_name: &str) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{}{}", role.file_prefix(), sanitized_name))
    }

    pub async fn save(
        &self,
        session_id: Uuid,
        role: ImageRole,
        sanitized_name: &str,
        image_data: &[u8],
    ) -> Result<StoredImage, StorageError> {
        tokio::fs::create_dir_all(self.session_dir(session_id)).await?;
        let path = self.path_for(session_id, role, sanitized_name);
        tokio::fs::write(&path, image_data).await?;
        log::debug!("Stored {} bytes at {}", image_data.len(), path.display());

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(StoredImage {
            path,
            session_id,
            file_name,
        })
    }

    /// Lookup order for a stored image: the recorded path, that path's file
    /// name under the session directory, then the recorded file name under it.
    pub fn candidates_for(&self, image: &StoredImage) -> Vec<PathBuf> {
        let session_dir = self.session_dir(image.session_id);
        let mut candidates = vec![image.path.clone()];
        if let Some(name) = image.path.file_name() {
            candidates.push(session_dir.join(name));
        }
        if !image.file_name.is_empty() {
            candidates.push(session_dir.join(&image.file_name));
        }
        candidates
    }

    pub fn locate(&self, image: &StoredImage) -> Option<PathBuf> {
        resolve_image(&self.candidates_for(image))
    }

    pub async fn read(&self, image: &StoredImage) -> Option<Vec<u8>> {
        let path = self.locate(image)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::error!("Error reading image file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Deletes `original_*`/`suspected_*` files last modified more than `ttl`
    /// ago from every session directory, then drops directories left empty.
    pub async fn evict_older_than(&self, ttl: Duration) -> Result<usize, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let cutoff = SystemTime::now()
            .checked_sub(ttl)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir = entry.path();
            removed += evict_files_in(&dir, cutoff).await?;
            if is_empty_dir(&dir).await? {
                if let Err(e) = tokio::fs::remove_dir(&dir).await {
                    log::warn!("Failed to remove {}: {}", dir.display(), e);
                }
            }
        }

        Ok(removed)
    }
}

async fn evict_files_in(dir: &Path, cutoff: SystemTime) -> Result<usize, StorageError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(ImageRole::Original.file_prefix())
            || name.starts_with(ImageRole::Suspected.file_prefix()))
        {
            continue;
        }

        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        if metadata.modified()? <= cutoff {
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to evict {}: {}", entry.path().display(), e),
            }
        }
    }

    Ok(removed)
}

async fn is_empty_dir(dir: &Path) -> Result<bool, StorageError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_none())
}

/// First candidate that exists on disk.
pub fn resolve_image(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}
