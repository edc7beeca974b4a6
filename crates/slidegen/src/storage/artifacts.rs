use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::job::JobId;
use crate::media::MediaFormat;

const UPLOADS_DIR: &str = "uploads";
const OUTPUTS_DIR: &str = "outputs";

/// On-disk layout for job artifacts.
///
/// ```text
/// <root>/uploads/<job_id>.<ext>   uploaded video
/// <root>/uploads/<job_id>.wav     extracted audio
/// <root>/outputs/<job_id>.pptx    rendered presentation
/// ```
///
/// Paths are derived from the job id only, so user-supplied filenames never
/// reach the filesystem. Files are created exclusively and never overwritten.
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    root: PathBuf,
}

impl ArtifactStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(OUTPUTS_DIR)
    }

    pub async fn ensure_layout(&self) -> Result<(), StorageError> {
        for dir in [self.uploads_dir(), self.outputs_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn upload_path(&self, id: &JobId, format: MediaFormat) -> PathBuf {
        self.uploads_dir()
            .join(format!("{}.{}", id, format.extension()))
    }

    pub fn audio_path(&self, id: &JobId) -> PathBuf {
        self.uploads_dir().join(format!("{}.wav", id))
    }

    pub fn output_path(&self, id: &JobId) -> PathBuf {
        self.outputs_dir().join(format!("{}.pptx", id))
    }

    /// Persists an uploaded video and returns where it landed.
    pub async fn store_upload(
        &self,
        id: &JobId,
        format: MediaFormat,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.upload_path(id, format);
        self.write_new(&path, content).await?;
        Ok(path)
    }

    /// Writes `content` to a file that must not exist yet.
    pub async fn write_new(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::FileExists(path.to_path_buf()));
            }
            Err(e) => {
                return Err(StorageError::WriteFile {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let write_err = |e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        };
        file.write_all(content).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        Ok(())
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(StorageError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
