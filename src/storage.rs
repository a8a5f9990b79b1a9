// SPDX-License-Identifier: GPL-3.0-only

//! Storage for filtered photos
//!
//! Photos are staged as temporary files and then handed to a
//! [`PhotoLibrary`], which owns the permanent copy.

use crate::constants::{FILE_PREFIX, LIBRARY_SUBDIR};
use crate::errors::{PipelineError, PipelineResult};
use futures::future::BoxFuture;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Media type tag passed to the photo library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporary file that is removed when dropped
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed temporary file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temporary file"),
        }
    }
}

/// Write `bytes` to `<dir>/tritan_<uuid>.<extension>`
pub async fn write_temp_file(dir: &Path, bytes: &[u8], extension: &str) -> PipelineResult<TempFile> {
    let filename = format!("{}_{}.{}", FILE_PREFIX, uuid::Uuid::new_v4(), extension);
    let path = dir.join(filename);

    tokio::fs::create_dir_all(dir).await?;
    // Own the path before writing so a partial write is still cleaned up
    let file = TempFile { path };
    tokio::fs::write(&file.path, bytes).await?;

    debug!(path = %file.path.display(), size = bytes.len(), "Wrote temporary file");
    Ok(file)
}

/// Destination that keeps saved photos
///
/// Implemented by the embedding application (system gallery, media store).
pub trait PhotoLibrary: Send + Sync {
    /// Save the file at `path` and return where the library put it
    ///
    /// The library must copy the file; the caller deletes `path` afterwards.
    fn save_to_library<'a>(
        &'a self,
        path: &'a Path,
        media_type: MediaType,
    ) -> BoxFuture<'a, PipelineResult<PathBuf>>;
}

/// Photo library backed by a plain directory
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/Pictures/tritan`, or the home directory when no pictures directory exists
    pub fn default_location() -> Self {
        let dir = dirs::picture_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(LIBRARY_SUBDIR);
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn unused_path(&self, media_type: MediaType) -> PipelineResult<PathBuf> {
        let stem = format!(
            "{}_{}",
            FILE_PREFIX.to_uppercase(),
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let ext = media_type.extension();

        let mut candidate = self.dir.join(format!("{}.{}", stem, ext));
        let mut n = 1;
        while tokio::fs::try_exists(&candidate).await? {
            candidate = self.dir.join(format!("{}_{}.{}", stem, n, ext));
            n += 1;
        }
        Ok(candidate)
    }
}

impl PhotoLibrary for DirectoryLibrary {
    fn save_to_library<'a>(
        &'a self,
        path: &'a Path,
        media_type: MediaType,
    ) -> BoxFuture<'a, PipelineResult<PathBuf>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| save_error(format!("cannot create {}", self.dir.display()), e))?;

            let destination = self.unused_path(media_type).await?;
            tokio::fs::copy(path, &destination)
                .await
                .map_err(|e| save_error("copy failed".to_string(), e))?;

            info!(path = %destination.display(), %media_type, "Photo saved to library");
            Ok(destination)
        })
    }
}

fn save_error(context: String, err: std::io::Error) -> PipelineError {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        PipelineError::PermissionDenied(format!("{}: {}", context, err))
    } else {
        PipelineError::Save(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_tags() {
        assert_eq!(MediaType::Jpeg.as_str(), "image/jpeg");
        assert_eq!(MediaType::Png.to_string(), "image/png");
    }

    #[tokio::test]
    async fn test_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_temp_file(dir.path(), b"abc", "jpg").await.unwrap();
        let path = file.path().to_path_buf();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tritan_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_directory_library_avoids_collisions() {
        let staging = tempfile::tempdir().unwrap();
        let gallery = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(gallery.path().join("photos"));
        let file = write_temp_file(staging.path(), b"data", "png").await.unwrap();

        let first = library
            .save_to_library(file.path(), MediaType::Png)
            .await
            .unwrap();
        let second = library
            .save_to_library(file.path(), MediaType::Png)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.file_name().unwrap().to_string_lossy().starts_with("TRITAN_"));
        assert_eq!(std::fs::read(&second).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_missing_source_is_save_error() {
        let gallery = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(gallery.path());
        let err = library
            .save_to_library(Path::new("/nonexistent/tritan.jpg"), MediaType::Jpeg)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Save(_)));
    }
}
