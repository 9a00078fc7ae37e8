use std::{
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    application::{error::ApplicationError, repositories::ImageRepository},
    domain::models::image::StoredImage,
    services::error::StorageError,
};

#[cfg(unix)]
const DIRECTORY_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Image storage backed by a single flat directory.
pub struct FsImageRepository {
    root: PathBuf,
}

impl FsImageRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_path(&self, prefix: &str) -> PathBuf {
        self.root
            .join(format!(".{}-{}.part", prefix, Uuid::new_v4().simple()))
    }
}

async fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove temporary file {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl ImageRepository for FsImageRepository {
    async fn prepare(&self) -> Result<(), ApplicationError> {
        if fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIRECTORY_MODE);

        builder
            .create(&self.root)
            .await
            .map_err(StorageError::CreateDirectory)?;

        info!("Created uploads directory {}", self.root.display());
        Ok(())
    }

    async fn ensure_writable(&self) -> Result<(), ApplicationError> {
        let metadata = fs::metadata(&self.root)
            .await
            .map_err(StorageError::Inspect)?;

        if !metadata.is_dir() {
            return Err(StorageError::NotWritable.into());
        }

        // Effective access, not mode bits.
        let check_path = self.temp_path("write-check");
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&check_path)
            .await
        {
            Ok(file) => {
                drop(file);
                remove_temp(&check_path).await;
                Ok(())
            }
            Err(e) => {
                warn!("Uploads directory {} is not writable: {}", self.root.display(), e);
                Err(StorageError::NotWritable.into())
            }
        }
    }

    async fn store(&self, filename: &str, content: &[u8]) -> Result<bool, ApplicationError> {
        let temp_path = self.temp_path("upload");
        let target_path = self.root.join(filename);

        let published = write_then_link(&temp_path, &target_path, content).await;
        remove_temp(&temp_path).await;

        match published {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StorageError::Write(e).into()),
        }
    }

    async fn entries(&self) -> Result<Vec<StoredImage>, ApplicationError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(StorageError::ReadDirectory)?;

        let mut images = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(StorageError::ReadDirectory)?
        {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };

            // Follows symlinks, so dangling links drop out here.
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            images.push(StoredImage::new(filename, modified));
        }

        Ok(images)
    }
}

/// Writes the temp file completely, then links it under its final name.
/// Linking fails with `AlreadyExists` instead of replacing another upload.
async fn write_then_link(temp_path: &Path, target_path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp_path, std::fs::Permissions::from_mode(FILE_MODE)).await?;
    }

    fs::hard_link(temp_path, target_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn prepare_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("uploads");
        let repository = FsImageRepository::new(&root);

        repository.prepare().await.unwrap();
        repository.prepare().await.unwrap();

        assert!(root.is_dir());
        repository.ensure_writable().await.unwrap();
    }

    #[tokio::test]
    async fn store_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FsImageRepository::new(dir.path());

        assert!(repository.store("1_a.png", b"data").await.unwrap());

        assert_eq!(dir_names(dir.path()), vec!["1_a.png"]);
        assert_eq!(std::fs::read(dir.path().join("1_a.png")).unwrap(), b"data");
    }

    #[tokio::test]
    async fn store_never_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FsImageRepository::new(dir.path());

        assert!(repository.store("1_a.png", b"first").await.unwrap());
        assert!(!repository.store("1_a.png", b"second").await.unwrap());

        assert_eq!(std::fs::read(dir.path().join("1_a.png")).unwrap(), b"first");
        assert_eq!(dir_names(dir.path()), vec!["1_a.png"]);
    }

    #[tokio::test]
    async fn concurrent_stores_of_one_name_publish_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let repository = std::sync::Arc::new(FsImageRepository::new(dir.path()));

        let handles: Vec<_> = (0..16u8)
            .map(|i| {
                let repository = repository.clone();
                tokio::spawn(async move { repository.store("1_cat.png", &[i; 64]).await.unwrap() })
            })
            .collect();

        let mut published = 0;
        for handle in handles {
            if handle.await.unwrap() {
                published += 1;
            }
        }

        assert_eq!(published, 1);
        assert_eq!(dir_names(dir.path()), vec!["1_cat.png"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stored_files_are_world_readable_owner_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let repository = FsImageRepository::new(dir.path());
        repository.store("1_a.png", b"data").await.unwrap();

        let mode = std::fs::metadata(dir.path().join("1_a.png"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn store_into_missing_directory_reports_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FsImageRepository::new(dir.path().join("gone"));

        let err = repository.store("1_a.png", b"data").await.unwrap_err();

        assert!(matches!(err, ApplicationError::StorageFailure(ref msg) if msg.starts_with("Failed to save file: ")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_publish_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory already holds the target name.
        std::fs::create_dir(dir.path().join("1_a.png")).unwrap();
        let repository = FsImageRepository::new(dir.path());

        let taken = repository.store("1_a.png", b"data").await.unwrap();
        let missing_parent = repository.store("nope/1_b.png", b"data").await;

        assert!(!taken);
        assert!(missing_parent.is_err());
        assert_eq!(dir_names(dir.path()), vec!["1_a.png"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn read_only_directory_is_unavailable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
        let repository = FsImageRepository::new(dir.path());

        // Root ignores the mode bits; the check has to agree with a real write.
        let marker = dir.path().join("marker");
        let writable = std::fs::write(&marker, b"").is_ok();
        let _ = std::fs::remove_file(&marker);

        let result = repository.ensure_writable().await;

        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(ApplicationError::DirectoryUnavailable(_))));
        }
        assert!(dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn writable_check_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FsImageRepository::new(dir.path());

        repository.ensure_writable().await.unwrap();

        assert!(dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn entries_skip_directories_and_dangling_links() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dead.jpg")).unwrap();

        let repository = FsImageRepository::new(dir.path());
        let names: Vec<_> = repository
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|image| image.filename)
            .collect();

        assert_eq!(names, vec!["a.png"]);
    }
}
