//! Msed Archive
//!
//! Miners upload a 12-byte `msed` part next to each finished `movable.sed`.
//! The parts are kept as individual files plus an append-only manifest
//! (`list`) naming every file, so they can be published as a static
//! directory.

use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Size of an msed part in bytes
pub const MSED_PART_LEN: usize = 12;

/// Manifest file name inside the archive directory
pub const MANIFEST_NAME: &str = "list";

/// Error when archiving an msed part
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive key must be hexadecimal: {0:?}")]
    InvalidKey(String),

    #[error("Archive I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for msed parts
#[trait_variant::make(MsedArchive: Send)]
pub trait LocalMsedArchive {
    /// Store `data` under a name derived from `key` and append the name to
    /// the manifest. Returns the file name.
    async fn store(&self, key: &str, data: &[u8; MSED_PART_LEN]) -> Result<String, ArchiveError>;
}

/// File name for the msed part of a device
pub fn msed_file_name(key: &str) -> Result<String, ArchiveError> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ArchiveError::InvalidKey(key.to_string()));
    }
    Ok(format!("msed_data_{}.bin", key))
}

/// Directory-backed archive
#[derive(Debug, Clone)]
pub struct FsMsedArchive {
    dir: PathBuf,
}

impl FsMsedArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MsedArchive for FsMsedArchive {
    async fn store(&self, key: &str, data: &[u8; MSED_PART_LEN]) -> Result<String, ArchiveError> {
        let file_name = msed_file_name(key)?;

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&file_name), data).await?;

        let mut manifest = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(MANIFEST_NAME))
            .await?;
        manifest
            .write_all(format!("{}\n", file_name).as_bytes())
            .await?;
        manifest.flush().await?;

        tracing::debug!(file = %file_name, "Archived msed part");

        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{FsMsedArchive, MANIFEST_NAME, MSED_PART_LEN, MsedArchive, msed_file_name};

    #[test]
    fn test_file_name_rejects_path_tricks() {
        assert!(msed_file_name("../etc").is_err());
        assert!(msed_file_name("").is_err());
        assert_eq!(msed_file_name("abcDEF01").unwrap(), "msed_data_abcDEF01.bin");
    }

    #[tokio::test]
    async fn test_store_writes_file_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsMsedArchive::new(dir.path().join("mseds"));

        let name = archive.store("00ff", &[7u8; MSED_PART_LEN]).await.unwrap();
        archive.store("11ee", &[8u8; MSED_PART_LEN]).await.unwrap();

        let stored = tokio::fs::read(archive.dir().join(&name)).await.unwrap();
        assert_eq!(stored, vec![7u8; MSED_PART_LEN]);

        let manifest = tokio::fs::read_to_string(archive.dir().join(MANIFEST_NAME))
            .await
            .unwrap();
        assert_eq!(manifest, "msed_data_00ff.bin\nmsed_data_11ee.bin\n");
    }

    async fn store_via<A: MsedArchive>(archive: &A, key: &str) -> Result<String, super::ArchiveError> {
        archive.store(key, &[9u8; MSED_PART_LEN]).await
    }

    #[tokio::test]
    async fn test_store_through_trait_bound() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsMsedArchive::new(dir.path());

        assert_eq!(store_via(&archive, "abcd").await.unwrap(), "msed_data_abcd.bin");
        assert!(store_via(&archive, "../x").await.is_err());

        let manifest = tokio::fs::read_to_string(dir.path().join(MANIFEST_NAME))
            .await
            .unwrap();
        assert_eq!(manifest, "msed_data_abcd.bin\n");
    }
}
