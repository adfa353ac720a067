//! TOML-backed calibration store.
//!
//! Persists the calibration extent as integer keys of a flat TOML table in
//! the platform-appropriate config directory:
//! - Windows:  `%APPDATA%\cursor-relay\calibration.toml`
//! - Linux:    `~/.config/cursor-relay/calibration.toml`
//! - macOS:    `~/Library/Application Support/cursor-relay/calibration.toml`
//!
//! ```toml
//! desktop_max_x = 2560
//! desktop_max_y = 1440
//! ```
//!
//! A missing file reads as an empty table, so a fresh install simply falls
//! back to the default extent.  Unknown keys written by other versions are
//! preserved on save whatever their type; only the key being read has to
//! hold an integer.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use toml::{Table, Value};
use tracing::debug;

use relay_core::{CalibrationStore, StoreError};

const APP_DIR: &str = "cursor-relay";
const FILE_NAME: &str = "calibration.toml";

/// [`CalibrationStore`] that reads and rewrites one TOML file.
#[derive(Debug)]
pub struct TomlCalibrationStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl TomlCalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> Result<Table, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content
                .parse::<Table>()
                .map_err(|e| StoreError::Format(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no calibration file at {}", self.path.display());
                Ok(Table::new())
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_table(&self, table: &Table) -> Result<(), StoreError> {
        let content = toml::to_string(table).map_err(|e| StoreError::Format(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl CalibrationStore for TomlCalibrationStore {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self.read_table().await?.get(key) {
            None => Ok(None),
            Some(value) => value.as_integer().map(Some).ok_or_else(|| {
                StoreError::Format(format!(
                    "{}: {key} is a {}, expected an integer",
                    self.path.display(),
                    value.type_str()
                ))
            }),
        }
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.read_table().await?;
        table.insert(key.to_string(), Value::Integer(value));
        self.write_table(&table).await?;
        debug!("stored {key} = {value} in {}", self.path.display());
        Ok(())
    }
}

/// Default calibration file location, or `None` if the platform config
/// directory cannot be determined.
pub fn default_calibration_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join(FILE_NAME))
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join(APP_DIR))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(APP_DIR))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join(APP_DIR))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{load_extent, save_extent, Extent, DEFAULT_EXTENT};

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("cursor-relay-test-{}", uuid::Uuid::new_v4()))
            .join(FILE_NAME)
    }

    async fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let store = TomlCalibrationStore::new(temp_path());
        assert_eq!(store.get_int("desktop_max_x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips_and_creates_directory() {
        // Arrange
        let path = temp_path();
        let store = TomlCalibrationStore::new(&path);

        // Act
        store.set_int("desktop_max_x", 2560).await.unwrap();
        store.set_int("desktop_max_y", 1440).await.unwrap();

        // Assert
        assert_eq!(store.get_int("desktop_max_x").await.unwrap(), Some(2560));
        assert_eq!(store.get_int("desktop_max_y").await.unwrap(), Some(1440));
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("desktop_max_x = 2560"));
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_unknown_keys_survive_a_write() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "other_key = 7\n").await.unwrap();
        let store = TomlCalibrationStore::new(&path);

        store.set_int("desktop_max_x", 100).await.unwrap();

        assert_eq!(store.get_int("other_key").await.unwrap(), Some(7));
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_foreign_string_key_does_not_block_commit() {
        // Arrange
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "version = \"2\"\n").await.unwrap();
        let store = TomlCalibrationStore::new(&path);

        // Act
        save_extent(&store, Extent::new(2560, 1440)).await.unwrap();

        // Assert
        assert_eq!(load_extent(&store).await, Extent::new(2560, 1440));
        let table: Table = tokio::fs::read_to_string(&path).await.unwrap().parse().unwrap();
        assert_eq!(table.get("version").and_then(Value::as_str), Some("2"));
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_unparseable_file_is_format_error() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "desktop_max_x = = 3\n").await.unwrap();
        let store = TomlCalibrationStore::new(&path);

        let read = store.get_int("desktop_max_x").await;

        assert!(matches!(read, Err(StoreError::Format(_))));
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_format_error_and_load_falls_back() {
        // Arrange
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "desktop_max_x = \"wide\"\n").await.unwrap();
        let store = TomlCalibrationStore::new(&path);

        // Act
        let read = store.get_int("desktop_max_x").await;
        let extent = load_extent(&store).await;

        // Assert
        assert!(matches!(read, Err(StoreError::Format(_))));
        assert_eq!(extent, DEFAULT_EXTENT);
        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_committed_extent_survives_reopen() {
        let path = temp_path();
        save_extent(&TomlCalibrationStore::new(&path), Extent::new(1920, 1080))
            .await
            .unwrap();

        let reopened = TomlCalibrationStore::new(&path);

        assert_eq!(load_extent(&reopened).await, Extent::new(1920, 1080));
        cleanup(&path).await;
    }

    #[test]
    fn test_default_path_ends_with_app_file() {
        if let Some(path) = default_calibration_path() {
            assert!(path.ends_with(Path::new(APP_DIR).join(FILE_NAME)));
        }
    }
}
