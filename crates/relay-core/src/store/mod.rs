//! Calibration persistence port.
//!
//! The receiver only needs two integers to survive a restart, so the port is
//! a minimal async integer key-value interface.  The durable TOML-backed
//! implementation lives in the receiver crate; [`MemoryStore`] here is used
//! by tests and by runs without a calibration file.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::calibration::{Extent, DEFAULT_EXTENT};

/// Key holding the calibrated host width.
pub const KEY_DESKTOP_MAX_X: &str = "desktop_max_x";
/// Key holding the calibrated host height.
pub const KEY_DESKTOP_MAX_Y: &str = "desktop_max_y";

/// Errors raised by a [`CalibrationStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("calibration store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but could not be parsed or written.
    #[error("calibration store format error: {0}")]
    Format(String),
}

/// Async integer key-value persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// Returns the value for `key`, or `None` if it was never set.
    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError>;
}

/// Loads the persisted extent, falling back to [`DEFAULT_EXTENT`].
///
/// Missing, non-positive, or implausibly large values and backend errors all
/// produce the default and a warning; this never fails.
pub async fn load_extent(store: &dyn CalibrationStore) -> Extent {
    let read = async {
        let x = store.get_int(KEY_DESKTOP_MAX_X).await?;
        let y = store.get_int(KEY_DESKTOP_MAX_Y).await?;
        Ok::<_, StoreError>((x, y))
    };

    match read.await {
        Ok((x, y)) => match Extent::from_stored(x, y) {
            Ok(extent) => {
                info!("loaded calibration {extent}");
                extent
            }
            Err(e) => {
                warn!("{e}; using default extent {DEFAULT_EXTENT}");
                DEFAULT_EXTENT
            }
        },
        Err(e) => {
            warn!("could not read calibration ({e}); using default extent {DEFAULT_EXTENT}");
            DEFAULT_EXTENT
        }
    }
}

/// Persists a committed extent.
///
/// # Errors
///
/// Propagates the backend's [`StoreError`].
pub async fn save_extent(store: &dyn CalibrationStore, extent: Extent) -> Result<(), StoreError> {
    store
        .set_int(KEY_DESKTOP_MAX_X, i64::from(extent.width))
        .await?;
    store
        .set_int(KEY_DESKTOP_MAX_Y, i64::from(extent.height))
        .await?;
    Ok(())
}

// ── In-memory implementation ──────────────────────────────────────────────────

/// Non-durable [`CalibrationStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalibrationStore for MemoryStore {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.lock().await.get(key).copied())
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{eq, function};

    #[tokio::test]
    async fn test_save_then_load_round_trips_extent() {
        // Arrange
        let store = MemoryStore::new();

        // Act
        save_extent(&store, Extent::new(1920, 1080)).await.unwrap();
        let loaded = load_extent(&store).await;

        // Assert
        assert_eq!(loaded, Extent::new(1920, 1080));
    }

    #[tokio::test]
    async fn test_load_from_empty_store_is_default() {
        let store = MemoryStore::new();
        assert_eq!(load_extent(&store).await, DEFAULT_EXTENT);
    }

    #[tokio::test]
    async fn test_load_with_implausible_value_is_default() {
        let store = MemoryStore::new();
        store.set_int(KEY_DESKTOP_MAX_X, 25_000).await.unwrap();
        store.set_int(KEY_DESKTOP_MAX_Y, 1080).await.unwrap();

        assert_eq!(load_extent(&store).await, DEFAULT_EXTENT);
    }

    #[tokio::test]
    async fn test_load_with_backend_error_is_default() {
        // Arrange
        let mut store = MockCalibrationStore::new();
        store
            .expect_get_int()
            .returning(|_| Err(StoreError::Format("corrupt".into())));

        // Act / Assert
        assert_eq!(load_extent(&store).await, DEFAULT_EXTENT);
    }

    #[tokio::test]
    async fn test_save_writes_both_keys() {
        // Arrange
        let mut store = MockCalibrationStore::new();
        store
            .expect_set_int()
            .with(function(|k: &str| k == KEY_DESKTOP_MAX_X), eq(2560i64))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_int()
            .with(function(|k: &str| k == KEY_DESKTOP_MAX_Y), eq(1440i64))
            .times(1)
            .returning(|_, _| Ok(()));

        // Act / Assert
        save_extent(&store, Extent::new(2560, 1440)).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_stops_at_first_backend_error() {
        let mut store = MockCalibrationStore::new();
        store
            .expect_set_int()
            .times(1)
            .returning(|_, _| Err(StoreError::Format("read-only".into())));

        let result = save_extent(&store, Extent::new(800, 600)).await;

        assert!(matches!(result, Err(StoreError::Format(_))));
    }

    #[test]
    fn test_memory_store_last_write_wins() {
        let store = MemoryStore::new();

        let value = tokio_test::block_on(async {
            store.set_int(KEY_DESKTOP_MAX_X, 1280).await?;
            store.set_int(KEY_DESKTOP_MAX_X, 1366).await?;
            Ok::<_, StoreError>(store.get_int(KEY_DESKTOP_MAX_X).await?)
        });

        assert_eq!(value.unwrap(), Some(1366));
    }
}
