//! Durable storage adapters.

pub mod calibration_store;

pub use calibration_store::{default_calibration_path, TomlCalibrationStore};
