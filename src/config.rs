use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scheduling::ScheduleError;

/// Application-level constants
pub const APP_NAME: &str = "Mada";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the patient database inside the data directory.
pub const DATABASE_FILE: &str = "mada.db";

/// Get the application data directory
/// ~/Mada/ on all platforms, or ./Mada when no home directory is known
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,rusqlite=warn"
}

/// Bounds applied when pre-generating call events for a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleLimits {
    /// Reminder days generated per medication, regardless of prescription length.
    pub reminder_horizon_days: u32,
    /// Checkup calls generated per patient.
    pub max_checkups: u32,
    /// Days between checkup calls.
    pub checkup_interval_days: u32,
    /// Wall-clock hour of every checkup call.
    pub checkup_hour: u32,
}

impl Default for ScheduleLimits {
    fn default() -> Self {
        Self {
            reminder_horizon_days: 30,
            max_checkups: 4,
            checkup_interval_days: 7,
            checkup_hour: 10,
        }
    }
}

impl ScheduleLimits {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.checkup_interval_days == 0 {
            return Err(ScheduleError::InvalidArgument(
                "checkup_interval_days must be at least 1".into(),
            ));
        }
        if self.checkup_hour > 23 {
            return Err(ScheduleError::InvalidArgument(format!(
                "checkup_hour must be within 0-23, got {}",
                self.checkup_hour
            )));
        }
        Ok(())
    }
}
