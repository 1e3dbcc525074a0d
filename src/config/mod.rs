//! Configuration loading and management for the payroll engine.
//!
//! This module loads `payroll.yaml`, which carries the deduction constants,
//! server address, authentication settings and storage selection.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap().into_config();
//! println!("Default withholding: {}", config.deductions.default_withholding_rate);
//! ```

mod loader;
mod types;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader};
pub use types::{
    AuthConfig, DEFAULT_ADMIN_PASSWORD_HASH, DeductionConfig, MAX_TOKEN_TTL_HOURS, PayrollConfig,
    ServerConfig, StorageConfig,
};
