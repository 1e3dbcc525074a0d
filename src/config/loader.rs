//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the payroll
//! configuration from YAML and layering environment overrides on top.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::PayrollConfig;

/// File name read from the configuration directory.
pub const CONFIG_FILE_NAME: &str = "payroll.yaml";

/// Loads and provides access to the payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── payroll.yaml   # deductions, server, auth and storage sections
/// ```
///
/// Every section and field is optional; omitted values take their defaults.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?.with_env_overrides();
/// println!("Binding to {}", loader.config().server.addr);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `payroll.yaml` is missing ([`EngineError::ConfigNotFound`])
    /// - the file contains invalid YAML ([`EngineError::ConfigParseError`])
    /// - a value is out of range ([`EngineError::Validation`])
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config_path = path.as_ref().join(CONFIG_FILE_NAME);
        let config = Self::load_yaml::<PayrollConfig>(&config_path)?;
        config.validate()?;

        debug!(path = %config_path.display(), "Loaded payroll configuration");
        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: PayrollConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Applies overrides from the process environment.
    ///
    /// Recognised variables: `DATABASE_URL`, `SERVER_ADDR`, `JWT_SECRET`,
    /// `ADMIN_EMAIL`, `ADMIN_PASSWORD_HASH`. Empty values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup function.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let config = &mut self.config;

        if let Some(url) = lookup("DATABASE_URL") {
            config.storage.database_url = Some(url);
        }
        if let Some(addr) = lookup("SERVER_ADDR") {
            config.server.addr = addr;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Some(email) = lookup("ADMIN_EMAIL") {
            config.auth.admin_email = email;
        }
        if let Some(hash) = lookup("ADMIN_PASSWORD_HASH") {
            config.auth.admin_password_hash = hash;
        }

        self
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> PayrollConfig {
        self.config
    }
}
