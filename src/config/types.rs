//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `payroll.yaml`.

use argon2::PasswordHash;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::validate_rate;

/// Statutory constants used by the deduction engine.
///
/// These are configuration values, not jurisdictional tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionConfig {
    /// Withholding rate applied when an employee has none configured.
    pub default_withholding_rate: Decimal,
    /// Taxable amounts at or below this value are not taxed.
    pub tax_exemption_threshold: Decimal,
    /// Social security contribution rate.
    pub social_security_rate: Decimal,
    /// Wage ceiling for the social security contribution.
    pub social_security_cap_base: Decimal,
}

impl Default for DeductionConfig {
    fn default() -> Self {
        Self {
            default_withholding_rate: Decimal::new(5, 2),
            tax_exemption_threshold: Decimal::ZERO,
            social_security_rate: Decimal::new(5, 2),
            social_security_cap_base: Decimal::new(15_000, 0),
        }
    }
}

impl DeductionConfig {
    /// Checks that rates lie in `[0, 1]` and amounts are non-negative.
    pub fn validate(&self) -> EngineResult<()> {
        validate_rate("default_withholding_rate", self.default_withholding_rate)?;
        validate_rate("social_security_rate", self.social_security_rate)?;

        for (field, amount) in [
            ("tax_exemption_threshold", self.tax_exemption_threshold),
            ("social_security_cap_base", self.social_security_cap_base),
        ] {
            if amount < Decimal::ZERO {
                return Err(EngineError::validation(field, "must not be negative"));
            }
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Longest token lifetime accepted, one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Argon2id PHC hash of the demo admin password `Admin@123`.
pub const DEFAULT_ADMIN_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$cGF5LXJvbGwtYWRtaW4tMQ$CEntOiAVredSshtsRUKL9lvsv7xUlVG6dy2a3tzat8o";

/// Bearer-token settings and the admin account allowed to log in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens.
    pub jwt_secret: String,
    /// Admin login email.
    pub admin_email: String,
    /// Argon2 PHC hash of the admin password.
    pub admin_password_hash: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password_hash: DEFAULT_ADMIN_PASSWORD_HASH.to_string(),
            token_ttl_hours: 24,
        }
    }
}

// Keeps secrets out of debug logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("admin_email", &self.admin_email)
            .field("admin_password_hash", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// PostgreSQL connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Seeds sample employees into an empty store at start-up.
    pub seed_sample_data: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            seed_sample_data: true,
        }
    }
}

/// The complete configuration loaded from `payroll.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    /// Deduction constants.
    pub deductions: DeductionConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Storage settings.
    pub storage: StorageConfig,
}

impl PayrollConfig {
    /// Validates every section that carries constraints.
    pub fn validate(&self) -> EngineResult<()> {
        self.deductions.validate()?;

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(EngineError::validation("auth.jwt_secret", "must not be blank"));
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(EngineError::validation(
                "auth.token_ttl_hours",
                format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            ));
        }
        if let Err(error) = PasswordHash::new(&self.auth.admin_password_hash) {
            return Err(EngineError::validation(
                "auth.admin_password_hash",
                format!("not a PHC password hash: {error}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_deduction_defaults() {
        let config = DeductionConfig::default();
        assert_eq!(config.default_withholding_rate, dec("0.05"));
        assert_eq!(config.tax_exemption_threshold, Decimal::ZERO);
        assert_eq!(config.social_security_rate, dec("0.05"));
        assert_eq!(config.social_security_cap_base, dec("15000"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
deductions:
  tax_exemption_threshold: "2500"
server:
  addr: "127.0.0.1:9000"
"#;
        let config: PayrollConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.deductions.tax_exemption_threshold, dec("2500"));
        assert_eq!(config.deductions.social_security_rate, dec("0.05"));
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(config.storage.database_url.is_none());
    }

    #[test]
    fn test_rate_above_one_is_rejected() {
        let config = DeductionConfig {
            social_security_rate: dec("1.5"),
            ..DeductionConfig::default()
        };
        match config.validate() {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "social_security_rate");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_cap_is_rejected() {
        let config = DeductionConfig {
            social_security_cap_base: dec("-1"),
            ..DeductionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let mut config = PayrollConfig::default();
        config.auth.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = PayrollConfig::default();
        config.auth.token_ttl_hours = 0;
        assert!(config.validate().is_err());

        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(config.validate().is_ok());

        config.auth.token_ttl_hours = i64::MAX;
        match config.validate() {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "auth.token_ttl_hours");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_plaintext_admin_password_is_rejected() {
        let mut config = PayrollConfig::default();
        config.auth.admin_password_hash = "Admin@123".to_string();
        match config.validate() {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "auth.admin_password_hash");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_auth_debug_redacts_secrets() {
        let rendered = format!("{:?}", AuthConfig::default());
        assert!(!rendered.contains("change-me"));
        assert!(!rendered.contains("argon2id"));
        assert!(rendered.contains("admin@example.com"));
    }
}
