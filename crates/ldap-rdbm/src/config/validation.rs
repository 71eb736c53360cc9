//! Configuration validation.

use super::Config;
use crate::error::{RdbmError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.rdbm.host.is_empty() {
        return Err(RdbmError::Config("rdbm.host is required".into()));
    }
    if config.rdbm.database.is_empty() {
        return Err(RdbmError::Config("rdbm.database is required".into()));
    }
    if config.rdbm.user.is_empty() {
        return Err(RdbmError::Config("rdbm.user is required".into()));
    }
    if let Some(0) = config.rdbm.port {
        return Err(RdbmError::Config("rdbm.port must be non-zero".into()));
    }

    for file in &config.schema.extra_files {
        if file.as_os_str().is_empty() {
            return Err(RdbmError::Config(
                "schema.extra_files cannot contain empty paths".into(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, RdbmConfig, SchemaConfig};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            rdbm: RdbmConfig {
                r#type: Backend::Mysql,
                host: "localhost".to_string(),
                port: Some(3306),
                database: "jansdb".to_string(),
                user: "jans".to_string(),
                password: "password".to_string(),
            },
            schema: SchemaConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut config = valid_config();
        config.rdbm.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_database() {
        let mut config = valid_config();
        config.rdbm.database = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_port() {
        let mut config = valid_config();
        config.rdbm.port = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_extra_file() {
        let mut config = valid_config();
        config.schema.extra_files = vec![PathBuf::new()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rdbm_config_debug_redacts_password() {
        let mut config = valid_config();
        config.rdbm.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.rdbm);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}
