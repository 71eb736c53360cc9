//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl RdbmConfig {
    /// Connection URL with the password masked, for logs.
    ///
    /// Drivers connect through typed connect options, never through this
    /// string.
    pub fn redacted_connection_string(&self) -> String {
        let scheme = match self.r#type {
            Backend::Mysql => "mysql",
            Backend::Pgsql => "postgres",
        };

        let mut url = format!(
            "{}://{}:****@{}:{}/{}",
            scheme,
            self.user,
            self.host,
            self.port(),
            self.database
        );

        if self.r#type == Backend::Mysql {
            url.push_str("?charset=utf8mb4");
        }

        url
    }
}
