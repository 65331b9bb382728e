//! Configuration management for the ftplet FTP server
//!
//! Loaded from `config.toml` with `FTPLET_` environment overrides.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;

use crate::auth::ConcurrentLoginPermission;

const CONFIG_PATHS: [&str; 2] = ["config", "ftplet-server/config"];

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the FTP control connection
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Longest accepted command line, terminator included
    pub max_command_length: usize,

    /// Text of the 220 greeting
    pub greeting: String,

    /// Maximum concurrent logins server-wide (0 = unlimited)
    /// Environment: FTPLET_MAX_LOGINS
    #[serde(default)]
    pub max_logins: usize,

    /// Maximum concurrent logins from one address (0 = unlimited)
    #[serde(default)]
    pub max_logins_per_ip: usize,

    /// Register the built-in audit ftplet
    #[serde(default)]
    pub audit_enabled: bool,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            max_command_length: 512,
            greeting: "Welcome to the ftplet FTP server".to_string(),
            max_logins: 10,
            max_logins_per_ip: 0,
            audit_enabled: false,
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides.
    ///
    /// Tries each known location in turn and returns the last error if none
    /// of them can be read.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut last_error = None;

        for config_path in CONFIG_PATHS {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(
                    Environment::with_prefix("FTPLET")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()
            {
                Ok(settings) => {
                    let config: ServerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "no configuration found, tried {CONFIG_PATHS:?}"
            ))
        }))
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.control_port == 0 {
            return Err(config::ConfigError::Message(
                "control_port cannot be 0".into(),
            ));
        }

        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.name.as_str()) {
                return Err(config::ConfigError::Message(format!(
                    "duplicate user: {}",
                    user.name
                )));
            }
        }

        Ok(())
    }

    /// Bind address and control port as a socket address string
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn login_permission(&self) -> ConcurrentLoginPermission {
        ConcurrentLoginPermission::new(self.max_logins, self.max_logins_per_ip)
    }
}
