use crate::billing::RateSchedule;
use crate::error::{AppError, Result};
use crate::link::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub rates: RateSchedule,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Target meter for this run. The defaults are the device's factory
/// access-point address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Where known devices are persisted.
    #[serde(default = "default_registry_path")]
    pub path: String,
}

fn default_registry_path() -> String {
    "devices.json".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then
    /// parse and validate. If METER_HOST is set it overrides
    /// `device.host` regardless of what the file says.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("METER_HOST") {
            cfg.device.host = host;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// All-defaults configuration for running against a factory device
    /// without a config file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.device.host.is_empty() {
            return Err(AppError::Config("device host cannot be empty".to_string()));
        }
        if self.device.port == 0 {
            return Err(AppError::Config("device port cannot be 0".to_string()));
        }
        self.rates.validate()
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" escapes a literal "$"; a bare "$" passes through unchanged.
fn expand_env_placeholders(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let close = match it.peek() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };
        it.next();
        let mut var = String::new();
        loop {
            match it.next() {
                Some(ch) if ch == close => break,
                Some(ch) => var.push(ch),
                None => {
                    return Err(AppError::Config(format!(
                        "unterminated env placeholder: missing '{}'",
                        close
                    )))
                }
            }
        }
        let val = std::env::var(&var)
            .map_err(|_| AppError::Config(format!("missing environment variable: {}", var)))?;
        out.push_str(&val);
    }

    Ok(out)
}
