//! Extra launch options read from an optional YAML file.
//!
//! Each key becomes a command-line flag:
//!
//! ```yaml
//! host: db.example.com   # --host db.example.com
//! port: 27018            # --port 27018
//! quiet: true            # --quiet
//! nodb:                  # --nodb
//! ipv6: false            # --ipv6
//! shell: true            # ignored, the driver always adds it
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use serde_yaml::Value;

use crate::error::ConfigError;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "JUPYTER_CONFIG_DIR";

/// Directory under the home directory used when the variable is unset.
pub const DEFAULT_CONFIG_DIR: &str = ".jupyter";

/// Ordered list of extra arguments for the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    args: Vec<String>,
}

impl LaunchOptions {
    /// Create an empty option list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bare `--key` flag.
    pub fn push_flag(&mut self, key: &str) {
        self.args.push(format!("--{}", key));
    }

    /// Add a `--key value` pair.
    pub fn push_option(&mut self, key: &str, value: impl Into<String>) {
        self.args.push(format!("--{}", key));
        self.args.push(value.into());
    }

    /// Append all arguments of `other`.
    pub fn extend(&mut self, other: LaunchOptions) {
        self.args.extend(other.args);
    }

    /// The arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether no options are set.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Parse options from YAML text, skipping `ignored` keys.
    pub fn from_yaml_str(text: &str, ignored: &[String], path: &Path) -> Result<Self, ConfigError> {
        let map: Option<IndexMap<String, Value>> =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut options = Self::new();
        for (key, value) in map.unwrap_or_default() {
            if ignored.iter().any(|k| *k == key) {
                continue;
            }
            match value {
                Value::Null | Value::Bool(_) => options.push_flag(&key),
                Value::String(s) if s.is_empty() => options.push_flag(&key),
                Value::String(s) => options.push_option(&key, s),
                Value::Number(n) => options.push_option(&key, n.to_string()),
                Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
                    return Err(ConfigError::InvalidOption {
                        key,
                        reason: "value must be a scalar".to_string(),
                    });
                }
            }
        }
        Ok(options)
    }

    /// Load options from `path`. A missing file yields no options.
    pub fn load(path: &Path, ignored: &[String]) -> Result<Self, ConfigError> {
        info!("Trying to load {}", path.display());
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Using default configuration");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_yaml_str(&text, ignored, path)
    }

    /// `<config dir>/<config_name>_config.yml`, where the config dir is
    /// `$JUPYTER_CONFIG_DIR` or `.jupyter`, relative to the home directory.
    pub fn default_path(config_name: &str) -> Option<PathBuf> {
        let dir = env::var_os(CONFIG_DIR_ENV).unwrap_or_else(|| DEFAULT_CONFIG_DIR.into());
        dirs::home_dir().map(|home| {
            home.join(dir)
                .join(format!("{}_config.yml", config_name))
        })
    }
}
