//! Shell version probing.

use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;

use crate::error::StartupError;

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"version\D*(\d+(\.\d+)+)").ok());

/// Banner printed by `<shell> --version` and the version parsed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellVersion {
    /// Full trimmed banner text.
    pub banner: String,

    /// Dotted version number, when the banner contains one.
    pub version: Option<String>,
}

/// Extract the dotted version number following the word "version".
pub fn parse_version(banner: &str) -> Option<String> {
    VERSION_PATTERN
        .as_ref()?
        .captures(banner)
        .map(|c| c[1].to_string())
}

/// Run `<executable> --version` and parse its banner.
pub async fn probe_version(executable: &str) -> Result<ShellVersion, StartupError> {
    let output = Command::new(executable)
        .arg("--version")
        .output()
        .await
        .map_err(|e| StartupError::Spawn {
            program: executable.to_string(),
            message: e.to_string(),
        })?;

    let banner = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(ShellVersion {
        version: parse_version(&banner),
        banner,
    })
}
