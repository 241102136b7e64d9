//! Builder for creating session drivers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::observer::{LogObserver, SessionObserver};
use super::session::{SessionDriver, SessionSettings};
use crate::channel::{RedrawFilter, ResponseFilter};
use crate::error::{ConfigError, Result};
use crate::profile::{LaunchOptions, ShellProfile, mongo};
use crate::transport::{PtySpawner, Spawner};

/// Where extra launch options are read from.
#[derive(Debug, Clone)]
enum OptionsFile {
    None,
    Default,
    Path(PathBuf),
}

/// Builder for constructing session drivers.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use replwire::{Driver, DriverBuilder};
///
/// # async fn example() -> Result<(), replwire::Error> {
/// let mut driver = DriverBuilder::new()
///     .default_options_file()
///     .option("port", "27018")
///     .timeout(Some(Duration::from_secs(60)))
///     .build()?;
///
/// driver.open().await?;
/// let response = driver.execute("db.version()").await?;
/// println!("{}", response);
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    profile: ShellProfile,
    executable: Option<String>,
    options: LaunchOptions,
    options_file: OptionsFile,
    timeout: Option<Duration>,
    startup_timeout: Duration,
    terminal_width: u16,
    terminal_height: u16,
    observer: Option<Arc<dyn SessionObserver>>,
    filter: Option<Arc<dyn ResponseFilter>>,
    search_depth: usize,
}

impl DriverBuilder {
    /// Create a builder for the MongoDB legacy shell.
    pub fn new() -> Self {
        Self {
            profile: mongo::profile(),
            executable: None,
            options: LaunchOptions::new(),
            options_file: OptionsFile::None,
            timeout: None,
            startup_timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            observer: None,
            filter: None,
            search_depth: 1000,
        }
    }

    /// Use a different shell profile.
    pub fn profile(mut self, profile: ShellProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Override the profile's executable (e.g. an absolute path).
    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Add a `--key value` launch option.
    pub fn option(mut self, key: &str, value: impl Into<String>) -> Self {
        self.options.push_option(key, value);
        self
    }

    /// Add a bare `--key` launch flag.
    pub fn flag(mut self, key: &str) -> Self {
        self.options.push_flag(key);
        self
    }

    /// Read extra launch options from a YAML file.
    pub fn options_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options_file = OptionsFile::Path(path.into());
        self
    }

    /// Read extra launch options from `<config dir>/<config_name>_config.yml`.
    ///
    /// For the mongo profile this is `~/.jupyter/imongo_config.yml`, or the
    /// same file under `$JUPYTER_CONFIG_DIR`.
    pub fn default_options_file(mut self) -> Self {
        self.options_file = OptionsFile::Default;
        self
    }

    /// Default wait for each prompt. `None` (the default) waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long to wait for the first prompt of a new session (default: 30s).
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Receive session events. Defaults to [`LogObserver`].
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the response filter. Defaults to a [`RedrawFilter`] built
    /// from the profile's strip patterns.
    pub fn filter(mut self, filter: Arc<dyn ResponseFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Bytes of already-searched output rescanned for a prompt split across
    /// reads (default: 1000). Must be at least the prompt length.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Build a driver that runs the shell on a pseudo-terminal.
    ///
    /// This resolves the configuration but does not start the shell. Call
    /// `open()` or just `execute()` on the returned driver.
    pub fn build(self) -> Result<SessionDriver<PtySpawner>> {
        self.build_with_spawner(PtySpawner::new())
    }

    /// Build a driver that launches shells through `spawner`.
    pub fn build_with_spawner<S: Spawner>(self, spawner: S) -> Result<SessionDriver<S>> {
        let mut profile = self.profile;
        if let Some(executable) = self.executable {
            profile.executable = executable;
        }

        let minimum = profile.generate_prompt().len();
        if self.search_depth < minimum {
            return Err(ConfigError::SearchDepth {
                depth: self.search_depth,
                minimum,
            }
            .into());
        }

        let path = match self.options_file {
            OptionsFile::None => None,
            OptionsFile::Default => LaunchOptions::default_path(&profile.config_name),
            OptionsFile::Path(path) => Some(path),
        };
        let mut options = match path {
            Some(path) => LaunchOptions::load(&path, &profile.ignored_option_keys)?,
            None => LaunchOptions::new(),
        };
        options.extend(self.options);
        debug!("Launch options for {}: {:?}", profile.name, options.args());

        let filter = match self.filter {
            Some(filter) => filter,
            None => Arc::new(RedrawFilter::with_patterns(profile.strip_patterns.as_slice())?),
        };

        let settings = SessionSettings {
            profile,
            options,
            filter,
            observer: self.observer.unwrap_or_else(|| Arc::new(LogObserver)),
            timeout: self.timeout,
            startup_timeout: self.startup_timeout,
            terminal_size: (self.terminal_width, self.terminal_height),
            search_depth: self.search_depth,
        };
        Ok(SessionDriver::new(settings, spawner))
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
