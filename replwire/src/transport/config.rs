//! Child process launch configuration.

use std::fmt;

/// Resolved invocation of the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnConfig {
    /// Executable name or path, resolved through `PATH`.
    pub program: String,

    /// Arguments, one element per argv entry.
    pub args: Vec<String>,

    /// Environment overrides applied on top of the inherited environment.
    pub env: Vec<(String, String)>,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,
}

impl SpawnConfig {
    /// Create a config for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: vec![("TERM".to_string(), "xterm".to_string())],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }
}

impl fmt::Display for SpawnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
