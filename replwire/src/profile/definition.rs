//! Shell profile describing everything shell-specific about a session.

use uuid::Uuid;

use super::options::LaunchOptions;
use crate::channel::PromptPatterns;
use crate::error::ConfigError;
use crate::transport::SpawnConfig;

/// Shell profile containing all shell-specific configuration.
///
/// The driver itself knows nothing about a particular shell; it asks the
/// profile how to launch it, what its prompts look like and how to clean its
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProfile {
    /// Profile name (e.g., "mongo").
    pub name: String,

    /// Stem of the default options file, `<config_name>_config.yml`.
    pub config_name: String,

    /// Executable launched for each session.
    pub executable: String,

    /// Text placed before the random token in the primary prompt.
    pub prompt_prefix: String,

    /// Text placed after the random token in the primary prompt.
    pub prompt_suffix: String,

    /// Statement that installs the prompt; `{prompt}` is substituted.
    pub prompt_assignment: String,

    /// Helper definitions evaluated at startup after the prompt assignment.
    pub helpers: Vec<String>,

    /// Flag introducing the startup script.
    pub eval_flag: String,

    /// Arguments placed after the launch options (e.g. `--shell`).
    pub trailing_args: Vec<String>,

    /// Regex matching the continuation prompt.
    pub continuation_pattern: String,

    /// Prefix marking a comment line in submitted code.
    pub comment_marker: String,

    /// Longest normalized command the shell accepts on one line.
    pub max_command_length: usize,

    /// Redraw-only sequence printed after the prompt; `{col}` is replaced by
    /// the column following the prompt.
    pub redraw_template: Option<String>,

    /// Escape-code bodies the response filter removes.
    pub strip_patterns: Vec<String>,

    /// Options-file keys that never become launch flags.
    pub ignored_option_keys: Vec<String>,
}

impl ShellProfile {
    /// Create a profile with minimal required fields.
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            config_name: name.clone(),
            name,
            executable: executable.into(),
            prompt_prefix: String::new(),
            prompt_suffix: String::new(),
            prompt_assignment: "prompt = '{prompt}'".to_string(),
            helpers: vec![],
            eval_flag: "--eval".to_string(),
            trailing_args: vec![],
            continuation_pattern: r"\.\.\. $".to_string(),
            comment_marker: "//".to_string(),
            max_command_length: 1024,
            redraw_template: None,
            strip_patterns: vec![],
            ignored_option_keys: vec![],
        }
    }

    /// Set the stem of the default options file.
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = name.into();
        self
    }

    /// Set the text around the random prompt token.
    pub fn with_prompt_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prompt_prefix = prefix.into();
        self.prompt_suffix = suffix.into();
        self
    }

    /// Set the prompt assignment statement.
    pub fn with_prompt_assignment(mut self, template: impl Into<String>) -> Self {
        self.prompt_assignment = template.into();
        self
    }

    /// Add a helper definition.
    pub fn with_helper(mut self, definition: impl Into<String>) -> Self {
        self.helpers.push(definition.into());
        self
    }

    /// Set the flag introducing the startup script.
    pub fn with_eval_flag(mut self, flag: impl Into<String>) -> Self {
        self.eval_flag = flag.into();
        self
    }

    /// Add an argument after the launch options.
    pub fn with_trailing_arg(mut self, arg: impl Into<String>) -> Self {
        self.trailing_args.push(arg.into());
        self
    }

    /// Set the continuation prompt regex.
    pub fn with_continuation_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.continuation_pattern = pattern.into();
        self
    }

    /// Set the comment marker.
    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    /// Set the command length limit.
    pub fn with_max_command_length(mut self, limit: usize) -> Self {
        self.max_command_length = limit;
        self
    }

    /// Set the redraw-only sequence template.
    pub fn with_redraw_template(mut self, template: impl Into<String>) -> Self {
        self.redraw_template = Some(template.into());
        self
    }

    /// Add an escape-code body for the response filter to remove.
    pub fn with_strip_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.strip_patterns.push(pattern.into());
        self
    }

    /// Ignore an options-file key.
    pub fn with_ignored_option(mut self, key: impl Into<String>) -> Self {
        self.ignored_option_keys.push(key.into());
        self
    }

    /// Generate a fresh primary prompt embedding a random token.
    pub fn generate_prompt(&self) -> String {
        format!(
            "{}{}{}",
            self.prompt_prefix,
            Uuid::new_v4(),
            self.prompt_suffix
        )
    }

    /// The startup script: prompt assignment followed by the helpers.
    pub fn init_script(&self, prompt: &str) -> String {
        std::iter::once(self.prompt_assignment.replace("{prompt}", prompt))
            .chain(self.helpers.iter().cloned())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Assemble the invocation for a session using `prompt`.
    ///
    /// `<executable> <eval_flag> "<init script>" [options...] [trailing...]`
    pub fn spawn_config(&self, prompt: &str, options: &LaunchOptions) -> SpawnConfig {
        SpawnConfig::new(&self.executable)
            .arg(&self.eval_flag)
            .arg(self.init_script(prompt))
            .args(options.args().iter().cloned())
            .args(self.trailing_args.iter().cloned())
    }

    /// Compile the prompt patterns for a session using `prompt`.
    pub fn patterns(&self, prompt: &str) -> Result<PromptPatterns, ConfigError> {
        PromptPatterns::new(prompt, &self.continuation_pattern)
    }

    /// Redraw-only sequences that may follow `prompt` without new output.
    pub fn redraw_sequences(&self, prompt: &str) -> Vec<Vec<u8>> {
        let col = prompt.chars().count() + 1;
        self.redraw_template
            .iter()
            .map(|t| t.replace("{col}", &col.to_string()).into_bytes())
            .collect()
    }

    /// Whether an options-file key is ignored for this shell.
    pub fn ignores_option(&self, key: &str) -> bool {
        self.ignored_option_keys.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ShellProfile {
        ShellProfile::new("test", "testsh")
            .with_prompt_affixes("t<", ">t")
            .with_helper("function f() {}")
            .with_trailing_arg("--shell")
            .with_redraw_template("\x1b[{col}G")
    }

    #[test]
    fn test_prompts_are_unique() {
        let profile = profile();
        let a = profile.generate_prompt();
        let b = profile.generate_prompt();
        assert_ne!(a, b);
        assert!(a.starts_with("t<") && a.ends_with(">t"));
        assert_eq!(a.len(), 2 + 36 + 2);
    }

    #[test]
    fn test_config_name_defaults_to_profile_name() {
        assert_eq!(profile().config_name, "test");
        assert_eq!(profile().with_config_name("itest").config_name, "itest");
    }

    #[test]
    fn test_init_script() {
        assert_eq!(
            profile().init_script("P"),
            "prompt = 'P'; function f() {}"
        );
        assert_eq!(ShellProfile::new("bare", "sh").init_script("P"), "prompt = 'P'");
    }

    #[test]
    fn test_spawn_config_argument_order() {
        let mut options = LaunchOptions::default();
        options.push_option("port", "27018");
        options.push_flag("quiet");

        let config = profile().spawn_config("P", &options);
        assert_eq!(config.program, "testsh");
        assert_eq!(
            config.args,
            vec![
                "--eval",
                "prompt = 'P'; function f() {}",
                "--port",
                "27018",
                "--quiet",
                "--shell"
            ]
        );
    }

    #[test]
    fn test_redraw_sequence_uses_prompt_width() {
        assert_eq!(
            profile().redraw_sequences("abcd"),
            vec![b"\x1b[5G".to_vec()]
        );
        assert!(ShellProfile::new("bare", "sh").redraw_sequences("abcd").is_empty());
    }
}
