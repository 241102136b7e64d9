//! MongoDB legacy shell (`mongo`) profile.
//!
//! The shell is started with `--eval` to install a unique prompt and a
//! `dir()` helper, then `--shell` to stay interactive. Its line editor
//! repaints the prompt line with cursor-column and erase-line codes.

use super::ShellProfile;

/// Helper listing an object's attributes, used for introspection.
pub const DIR_HELPER: &str = "function dir(object) { attributes = []; \
     for (attr in object) {attributes.push(attr);} \
     attributes.sort(); return attributes;}";

/// Create the MongoDB legacy shell profile.
pub fn profile() -> ShellProfile {
    ShellProfile::new("mongo", "mongo")
        .with_config_name("imongo")
        .with_prompt_affixes("mongo", "mongo")
        .with_prompt_assignment("prompt = '{prompt}'")
        .with_helper(DIR_HELPER)
        .with_eval_flag("--eval")
        .with_trailing_arg("--shell")
        .with_continuation_pattern(r"\.\.\. $")
        .with_comment_marker("//")
        .with_max_command_length(1024)
        .with_redraw_template("\x1b[{col}G\x1b[J\x1b[{col}G")
        .with_strip_pattern(r"\[\d+[A-Z]")
        .with_strip_pattern(r"\[J")
        .with_ignored_option("shell")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{PatternBuffer, PromptKind};
    use crate::profile::LaunchOptions;

    #[test]
    fn test_mongo_profile() {
        let profile = profile();
        assert_eq!(profile.name, "mongo");
        assert_eq!(profile.max_command_length, 1024);
        assert!(profile.ignores_option("shell"));
        assert_eq!(profile.config_name, "imongo");
    }

    #[test]
    fn test_invocation() {
        let profile = profile();
        let prompt = profile.generate_prompt();
        let config = profile.spawn_config(&prompt, &LaunchOptions::default());

        assert_eq!(config.program, "mongo");
        assert_eq!(config.args[0], "--eval");
        assert!(config.args[1].starts_with(&format!("prompt = '{}'; function dir(object)", prompt)));
        assert_eq!(config.args.last().map(String::as_str), Some("--shell"));
    }

    #[test]
    fn test_redraw_sequence_column() {
        let profile = profile();
        let prompt = profile.generate_prompt();
        // "mongo" + 36-character UUID + "mongo"
        assert_eq!(
            profile.redraw_sequences(&prompt),
            vec![b"\x1b[47G\x1b[J\x1b[47G".to_vec()]
        );
    }

    #[test]
    fn test_prompts() {
        let profile = profile();
        let prompt = profile.generate_prompt();
        let patterns = profile.patterns(&prompt).unwrap();

        let mut buffer = PatternBuffer::new(1000);
        buffer.extend(format!("MongoDB shell version v3.6.3\r\n{}", prompt).as_bytes());
        assert_eq!(patterns.locate(&buffer).unwrap().kind, PromptKind::Primary);

        let mut buffer = PatternBuffer::new(1000);
        buffer.extend(b"db.test.find({\r\n... ");
        assert_eq!(
            patterns.locate(&buffer).unwrap().kind,
            PromptKind::Continuation
        );
    }
}
