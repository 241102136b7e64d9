//! Pattern matching utilities for prompt detection.

use regex::bytes::Regex;

use super::buffer::PatternBuffer;
use crate::error::ConfigError;

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Returns the byte span of the first match, or None if no match.
    fn find_span(&self, data: &[u8]) -> Option<(usize, usize)>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_span(data).is_some()
    }
}

/// Regex-based prompt matcher (the default implementation).
impl PromptMatcher for Regex {
    fn find_span(&self, data: &[u8]) -> Option<(usize, usize)> {
        self.find(data).map(|m| (m.start(), m.end()))
    }
}

/// Which of the two prompts ended a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// The shell is ready for a new statement.
    Primary,
    /// The shell considers the statement unfinished.
    Continuation,
}

/// A located prompt inside a [`PatternBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptHit {
    pub kind: PromptKind,
    pub start: usize,
    pub end: usize,
}

/// The primary and continuation prompt patterns of one session.
#[derive(Debug, Clone)]
pub struct PromptPatterns {
    primary: Regex,
    continuation: Regex,
}

impl PromptPatterns {
    /// Build patterns from a literal primary prompt and a continuation regex.
    ///
    /// The primary prompt is escaped so a generated token is matched verbatim.
    pub fn new(primary_literal: &str, continuation: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            primary: Regex::new(&regex::escape(primary_literal))?,
            continuation: Regex::new(continuation)?,
        })
    }

    /// The primary prompt pattern.
    pub fn primary(&self) -> &Regex {
        &self.primary
    }

    /// The continuation prompt pattern.
    pub fn continuation(&self) -> &Regex {
        &self.continuation
    }

    /// Find the earliest prompt in the buffer's search window.
    ///
    /// When both patterns match at the same offset the primary prompt wins.
    pub fn locate(&self, buffer: &PatternBuffer) -> Option<PromptHit> {
        let primary = buffer
            .search_window(&self.primary)
            .map(|(start, end)| PromptHit {
                kind: PromptKind::Primary,
                start,
                end,
            });
        let continuation = buffer
            .search_window(&self.continuation)
            .map(|(start, end)| PromptHit {
                kind: PromptKind::Continuation,
                start,
                end,
            });

        match (primary, continuation) {
            (Some(p), Some(c)) if c.start < p.start => Some(c),
            (Some(p), _) => Some(p),
            (None, c) => c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "mongo3f2a-11mongo";

    fn patterns() -> PromptPatterns {
        PromptPatterns::new(PROMPT, r"\.\.\. $").unwrap()
    }

    #[test]
    fn test_regex_prompt_matcher() {
        let pattern = Regex::new(r"shell>\s*$").unwrap();
        assert!(pattern.is_match(b"shell> "));
        assert!(pattern.is_match(b"some output\nshell>"));
        assert_eq!(pattern.find_span(b"ab shell>"), Some((3, 9)));
        assert!(!PromptMatcher::is_match(&pattern, b"shell# "));
    }

    #[test]
    fn test_primary_is_literal() {
        let patterns = PromptPatterns::new("db.(x)>", r"\.\.\. $").unwrap();
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"dbA(x)>");
        assert!(patterns.locate(&buffer).is_none());

        buffer.extend(b"db.(x)>");
        let hit = patterns.locate(&buffer).unwrap();
        assert_eq!(hit.kind, PromptKind::Primary);
        assert_eq!((hit.start, hit.end), (7, 14));
    }

    #[test]
    fn test_continuation_only_at_end() {
        let patterns = patterns();
        let mut buffer = PatternBuffer::new(100);

        buffer.extend(b"loading... done\n");
        assert!(patterns.locate(&buffer).is_none());

        buffer.extend(b"... ");
        assert_eq!(
            patterns.locate(&buffer).unwrap().kind,
            PromptKind::Continuation
        );
    }

    #[test]
    fn test_earliest_prompt_wins() {
        let patterns = patterns();
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(format!("1\r\n{PROMPT}2\r\n{PROMPT}").as_bytes());

        let hit = patterns.locate(&buffer).unwrap();
        assert_eq!(hit.kind, PromptKind::Primary);
        assert_eq!(hit.start, 3);
    }

    #[test]
    fn test_invalid_continuation_pattern() {
        assert!(matches!(
            PromptPatterns::new(PROMPT, r"(unclosed"),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
