//! Response filters turning raw terminal captures into clean text.
//!
//! Line-editing shells repaint the input line every time the cursor moves,
//! so one logical line arrives as several escape-separated renderings. The
//! exact sequences differ between shell and terminal versions, which is why
//! the filter is a trait with an overridable default.

use memchr::memchr;
use regex::Regex;
use vte::{Parser, Perform};

use crate::error::ConfigError;

const ESC: char = '\x1b';

/// Cursor-positioning and erase-line codes emitted by the legacy mongo shell.
pub const DEFAULT_STRIP_PATTERNS: &[&str] = &[r"\[\d+[A-Z]", r"\[J"];

/// Converts the raw text captured between two prompts into the response.
pub trait ResponseFilter: Send + Sync {
    /// Filter `raw` into the text returned to the caller.
    fn filter(&self, raw: &str) -> String;
}

/// Collapses redraw repetitions down to the final rendering.
///
/// 1. Removes the configured escape-code bodies.
/// 2. Splits on the escape character into trimmed fragments.
/// 3. Walks fragments from the last one backwards, keeping a fragment only if
///    it is not contained in the most recently kept one.
/// 4. Returns the first kept fragment, i.e. the last complete rendering.
#[derive(Debug, Clone)]
pub struct RedrawFilter {
    strip: Vec<Regex>,
}

impl RedrawFilter {
    /// Filter using [`DEFAULT_STRIP_PATTERNS`].
    pub fn new() -> Self {
        Self::with_patterns(DEFAULT_STRIP_PATTERNS)
            .unwrap_or_else(|_| Self { strip: Vec::new() })
    }

    /// Filter removing `patterns` instead of the defaults.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let strip = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { strip })
    }

    /// Split on the escape character and collapse repeated renderings.
    ///
    /// Returned in arrival order.
    pub fn surviving_fragments(text: &str) -> Vec<&str> {
        let fragments = text
            .split(ESC)
            .filter(|f| !f.is_empty())
            .map(str::trim);

        let mut kept: Vec<&str> = Vec::new();
        for fragment in fragments.rev() {
            match kept.last() {
                Some(last) if last.contains(fragment) => {}
                _ => kept.push(fragment),
            }
        }
        kept.reverse();
        kept
    }
}

impl Default for RedrawFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFilter for RedrawFilter {
    fn filter(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for pattern in &self.strip {
            text = pattern.replace_all(&text, "").into_owned();
        }

        if memchr(ESC as u8, text.as_bytes()).is_none() {
            return text.trim().to_string();
        }

        Self::surviving_fragments(&text)
            .last()
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}

/// Interprets the capture as a terminal would and keeps only printed text.
///
/// Suited to shells whose redraws are not simple repetitions. Carriage
/// returns are dropped, line feeds and tabs are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiStripFilter;

struct PrintedText(String);

impl Perform for PrintedText {
    fn print(&mut self, c: char) {
        self.0.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\n' || byte == b'\t' {
            self.0.push(byte as char);
        }
    }
}

impl ResponseFilter for AnsiStripFilter {
    fn filter(&self, raw: &str) -> String {
        let mut parser: Parser = Parser::new();
        let mut printed = PrintedText(String::with_capacity(raw.len()));
        parser.advance(&mut printed, raw.as_bytes());

        printed
            .0
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_is_trimmed() {
        let filter = RedrawFilter::new();
        assert_eq!(filter.filter("5\r\n"), "5");
        assert_eq!(filter.filter("\r\n"), "");
        assert_eq!(filter.filter(""), "");
    }

    #[test]
    fn test_filter_is_idempotent_on_clean_text() {
        let filter = RedrawFilter::new();
        for clean in ["5", "{ \"_id\" : 1, \"n\" : 2 }", "line one\r\nline two", ""] {
            let once = filter.filter(clean);
            assert_eq!(filter.filter(&once), once);
        }
        assert_eq!(filter.filter("5"), "5");
    }

    #[test]
    fn test_redraw_fragments_collapse() {
        // Arrival order abc, ab, abc: walking backwards keeps "abc" and drops
        // both shorter or equal renderings.
        assert_eq!(
            RedrawFilter::surviving_fragments("abc\x1bab\x1babc"),
            vec!["abc"]
        );
        assert_eq!(RedrawFilter::new().filter("abc\x1bab\x1babc"), "abc");
    }

    #[test]
    fn test_distinct_fragments_survive() {
        assert_eq!(
            RedrawFilter::surviving_fragments("db.x\x1b 5 "),
            vec!["db.x", "5"]
        );
        assert_eq!(RedrawFilter::new().filter("db.x\x1b 5 "), "5");
    }

    #[test]
    fn test_golden_linenoise_count() {
        // Capture from `db.test.count()` on the legacy shell: the echoed input
        // is repainted at column 47 before the result is printed.
        let raw = "db.test.count()\x1b[47G\x1b[J\x1b[47Gdb.test.count()\x1b[62G\r\n5\r\n";
        assert_eq!(RedrawFilter::new().filter(raw), "5");
    }

    #[test]
    fn test_golden_only_redraw_codes() {
        assert_eq!(RedrawFilter::new().filter("\x1b[47G\x1b[J\x1b[47G"), "");
    }

    #[test]
    fn test_golden_document_output() {
        let raw = "db.c.findOne()\x1b[62G\r\n{ \"_id\" : ObjectId(\"5a0c\"), \"n\" : 1 }\r\n";
        assert_eq!(
            RedrawFilter::new().filter(raw),
            "{ \"_id\" : ObjectId(\"5a0c\"), \"n\" : 1 }"
        );
    }

    #[test]
    fn test_custom_patterns() {
        let filter = RedrawFilter::with_patterns(&[r"\[\?2004[hl]"]).unwrap();
        assert_eq!(filter.filter("\x1b[?2004hok\r\n"), "ok");
        assert!(RedrawFilter::with_patterns(&["("]).is_err());
    }

    #[test]
    fn test_ansi_strip_filter() {
        let filter = AnsiStripFilter;
        assert_eq!(
            filter.filter("\x1b[32mgreen\x1b[0m\r\nnext line  \r\n"),
            "green\nnext line"
        );
    }
}
