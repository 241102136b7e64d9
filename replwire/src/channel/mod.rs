//! Channel layer for prompt synchronization and output cleanup.
//!
//! This module turns the child's raw byte stream into prompt-delimited
//! captures and filters terminal redraw noise out of them.

mod buffer;
pub mod filter;
mod interrupt;
mod patterns;
mod reader;

pub use buffer::PatternBuffer;
pub use filter::{AnsiStripFilter, RedrawFilter, ResponseFilter};
pub use interrupt::{InterruptHandle, InterruptListener};
pub use patterns::{PromptHit, PromptKind, PromptMatcher, PromptPatterns};
pub use reader::{Expectation, PromptMatch, PromptReader};
