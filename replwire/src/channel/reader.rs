//! Prompt-synchronized reader over the child's output stream.

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::interrupt::InterruptListener;
use super::patterns::{PromptKind, PromptPatterns};
use crate::error::{Error, Result};
use crate::transport::{Transport, TryRecv};

/// How a wait for the next prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMatch {
    /// The primary prompt appeared: the shell is ready.
    Primary,
    /// The continuation prompt appeared: the input was incomplete.
    Continuation,
    /// No prompt before the deadline.
    Timeout,
    /// The output stream ended.
    Eof,
}

impl From<PromptKind> for PromptMatch {
    fn from(kind: PromptKind) -> Self {
        match kind {
            PromptKind::Primary => PromptMatch::Primary,
            PromptKind::Continuation => PromptMatch::Continuation,
        }
    }
}

/// Result of one wait: the outcome plus the output that preceded the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub outcome: PromptMatch,

    /// Bytes before the prompt. On `Eof` this is everything left unconsumed;
    /// on `Timeout` it is empty and the partial output stays buffered.
    pub before: Vec<u8>,
}

impl Expectation {
    /// `before` as text (lossy UTF-8).
    pub fn before_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.before)
    }
}

enum Received {
    Data(Vec<u8>),
    Eof,
    Timeout,
}

/// Reads shell output until one of the session's prompts appears.
///
/// Output following a matched prompt is kept for the next wait and for the
/// emptiness check the driver runs after every primary prompt.
#[derive(Debug)]
pub struct PromptReader {
    buffer: PatternBuffer,
    patterns: PromptPatterns,
}

impl PromptReader {
    /// Create a reader for a session's prompt patterns.
    pub fn new(patterns: PromptPatterns, search_depth: usize) -> Self {
        Self {
            buffer: PatternBuffer::new(search_depth),
            patterns,
        }
    }

    /// The patterns this reader waits for.
    pub fn patterns(&self) -> &PromptPatterns {
        &self.patterns
    }

    /// Output received after the last matched prompt.
    pub fn remainder(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Whether the remainder is blank or one of the shell's redraw-only
    /// sequences, i.e. the shell has nothing further to say.
    pub fn remainder_is_idle(&self, redraw_sequences: &[Vec<u8>]) -> bool {
        let rest = self.buffer.as_slice().trim_ascii();
        rest.is_empty()
            || redraw_sequences
                .iter()
                .any(|seq| seq.as_slice().trim_ascii() == rest)
    }

    /// Drop buffered output and anything already delivered by the transport.
    ///
    /// Returns the number of bytes discarded.
    pub fn discard_stale<T: Transport>(&mut self, transport: &mut T) -> usize {
        let mut discarded = self.buffer.len();
        self.buffer.clear();
        while let TryRecv::Data(chunk) = transport.try_recv() {
            discarded += chunk.len();
        }
        discarded
    }

    /// Wait until the primary or continuation prompt appears, the stream
    /// ends, or `timeout` elapses (`None` waits indefinitely).
    ///
    /// Fails only with [`Error::Interrupted`] when `interrupt` fires first.
    pub async fn expect<T: Transport>(
        &mut self,
        transport: &mut T,
        timeout: Option<Duration>,
        interrupt: &mut InterruptListener,
    ) -> Result<Expectation> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if let Some(hit) = self.patterns.locate(&self.buffer) {
                let before = self.buffer.consume_match(hit.start, hit.end);
                trace!(
                    "prompt {:?} after {} bytes, {} bytes remain",
                    hit.kind,
                    before.len(),
                    self.buffer.len()
                );
                return Ok(Expectation {
                    outcome: hit.kind.into(),
                    before,
                });
            }
            self.buffer.mark_scanned();

            let received = tokio::select! {
                biased;
                _ = interrupt.triggered() => return Err(Error::Interrupted),
                received = receive(transport, deadline) => received,
            };

            match received {
                Received::Data(chunk) => self.buffer.extend(&chunk),
                Received::Eof => {
                    return Ok(Expectation {
                        outcome: PromptMatch::Eof,
                        before: self.buffer.take(),
                    });
                }
                Received::Timeout => {
                    return Ok(Expectation {
                        outcome: PromptMatch::Timeout,
                        before: Vec::new(),
                    });
                }
            }
        }
    }
}

async fn receive<T: Transport>(transport: &mut T, deadline: Option<Instant>) -> Received {
    let chunk = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, transport.recv()).await {
            Ok(chunk) => chunk,
            Err(_) => return Received::Timeout,
        },
        None => transport.recv().await,
    };
    match chunk {
        Some(data) => Received::Data(data),
        None => Received::Eof,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::{ScriptedSpawner, SessionScript};
    use crate::transport::{SpawnConfig, Spawner};

    const PROMPT: &str = "mongoTOKENmongo";

    fn reader() -> PromptReader {
        PromptReader::new(PromptPatterns::new(PROMPT, r"\.\.\. $").unwrap(), 1000)
    }

    fn spawn(script: SessionScript) -> crate::transport::scripted::ScriptedTransport {
        let (mut spawner, _log) = ScriptedSpawner::new(vec![script]);
        let config = SpawnConfig::new("mongo").arg(format!("prompt = '{PROMPT}'"));
        spawner.spawn(&config).unwrap()
    }

    #[tokio::test]
    async fn test_primary_prompt_splits_output() {
        let mut transport = spawn(SessionScript::ready());
        let mut reader = reader();
        let mut interrupt = InterruptListener::new();

        let exp = reader
            .expect(&mut transport, Some(Duration::from_secs(1)), &mut interrupt)
            .await
            .unwrap();
        assert_eq!(exp.outcome, PromptMatch::Primary);
        assert_eq!(exp.before_str(), "shell banner\r\n");
        assert!(reader.remainder_is_idle(&[]));
    }

    #[tokio::test]
    async fn test_continuation_prompt() {
        let mut transport = spawn(SessionScript::ready().then_output("for (;;\r\n... "));
        let mut reader = reader();
        let mut interrupt = InterruptListener::new();
        reader
            .expect(&mut transport, None, &mut interrupt)
            .await
            .unwrap();

        transport.write_all(b"for (;;\n").await.unwrap();
        let exp = reader
            .expect(&mut transport, None, &mut interrupt)
            .await
            .unwrap();
        assert_eq!(exp.outcome, PromptMatch::Continuation);
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let mut transport = spawn(SessionScript::silent());
        let mut reader = reader();
        let mut interrupt = InterruptListener::new();

        let exp = reader
            .expect(&mut transport, Some(Duration::from_millis(20)), &mut interrupt)
            .await
            .unwrap();
        assert_eq!(exp.outcome, PromptMatch::Timeout);
        assert!(exp.before.is_empty());
    }

    #[tokio::test]
    async fn test_eof_returns_unconsumed_output() {
        let mut transport = spawn(SessionScript::exits_at_start());
        let mut reader = reader();
        let mut interrupt = InterruptListener::new();

        let exp = reader
            .expect(&mut transport, Some(Duration::from_secs(1)), &mut interrupt)
            .await
            .unwrap();
        assert_eq!(exp.outcome, PromptMatch::Eof);
        assert_eq!(exp.before_str(), "error: bad option\r\n");
    }

    #[tokio::test]
    async fn test_interrupt_aborts_wait() {
        let mut transport = spawn(SessionScript::silent());
        let mut reader = reader();
        let mut interrupt = InterruptListener::new();
        interrupt.handle().interrupt();

        let err = reader
            .expect(&mut transport, None, &mut interrupt)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[tokio::test]
    async fn test_redraw_remainder_counts_as_idle() {
        let redraw = b"\x1b[16G\x1b[J\x1b[16G".to_vec();
        let mut transport = spawn(SessionScript::silent());
        let mut reader = reader();
        reader
            .buffer
            .extend(format!("5\r\n{PROMPT}\x1b[16G\x1b[J\x1b[16G  ").as_bytes());
        let mut interrupt = InterruptListener::new();

        let exp = reader
            .expect(&mut transport, None, &mut interrupt)
            .await
            .unwrap();
        assert_eq!(exp.before_str(), "5\r\n");
        assert!(!reader.remainder_is_idle(&[]));
        assert!(reader.remainder_is_idle(&[redraw]));
    }

    #[tokio::test]
    async fn test_discard_stale_drains_pending_output() {
        let mut transport = spawn(SessionScript::ready());
        let mut reader = reader();
        reader.buffer.extend(b"old");

        let expected = "old".len() + "shell banner\r\n".len() + PROMPT.len();
        assert_eq!(reader.discard_stale(&mut transport), expected);
        assert!(reader.remainder().is_empty());
        assert_eq!(transport.try_recv(), TryRecv::Empty);
    }
}
