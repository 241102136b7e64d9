//! Session driver: supervises the shell process and runs the
//! request/response cycle over its terminal.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use super::Driver;
use super::command::Command;
use super::observer::{SessionEvent, SessionObserver};
use super::response::Response;
use crate::channel::{InterruptHandle, InterruptListener, PromptMatch, PromptReader, ResponseFilter};
use crate::error::{Error, ErrorKind, Result, StartupError};
use crate::profile::{LaunchOptions, ShellProfile};
use crate::transport::{EOF_BYTE, PtySpawner, Spawner, Transport};

/// Where the session stands between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No child is running. The next request starts one.
    Down,
    /// The child is idle at its primary prompt.
    Ready,
    /// A request is in flight. Observed between requests only when the
    /// previous request's future was dropped before it finished.
    Busy,
}

/// A running child with its prompt bookkeeping.
struct Session<T> {
    transport: T,
    reader: PromptReader,
    prompt: String,
    redraw: Vec<Vec<u8>>,
}

/// Drives one interactive shell over a pseudo-terminal.
///
/// The driver owns a single child process and exchanges one command at a
/// time with it. Any error that leaves the protocol in an unknown state
/// replaces the child with a fresh one before the error is returned; see
/// [`Error::restarts_session`].
///
/// Create it with [`DriverBuilder`](super::DriverBuilder).
pub struct SessionDriver<S: Spawner = PtySpawner> {
    profile: ShellProfile,
    options: LaunchOptions,
    spawner: S,
    session: Option<Session<S::Transport>>,
    filter: Arc<dyn ResponseFilter>,
    observer: Arc<dyn SessionObserver>,
    interrupt: InterruptListener,
    state: SessionState,
    generation: u64,
    timeout: Option<Duration>,
    startup_timeout: Duration,
    terminal_size: (u16, u16),
    search_depth: usize,
}

/// Settings resolved by the builder.
pub(crate) struct SessionSettings {
    pub profile: ShellProfile,
    pub options: LaunchOptions,
    pub filter: Arc<dyn ResponseFilter>,
    pub observer: Arc<dyn SessionObserver>,
    pub timeout: Option<Duration>,
    pub startup_timeout: Duration,
    pub terminal_size: (u16, u16),
    pub search_depth: usize,
}

impl<S: Spawner> SessionDriver<S> {
    pub(crate) fn new(settings: SessionSettings, spawner: S) -> Self {
        Self {
            profile: settings.profile,
            options: settings.options,
            spawner,
            session: None,
            filter: settings.filter,
            observer: settings.observer,
            interrupt: InterruptListener::new(),
            state: SessionState::Down,
            generation: 0,
            timeout: settings.timeout,
            startup_timeout: settings.startup_timeout,
            terminal_size: settings.terminal_size,
            search_depth: settings.search_depth,
        }
    }

    /// The shell profile in use.
    pub fn profile(&self) -> &ShellProfile {
        &self.profile
    }

    /// Extra launch options passed to every session.
    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of sessions started so far; increases on every restart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The primary prompt of the running session.
    pub fn prompt(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.prompt.as_str())
    }

    /// OS process id of the running shell.
    pub fn process_id(&self) -> Option<u32> {
        self.session.as_ref().and_then(|s| s.transport.process_id())
    }

    /// Default per-wait timeout. `None` waits indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Change the default per-wait timeout.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// A handle that aborts the in-flight request from another task.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.handle()
    }

    /// Start a new session, replacing any running one.
    ///
    /// A fresh prompt token is generated, the shell is spawned with it and
    /// the driver waits up to the startup timeout for the first prompt.
    pub async fn start(&mut self) -> Result<()> {
        self.teardown().await;

        let prompt = self.profile.generate_prompt();
        let patterns = self.profile.patterns(&prompt)?;
        let (width, height) = self.terminal_size;
        let config = self
            .profile
            .spawn_config(&prompt, &self.options)
            .terminal_size(width, height);

        debug!("Spawning {}", config);
        let mut transport = self.spawner.spawn(&config)?;
        self.generation += 1;
        self.observer.on_event(&SessionEvent::Spawned {
            generation: self.generation,
        });

        let started = Instant::now();
        let mut reader = PromptReader::new(patterns, self.search_depth);
        self.interrupt.reset();

        if let Err(e) = self
            .await_first_prompt(&mut reader, &mut transport, started)
            .await
        {
            transport.terminate().await;
            return Err(e);
        }

        self.observer.on_event(&SessionEvent::Ready {
            generation: self.generation,
            elapsed: started.elapsed(),
        });
        let redraw = self.profile.redraw_sequences(&prompt);
        self.session = Some(Session {
            transport,
            reader,
            prompt,
            redraw,
        });
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Tear down the running session and start a new one.
    pub async fn restart(&mut self) -> Result<()> {
        self.start().await?;
        self.observer.on_event(&SessionEvent::Restarted {
            generation: self.generation,
        });
        Ok(())
    }

    /// Start a session unless a healthy one is running.
    ///
    /// A session left busy by an abandoned request is replaced.
    pub async fn ensure_alive(&mut self) -> Result<()> {
        match (self.state, self.session.is_some()) {
            (SessionState::Ready, true) => Ok(()),
            (SessionState::Busy, true) => {
                warn!("Previous request was abandoned mid-flight");
                self.observer.on_event(&SessionEvent::Restarting {
                    reason: ErrorKind::Interrupted,
                });
                self.restart().await
            }
            _ => self.start().await,
        }
    }

    /// Execute `command` with the default timeout.
    pub async fn execute(&mut self, command: &str) -> Result<Response> {
        let timeout = self.timeout;
        self.execute_with_timeout(command, timeout).await
    }

    /// Execute `command`, waiting at most `timeout` for each prompt.
    ///
    /// The command is normalized to a single line first. A command that
    /// normalizes to nothing returns an empty response without touching the
    /// shell; one over the length limit fails without touching it.
    pub async fn execute_with_timeout(
        &mut self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let command = Command::prepare(command, &self.profile)?;
        if command.is_empty() {
            return Ok(Response::empty());
        }

        self.ensure_alive().await?;
        self.interrupt.reset();
        self.state = SessionState::Busy;
        let started = Instant::now();

        match self.transceive(&command, timeout).await {
            Ok((raw_result, drain_rounds)) => {
                self.state = SessionState::Ready;
                let result = self.filter.filter(&raw_result);
                Ok(Response::new(
                    command.as_str(),
                    result,
                    raw_result,
                    started.elapsed(),
                    drain_rounds,
                ))
            }
            Err(e) if e.restarts_session() => {
                if matches!(e, Error::Interrupted) {
                    self.send_eof().await;
                }
                self.recover(e.kind()).await;
                Err(e)
            }
            Err(e) => {
                self.state = SessionState::Ready;
                Err(e)
            }
        }
    }

    /// Terminate the shell. A later request starts a new one.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.teardown().await;
            self.observer.on_event(&SessionEvent::Shutdown);
        }
        Ok(())
    }

    /// Send the command and collect output up to an idle primary prompt.
    ///
    /// Returns the raw captured text and the number of drain rounds.
    async fn transceive(
        &mut self,
        command: &Command,
        timeout: Option<Duration>,
    ) -> Result<(String, usize)> {
        let session = self.session.as_mut().ok_or(Error::SessionTerminated)?;

        let stale = session.reader.discard_stale(&mut session.transport);
        if stale > 0 {
            debug!("Discarded {} bytes of stale output", stale);
        }

        session
            .transport
            .write_all(&command.to_line())
            .await
            .map_err(Error::TransmitFailed)?;
        self.observer.on_event(&SessionEvent::CommandSent {
            command: command.as_str().to_string(),
        });

        let mut raw = Vec::new();
        let mut rounds = 0;
        loop {
            let expectation = session
                .reader
                .expect(&mut session.transport, timeout, &mut self.interrupt)
                .await?;
            self.observer.on_event(&SessionEvent::PromptMatched {
                outcome: expectation.outcome,
            });

            match expectation.outcome {
                PromptMatch::Primary => {
                    raw.extend_from_slice(&expectation.before);
                    if session.reader.remainder_is_idle(&session.redraw) {
                        break;
                    }
                    rounds += 1;
                    self.observer
                        .on_event(&SessionEvent::DrainRound { round: rounds });
                    session
                        .transport
                        .write_all(b"\n")
                        .await
                        .map_err(Error::TransmitFailed)?;
                }
                PromptMatch::Continuation => {
                    return Err(Error::IncompleteInput {
                        command: command.as_str().to_string(),
                    });
                }
                PromptMatch::Timeout => {
                    return Err(Error::Timeout(timeout.unwrap_or_default()));
                }
                PromptMatch::Eof => return Err(Error::SessionTerminated),
            }
        }

        Ok((String::from_utf8_lossy(&raw).into_owned(), rounds))
    }

    /// Wait for the first primary prompt, discarding the banner.
    async fn await_first_prompt(
        &mut self,
        reader: &mut PromptReader,
        transport: &mut S::Transport,
        started: Instant,
    ) -> Result<()> {
        let deadline = started + self.startup_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let expectation = reader
                .expect(transport, Some(remaining), &mut self.interrupt)
                .await?;
            match expectation.outcome {
                PromptMatch::Primary => return Ok(()),
                // Banners may end in "... "; keep waiting for the real prompt.
                PromptMatch::Continuation => continue,
                PromptMatch::Eof => {
                    debug!("Shell output before exit: {}", expectation.before_str());
                    return Err(StartupError::ExitedEarly.into());
                }
                PromptMatch::Timeout => {
                    return Err(StartupError::NoPrompt(self.startup_timeout).into());
                }
            }
        }
    }

    /// Replace the session after a protocol failure.
    ///
    /// A failed restart leaves the driver down; the next request retries.
    async fn recover(&mut self, reason: ErrorKind) {
        self.observer
            .on_event(&SessionEvent::Restarting { reason });
        if let Err(e) = self.restart().await {
            self.observer.on_event(&SessionEvent::RestartFailed {
                message: e.to_string(),
            });
        }
    }

    async fn send_eof(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.transport.write_all(&[EOF_BYTE]).await {
                debug!("Failed to send EOF to interrupted shell: {}", e);
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.transport.terminate().await;
        }
        self.state = SessionState::Down;
    }
}

impl<S: Spawner> Driver for SessionDriver<S> {
    async fn open(&mut self) -> Result<()> {
        self.ensure_alive().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        SessionDriver::shutdown(self).await
    }

    async fn execute(&mut self, command: &str) -> Result<Response> {
        SessionDriver::execute(self, command).await
    }

    fn is_open(&self) -> bool {
        self.session.is_some() && self.state != SessionState::Down
    }
}
