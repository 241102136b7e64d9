//! Scripted in-memory transport used by the driver tests.
//!
//! Each spawned session replays a [`SessionScript`]: a greeting emitted at
//! spawn time, then one reply per write. `{PROMPT}` in scripted output is
//! replaced with the primary prompt the driver generated for that session.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use regex::Regex;

use super::config::SpawnConfig;
use super::{Spawner, Transport, TryRecv};
use crate::error::StartupError;

#[derive(Debug, Clone)]
pub(crate) enum Event {
    Output(String),
    Close,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SessionScript {
    greeting: Vec<Event>,
    replies: VecDeque<Vec<Event>>,
}

impl SessionScript {
    /// A shell that prints a banner and its prompt.
    pub(crate) fn ready() -> Self {
        Self {
            greeting: vec![Event::Output("shell banner\r\n{PROMPT}".into())],
            replies: VecDeque::new(),
        }
    }

    /// A shell that prints a banner and exits.
    pub(crate) fn exits_at_start() -> Self {
        Self {
            greeting: vec![Event::Output("error: bad option\r\n".into()), Event::Close],
            replies: VecDeque::new(),
        }
    }

    /// A shell that never prints anything.
    pub(crate) fn silent() -> Self {
        Self::default()
    }

    /// Reply to the next write with `output`.
    pub(crate) fn then_output(mut self, output: &str) -> Self {
        self.replies.push_back(vec![Event::Output(output.into())]);
        self
    }

    /// Reply to the next write by closing the stream.
    pub(crate) fn then_close(mut self) -> Self {
        self.replies.push_back(vec![Event::Close]);
        self
    }

    /// Reply to the next write with `output`, then close the stream.
    pub(crate) fn then_output_and_close(mut self, output: &str) -> Self {
        self.replies
            .push_back(vec![Event::Output(output.into()), Event::Close]);
        self
    }

    /// Ignore the next write.
    pub(crate) fn then_silence(mut self) -> Self {
        self.replies.push_back(Vec::new());
        self
    }
}

/// What the scripted sessions observed.
#[derive(Debug, Default)]
pub(crate) struct ScriptLog {
    pub spawns: Vec<SpawnConfig>,
    pub writes: Vec<(usize, Vec<u8>)>,
    pub terminated: usize,
}

impl ScriptLog {
    /// Writes received by session `generation` (1-based), as strings.
    pub(crate) fn writes_for(&self, generation: usize) -> Vec<String> {
        self.writes
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, w)| String::from_utf8_lossy(w).into_owned())
            .collect()
    }
}

pub(crate) struct ScriptedSpawner {
    scripts: VecDeque<SessionScript>,
    fallback: SessionScript,
    log: Arc<Mutex<ScriptLog>>,
}

impl ScriptedSpawner {
    /// Sessions follow `scripts` in order; later spawns get a plain ready shell.
    pub(crate) fn new(scripts: Vec<SessionScript>) -> (Self, Arc<Mutex<ScriptLog>>) {
        let log = Arc::new(Mutex::new(ScriptLog::default()));
        (
            Self {
                scripts: scripts.into(),
                fallback: SessionScript::ready(),
                log: log.clone(),
            },
            log,
        )
    }
}

impl Spawner for ScriptedSpawner {
    type Transport = ScriptedTransport;

    fn spawn(&mut self, config: &SpawnConfig) -> Result<ScriptedTransport, StartupError> {
        if config.program == "missing-shell" {
            return Err(StartupError::Spawn {
                program: config.program.clone(),
                message: "No such file or directory".into(),
            });
        }

        let script = self
            .scripts
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let prompt = extract_prompt(config);

        let generation = {
            let mut log = self.log.lock().unwrap();
            log.spawns.push(config.clone());
            log.spawns.len()
        };

        let mut transport = ScriptedTransport {
            pending: VecDeque::new(),
            closed: false,
            replies: script.replies,
            prompt,
            generation,
            log: self.log.clone(),
        };
        transport.play(script.greeting);
        Ok(transport)
    }
}

fn extract_prompt(config: &SpawnConfig) -> String {
    let re = Regex::new(r"prompt = '([^']+)'").unwrap();
    config
        .args
        .iter()
        .find_map(|arg| re.captures(arg).map(|c| c[1].to_string()))
        .unwrap_or_default()
}

pub(crate) struct ScriptedTransport {
    pending: VecDeque<Vec<u8>>,
    closed: bool,
    replies: VecDeque<Vec<Event>>,
    prompt: String,
    generation: usize,
    log: Arc<Mutex<ScriptLog>>,
}

impl ScriptedTransport {
    fn play(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::Output(text) => self
                    .pending
                    .push_back(text.replace("{PROMPT}", &self.prompt).into_bytes()),
                Event::Close => self.closed = true,
            }
        }
    }
}

impl Transport for ScriptedTransport {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.closed && self.pending.is_empty() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "session closed"));
        }
        self.log
            .lock()
            .unwrap()
            .writes
            .push((self.generation, data.to_vec()));
        if let Some(reply) = self.replies.pop_front() {
            self.play(reply);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Some(chunk);
        }
        if self.closed {
            return None;
        }
        std::future::pending().await
    }

    fn try_recv(&mut self) -> TryRecv {
        match self.pending.pop_front() {
            Some(chunk) => TryRecv::Data(chunk),
            None if self.closed => TryRecv::Closed,
            None => TryRecv::Empty,
        }
    }

    async fn terminate(&mut self) {
        self.closed = true;
        self.pending.clear();
        self.log.lock().unwrap().terminated += 1;
    }

    fn process_id(&self) -> Option<u32> {
        Some(1000 + self.generation as u32)
    }
}
