//! PTY transport implementation using portable-pty.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::config::SpawnConfig;
use super::signal::DefaultInterruptGuard;
use super::{Spawner, Transport, TryRecv};
use crate::error::StartupError;

const REAP_ATTEMPTS: usize = 20;
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns the shell on a fresh pseudo-terminal of the host system.
#[derive(Debug, Default, Clone, Copy)]
pub struct PtySpawner;

impl PtySpawner {
    /// Create a new spawner.
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for PtySpawner {
    type Transport = PtyTransport;

    fn spawn(&mut self, config: &SpawnConfig) -> Result<PtyTransport, StartupError> {
        PtyTransport::spawn(config)
    }
}

/// A shell process attached to a pseudo-terminal.
///
/// A dedicated thread performs the blocking reads on the PTY master and
/// forwards each chunk over a channel, so waiting for output composes with
/// tokio timeouts and cancellation.
pub struct PtyTransport {
    /// Keeps the master side open for the lifetime of the session.
    _master: Box<dyn MasterPty + Send>,

    /// Input side of the terminal.
    writer: Box<dyn Write + Send>,

    /// The spawned shell.
    child: Box<dyn Child + Send + Sync>,

    /// Chunks forwarded by the reader thread; closed on end-of-stream.
    output: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl PtyTransport {
    /// Open a PTY and launch `config.program` on its slave side.
    pub fn spawn(config: &SpawnConfig) -> Result<Self, StartupError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.terminal_height,
                cols: config.terminal_width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| StartupError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        debug!("spawning: {}", config);
        let child = {
            let _sigint = DefaultInterruptGuard::acquire()?;
            pair.slave
                .spawn_command(cmd)
                .map_err(|e| StartupError::Spawn {
                    program: config.program.clone(),
                    message: e.to_string(),
                })?
        };

        // Only the child holds the slave now, so its exit closes the stream.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| StartupError::Pty(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| StartupError::Pty(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("replwire-pty-reader".into())
            .spawn(move || read_loop(reader, tx))
            .map_err(|e| StartupError::Pty(e.to_string()))?;

        Ok(Self {
            _master: pair.master,
            writer,
            child,
            output: rx,
        })
    }

    fn kill(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                if let Err(e) = self.child.kill() {
                    debug!("kill failed (child may have exited): {}", e);
                }
            }
        }
    }
}

/// Blocking read loop run on the reader thread.
fn read_loop(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                trace!("pty reader: EOF");
                break;
            }
            Ok(n) => {
                trace!("pty reader: {} bytes", n);
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                // Linux reports EIO once the slave side is gone.
                trace!("pty reader stopped: {}", e);
                break;
            }
        }
    }
}

impl Transport for PtyTransport {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.output.recv().await
    }

    fn try_recv(&mut self) -> TryRecv {
        match self.output.try_recv() {
            Ok(data) => TryRecv::Data(data),
            Err(TryRecvError::Empty) => TryRecv::Empty,
            Err(TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }

    async fn terminate(&mut self) {
        self.kill();
        self.output.close();
        while self.output.try_recv().is_ok() {}

        // Reap the child so it does not linger as a zombie.
        for _ in 0..REAP_ATTEMPTS {
            if !matches!(self.child.try_wait(), Ok(None)) {
                return;
            }
            tokio::time::sleep(REAP_INTERVAL).await;
        }
        debug!("child {:?} not reaped after kill", self.child.process_id());
    }

    fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("dropping live shell session; killing child");
            self.kill();
        }
    }
}
