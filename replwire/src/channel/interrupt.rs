//! Cooperative cancellation of an in-flight request.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle that aborts the driver's current request.
///
/// Triggering the handle while no request is running has no effect on the
/// next one; the flag is cleared whenever a request starts.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl InterruptHandle {
    /// Abort the request that is currently waiting for a prompt.
    pub fn interrupt(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving side held by the driver.
#[derive(Debug)]
pub struct InterruptListener {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl InterruptListener {
    /// Create a listener with no interrupt pending.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// A handle that can trigger this listener from another task.
    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            tx: self.tx.clone(),
        }
    }

    /// Forget any interrupt raised before the current request.
    pub fn reset(&mut self) {
        self.tx.send_replace(false);
        self.rx.mark_unchanged();
    }

    /// Whether an interrupt is pending.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once an interrupt is raised.
    pub async fn triggered(&mut self) {
        // The sender lives in `self.tx`, so the channel never closes here.
        let _ = self.rx.wait_for(|raised| *raised).await;
    }
}

impl Default for InterruptListener {
    fn default() -> Self {
        Self::new()
    }
}
