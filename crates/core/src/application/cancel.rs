// Run-scoped Cancellation Token

use tokio::sync::watch;

/// Cancellation signal for a running chain.
///
/// Raising it stops the engine from issuing new statements once the
/// in-flight one completes or errors. Teardown still runs: every open
/// connection is closed.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Cancellation sender, held by the caller that owns the run.
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    /// Request cancellation of the run.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a cancellation channel.
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSender { tx }, CancelToken { rx })
}
