//! Session lifecycle broadcast
//!
//! The cart engine reacts to login, logout and forced expiry without
//! the UI layer calling it directly. A small broadcast hub carries
//! those transitions to every subscriber.

use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 16;

/// Session transitions the cart subsystem reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Credentials were accepted and a token is available
    LoggedIn,
    /// The user ended the session deliberately
    LoggedOut,
    /// The backend rejected the token (401)
    Unauthorized,
}

/// Fan-out point for [`SessionSignal`] values.
#[derive(Debug, Clone)]
pub struct SignalHub {
    tx: broadcast::Sender<SessionSignal>,
}

impl SignalHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }

    /// Publish a transition. Lack of subscribers is not an error.
    pub fn emit(&self, signal: SessionSignal) {
        if let Err(err) = self.tx.send(signal) {
            tracing::debug!("no session signal subscribers: {}", err);
        }
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_signal() {
        let hub = SignalHub::new();
        let mut rx = hub.subscribe();

        hub.emit(SessionSignal::Unauthorized);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, SessionSignal::Unauthorized);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let hub = SignalHub::new();
        hub.emit(SessionSignal::LoggedOut);
    }
}
