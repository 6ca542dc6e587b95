use shared::types::RoleClass;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// `logout()` was called.
    UserInitiated,
    /// The refresh endpoint refused to mint a new token.
    RefreshFailed,
}

/// Session lifecycle notifications for the application shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { role: RoleClass },
    Refreshed,
    LoggedOut { reason: LogoutReason },
}

/// Broadcast hub for [`SessionEvent`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("No session listeners");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}
