//! Toast bus: transient user-facing notices over a broadcast channel.
//!
//! The bus lives in [`crate::AppCore`], not in any global. Every surface
//! that renders notices subscribes; dropping the receiver unsubscribes.
//! Publishing with no subscriber alive is fine and drops the notice.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// How long a notice should stay on screen. Display hint only; the bus
/// itself never expires anything.
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
        }
    }
}

/// Handle to one notification channel. Cloning shares the bus.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn publish(&self, kind: ToastKind, message: impl Into<String>) {
        // No subscribers is not an error, the notice just goes nowhere.
        let _ = self.tx.send(Toast::new(kind, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(ToastKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(ToastKind::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(ToastKind::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(ToastKind::Warning, message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
