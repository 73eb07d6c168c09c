//! One-shot result delivery shared by the producers.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use wiro_core::types::Task;

/// Hands the final task to the coordinator at most once.
///
/// The sender lives behind a mutex and is taken by the first caller, so
/// two producers detecting the terminal state at the same moment cannot
/// both deliver.
#[derive(Debug)]
pub struct DeliveryGate {
    sender: Mutex<Option<oneshot::Sender<Task>>>,
}

impl DeliveryGate {
    /// Create a gate and the receiver its single delivery arrives on.
    pub fn new() -> (Self, oneshot::Receiver<Task>) {
        let (tx, rx) = oneshot::channel();
        let gate = Self {
            sender: Mutex::new(Some(tx)),
        };
        (gate, rx)
    }

    /// Deliver `task` if nobody has yet. Returns `true` only for the call
    /// that actually handed a task to a live receiver.
    pub fn deliver(&self, task: Task) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        }
    }

    /// Whether a delivery has been attempted.
    pub fn is_spent(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
