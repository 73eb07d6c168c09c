//! State shared by the stream and poll producers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiro_api::TaskDetailSource;
use wiro_core::types::Task;
use wiro_core::watch_event::WatchEvent;

use crate::error::WatchError;
use crate::gate::DeliveryGate;

/// Everything a producer needs: where to query, where to report, and
/// when to stop.
pub(crate) struct ProducerContext<S> {
    pub source: Arc<S>,
    pub token: String,
    pub events: mpsc::Sender<WatchEvent>,
    pub errors: mpsc::Sender<WatchError>,
    pub gate: Arc<DeliveryGate>,
    pub cancel: CancellationToken,
}

impl<S> Clone for ProducerContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            token: self.token.clone(),
            events: self.events.clone(),
            errors: self.errors.clone(),
            gate: Arc::clone(&self.gate),
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: TaskDetailSource> ProducerContext<S> {
    /// Forward an event to the coordinator. Returns `false` once the
    /// watch is over and the producer should stop.
    pub async fn emit(&self, event: WatchEvent) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }

    /// Report an advisory error without blocking. The coordinator shows
    /// it to the observer, so it is only logged at debug here.
    pub fn report(&self, err: WatchError) {
        tracing::debug!(task_token = %self.token, error = %err, "Watch warning");
        if let Err(e) = self.errors.try_send(err) {
            tracing::debug!(error = %e, "Dropping watch warning");
        }
    }

    /// Query the task, giving up early on cancellation (`None`).
    pub async fn fetch(&self) -> Option<Result<Vec<Task>, WatchError>> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = self.source.fetch_task_detail(&self.token) => {
                Some(result.map(|resp| resp.task_list).map_err(WatchError::Query))
            }
        }
    }

    /// Try to hand `task` over as the watch result.
    pub fn deliver(&self, task: Task, producer: &'static str) {
        let task_id = task.id.clone();
        if self.gate.deliver(task) {
            tracing::info!(task_token = %self.token, task_id = %task_id, producer, "Final task delivered");
        } else {
            tracing::debug!(task_token = %self.token, producer, "Final task already delivered");
        }
    }
}
