//! The task status query seam used by the watch engine.

use wiro_core::types::TaskDetailResponse;

use crate::client::WiroApi;
use crate::error::ApiError;

/// Anything that can answer "what is the current state of this task?".
///
/// Both watch producers query through the same source. Tests substitute
/// scripted implementations.
pub trait TaskDetailSource: Send + Sync {
    /// Fetch the task record for a numeric id or a socket access token.
    fn fetch_task_detail(
        &self,
        id_or_token: &str,
    ) -> impl std::future::Future<Output = Result<TaskDetailResponse, ApiError>> + Send;
}

impl TaskDetailSource for WiroApi {
    async fn fetch_task_detail(&self, id_or_token: &str) -> Result<TaskDetailResponse, ApiError> {
        self.task_detail(id_or_token).await
    }
}
