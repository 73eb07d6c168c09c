//! Wire types for the Wiro HTTP API.
//!
//! Field names follow the service's lower-case JSON keys. Every struct
//! tolerates missing fields because the service omits empty values, and
//! scalar or list fields read an explicit `null` as their empty value.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as `T::default()`.
///
/// Use together with `#[serde(default)]` so a missing key and a `null`
/// value behave the same.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the `errors` array in a response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorItem {
    /// Numeric or string code; the service is not consistent.
    pub code: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    pub time: serde_json::Value,
}

/// Response returned by `/Run/{owner}/{model}` after queuing a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub result: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<ApiErrorItem>,
    /// Server-assigned numeric task identifier.
    #[serde(rename = "taskid", deserialize_with = "null_as_default")]
    pub task_id: String,
    /// Token used to subscribe to the task's socket stream.
    #[serde(rename = "socketaccesstoken", deserialize_with = "null_as_default")]
    pub socket_access_token: String,
}

/// A downloadable artifact produced by a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOutput {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "contenttype", deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

/// Snapshot of a remote task record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "socketaccesstoken", deserialize_with = "null_as_default")]
    pub socket_access_token: String,
    #[serde(rename = "debugoutput", deserialize_with = "null_as_default")]
    pub debug_output: String,
    #[serde(rename = "debugerror", deserialize_with = "null_as_default")]
    pub debug_error: String,
    #[serde(rename = "createtime", deserialize_with = "null_as_default")]
    pub create_time: String,
    #[serde(rename = "starttime", deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(rename = "endtime", deserialize_with = "null_as_default")]
    pub end_time: String,
    pub parameters: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub outputs: Vec<TaskOutput>,
}

/// Envelope shared by `/Task/Detail`, `/Task/Cancel` and `/Task/Kill`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDetailResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub result: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<ApiErrorItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: String,
    #[serde(rename = "tasklist", deserialize_with = "null_as_default")]
    pub task_list: Vec<Task>,
}

impl TaskDetailResponse {
    /// The first task row, if the query matched anything.
    pub fn first_task(&self) -> Option<&Task> {
        self.task_list.first()
    }

    /// Consume the envelope and return the first task row.
    pub fn into_first_task(self) -> Option<Task> {
        self.task_list.into_iter().next()
    }
}
