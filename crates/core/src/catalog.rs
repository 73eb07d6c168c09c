//! Model catalogue and project records.
//!
//! Returned by `/Tool/List`, `/Tool/Detail` and `/Project/List`. Same
//! conventions as [`crate::types`]: lower-case service keys, missing or
//! `null` values read as empty.

use serde::{Deserialize, Serialize};

use crate::types::{null_as_default, ApiErrorItem};

/// One row of a model search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "slugowner", deserialize_with = "null_as_default")]
    pub slug_owner: String,
    #[serde(rename = "slugproject", deserialize_with = "null_as_default")]
    pub slug_project: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    /// List or comma-separated string, depending on the endpoint version.
    pub categories: serde_json::Value,
    pub tags: serde_json::Value,
    #[serde(rename = "averagepoint", deserialize_with = "null_as_default")]
    pub average_point: String,
    #[serde(rename = "commentcount", deserialize_with = "null_as_default")]
    pub comment_count: String,
}

impl ToolSummary {
    /// `owner/model`, as accepted by `wiro run`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.slug_owner, self.slug_project)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub result: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<ApiErrorItem>,
    #[serde(rename = "tool", deserialize_with = "null_as_default")]
    pub tools: Vec<ToolSummary>,
    pub total: serde_json::Value,
}

/// A selectable value of a parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOption {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    pub value: serde_json::Value,
}

/// One input field of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolParameterItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub placeholder: String,
    #[serde(deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub advanced: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub quick: bool,
    #[serde(rename = "defaultvalue")]
    pub default_value: serde_json::Value,
    pub value: serde_json::Value,
    // Numeric bounds arrive as strings or numbers.
    #[serde(rename = "minvalue")]
    pub min_value: serde_json::Value,
    #[serde(rename = "maxvalue")]
    pub max_value: serde_json::Value,
    #[serde(rename = "incrementby")]
    pub increment_by: serde_json::Value,
    pub rows: serde_json::Value,
    #[serde(rename = "optionsLoad", deserialize_with = "null_as_default")]
    pub options_load: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<ToolOption>,
    #[serde(rename = "maxinputlenght")]
    pub max_input_length: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolParameterGroup {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<ToolParameterItem>,
}

/// Full model definition including its input schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "slugowner", deserialize_with = "null_as_default")]
    pub slug_owner: String,
    #[serde(rename = "slugproject", deserialize_with = "null_as_default")]
    pub slug_project: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<ToolParameterGroup>,
    #[serde(deserialize_with = "null_as_default")]
    pub inspire: Vec<serde_json::Value>,
    #[serde(rename = "dynamicprice")]
    pub dynamic_price: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub readme: String,
}

impl ToolDetail {
    /// Input items, quick ones first, then advanced ones when asked for.
    /// Group order is kept within each half.
    pub fn flatten_items(&self, include_advanced: bool) -> Vec<&ToolParameterItem> {
        let (advanced, quick): (Vec<_>, Vec<_>) = self
            .parameters
            .iter()
            .flat_map(|group| &group.items)
            .partition(|item| item.advanced);
        if include_advanced {
            quick.into_iter().chain(advanced).collect()
        } else {
            quick
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDetailResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub result: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<ApiErrorItem>,
    #[serde(rename = "tool", deserialize_with = "null_as_default")]
    pub tools: Vec<ToolDetail>,
}

/// A project visible to the caller's credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub slug: Option<String>,
    #[serde(rename = "apikey", deserialize_with = "null_as_default")]
    pub api_key: String,
    #[serde(rename = "ipwhitelist", deserialize_with = "null_as_default")]
    pub ip_whitelist: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(rename = "authmethod", deserialize_with = "null_as_default")]
    pub auth_method: String,
    #[serde(rename = "requestCount", deserialize_with = "null_as_default")]
    pub request_count: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub result: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<ApiErrorItem>,
    #[serde(rename = "project", deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}
