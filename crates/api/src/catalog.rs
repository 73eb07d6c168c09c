//! Model search, model inspection and project listing.

use std::collections::HashSet;

use wiro_core::catalog::{
    Project, ProjectListResponse, ToolDetail, ToolDetailResponse, ToolListResponse, ToolSummary,
};

use crate::client::{check_envelope, WiroApi};
use crate::error::ApiError;

/// Page size used when the caller passes a zero limit.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

impl WiroApi {
    /// Search public models via `/Tool/List`, sorted by `owner/model`.
    ///
    /// A blank `query` lists the newest models.
    pub async fn search_models(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ToolSummary>, ApiError> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };
        let mut body = serde_json::json!({
            "start": "0",
            "limit": limit.to_string(),
            "sort": "id",
            "order": "DESC",
            "summary": true,
        });
        let query = query.trim();
        if !query.is_empty() {
            body["search"] = query.into();
        }

        let resp: ToolListResponse = self.post_json("/Tool/List", &body).await?;
        check_envelope("tool list", resp.result, &resp.errors)?;

        let mut tools = resp.tools;
        tools.sort_by_cached_key(|t| t.slug().to_lowercase());
        tracing::debug!(query, count = tools.len(), "Model search finished");
        Ok(tools)
    }

    /// Load one model's definition and input schema via `/Tool/Detail`.
    pub async fn inspect_model(&self, owner: &str, model: &str) -> Result<ToolDetail, ApiError> {
        let body = serde_json::json!({ "slugowner": owner, "slugproject": model });
        let resp: ToolDetailResponse = self.post_json("/Tool/Detail", &body).await?;
        check_envelope("tool detail", resp.result, &resp.errors)?;

        resp.tools
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("model {owner}/{model} not found")))
    }

    /// List projects visible to the configured credentials via
    /// `/Project/List`.
    ///
    /// `api_key` is empty under account (bearer) auth and the project key
    /// otherwise. Rows are de-duplicated by key and sorted by name.
    pub async fn list_projects(&self, api_key: &str) -> Result<Vec<Project>, ApiError> {
        let body = serde_json::json!({ "uuid": "me", "apikey": api_key });
        let resp: ProjectListResponse = self.post_json("/Project/List", &body).await?;
        check_envelope("project list", resp.result, &resp.errors)?;

        let mut seen = HashSet::new();
        let mut projects: Vec<Project> = resp
            .projects
            .into_iter()
            .filter(|p| seen.insert(p.api_key.clone()))
            .collect();
        if projects.is_empty() {
            return Err(ApiError::NotFound("no projects found for these credentials".into()));
        }
        projects.sort_by_cached_key(|p| p.name.to_lowercase());
        Ok(projects)
    }
}
