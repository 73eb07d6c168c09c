//! Saving task outputs to disk.
//!
//! Files land in `<dir>/<task id>/<slug>-<n><ext>` where the slug is
//! built from the first two words of the prompt.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::AsyncWriteExt;
use wiro_core::types::{Task, TaskOutput};

use crate::client::WiroApi;
use crate::error::ApiError;

/// Words taken from the prompt when naming files.
const SLUG_WORDS: usize = 2;

/// Slug used when the prompt yields no words.
const FALLBACK_SLUG: &str = "output";

/// Extension used when nothing else identifies the file type.
const FALLBACK_EXT: &str = ".bin";

static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

impl WiroApi {
    /// Download every output of `task` into `dir/<task id>/`.
    ///
    /// Returns the paths written so far. Stops at the first failing
    /// download. Output URLs are fetched without the API auth headers.
    pub async fn download_outputs(
        &self,
        task: &Task,
        dir: &Path,
        prompt: &str,
    ) -> Result<Vec<PathBuf>, ApiError> {
        if task.outputs.is_empty() {
            return Ok(Vec::new());
        }

        let base = dir.join(task_dir_name(&task.id)?);
        tokio::fs::create_dir_all(&base)
            .await
            .map_err(|source| ApiError::Io {
                path: base.clone(),
                source,
            })?;

        let mut paths = Vec::with_capacity(task.outputs.len());
        for (idx, output) in task.outputs.iter().enumerate() {
            let target = base.join(output_filename(output, prompt, idx + 1));
            self.download_file(&output.url, &target).await?;
            tracing::info!(url = %output.url, path = %target.display(), "Output saved");
            paths.push(target);
        }
        Ok(paths)
    }

    async fn download_file(&self, url: &str, target: &Path) -> Result<(), ApiError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: format!("download {url} failed"),
            });
        }

        let io_err = |source| ApiError::Io {
            path: target.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(target).await.map_err(io_err)?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

/// The task id as a single normal path component. Absolute paths,
/// separators, `.` and `..` would escape the output directory.
fn task_dir_name(id: &str) -> Result<&str, ApiError> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == id && !id.contains(['/', '\\']) =>
        {
            Ok(id)
        }
        _ => Err(ApiError::InvalidTaskId(id.to_string())),
    }
}

/// `<slug>-<index><ext>`, index starting at 1.
pub fn output_filename(output: &TaskOutput, prompt: &str, index: usize) -> String {
    let slug = prompt_slug(prompt, SLUG_WORDS);
    let slug = if slug.is_empty() { FALLBACK_SLUG } else { &slug };
    format!("{}-{}{}", slug, index.max(1), output_ext(output))
}

/// Lower-case the first `max_words` alphanumeric words of `prompt`,
/// joined by `-`.
pub fn prompt_slug(prompt: &str, max_words: usize) -> String {
    let max_words = if max_words == 0 { SLUG_WORDS } else { max_words };
    let words: Vec<String> = prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(max_words)
        .map(|w| w.to_lowercase())
        .collect();

    let joined = words.join("-");
    let slug = NON_WORD_RUN.replace_all(&joined, "-");
    slug.trim_matches('-').to_string()
}

/// Extension from the output name, the URL path, or the content type.
pub fn output_ext(output: &TaskOutput) -> String {
    if let Some(ext) = path_ext(output.name.trim()) {
        return ext;
    }
    if let Ok(url) = reqwest::Url::parse(output.url.trim()) {
        if let Some(ext) = path_ext(url.path()) {
            return ext;
        }
    }
    content_type_ext(output.content_type.trim())
        .unwrap_or(FALLBACK_EXT)
        .to_string()
}

fn path_ext(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"))
}

fn content_type_ext(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "audio/mpeg" => ".mp3",
        "audio/wav" | "audio/x-wav" => ".wav",
        "application/json" => ".json",
        "text/plain" => ".txt",
        _ => return None,
    };
    Some(ext)
}
