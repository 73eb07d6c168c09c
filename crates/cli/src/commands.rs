use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use wiro_api::auth::{AuthMode, Credentials};
use wiro_api::{ApiError, RunInput, WiroApi};
use wiro_core::inputs::{parse_key_value, parse_model_arg};
use wiro_core::types::Task;
use wiro_watch::{watch_task, WatchError};

use crate::args::{
    Cli, Commands, ModelCommand, OutputArgs, ProjectCommand, RunArgs, TaskCommand, WatchArgs,
};
use crate::config::CliConfig;
use crate::output;

pub async fn run(cli: Cli, config: &CliConfig, cancel: &CancellationToken) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_task(args, config, cancel).await,
        Commands::Watch(args) => watch(args, config, cancel).await,
        Commands::Task { command } => task(command, config, cancel).await,
        Commands::Model { command } => model(command, config, cancel).await,
        Commands::Project { command } => project(command, config, cancel).await,
    }
}

async fn run_task(args: RunArgs, config: &CliConfig, cancel: &CancellationToken) -> Result<()> {
    let (owner, model) = parse_model_arg(&args.model)?;
    let inputs = collect_inputs(&args.set, &args.set_file, &args.set_url)?;
    let prompt = prompt_from_inputs(&inputs);
    let (mode, api) = api_client(config)?;
    let json = args.output.json;

    if !json {
        println!("Model: {owner}/{model}");
        println!("Inputs: {} fields", inputs.len());
        println!("Auth: {}", mode.as_str());
    }

    let resp = until_cancelled(cancel, api.run(&owner, &model, &inputs)).await?;
    if json {
        output::print_json(&resp)?;
    } else {
        println!(
            "Task started: taskid={} token={}",
            resp.task_id, resp.socket_access_token
        );
    }

    if args.no_watch {
        return Ok(());
    }
    if resp.socket_access_token.trim().is_empty() {
        bail!("run response carried no socket access token; cannot watch task {}", resp.task_id);
    }

    let api = Arc::new(api);
    let task = watch_with_deadline(&api, &resp.socket_access_token, config, cancel, json).await?;
    finish(&api, &task, &args.output, config, &prompt).await
}

async fn watch(args: WatchArgs, config: &CliConfig, cancel: &CancellationToken) -> Result<()> {
    let (_, api) = api_client(config)?;
    let api = Arc::new(api);
    let task = watch_with_deadline(&api, &args.token, config, cancel, args.output.json).await?;
    finish(&api, &task, &args.output, config, &args.prompt).await
}

async fn task(command: TaskCommand, config: &CliConfig, cancel: &CancellationToken) -> Result<()> {
    let (_, api) = api_client(config)?;

    let (resp, json, action) = match command {
        TaskCommand::Detail { target, json } => {
            let resp = until_cancelled(cancel, api.task_detail(&target)).await?;
            (resp, json, None)
        }
        TaskCommand::Cancel { task_id, json } => {
            let resp = until_cancelled(cancel, api.cancel(&task_id)).await?;
            (resp, json, Some("cancel"))
        }
        TaskCommand::Kill { task_id, json } => {
            let resp = until_cancelled(cancel, api.kill(&task_id)).await?;
            (resp, json, Some("kill"))
        }
    };

    if json {
        return output::print_json(&resp);
    }
    match (resp.first_task(), action) {
        (Some(task), _) => output::print_task(task),
        (None, Some(action)) => println!("Task {action} request sent."),
        (None, None) => bail!("task not found"),
    }
    Ok(())
}

async fn model(
    command: ModelCommand,
    config: &CliConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let (_, api) = api_client(config)?;

    match command {
        ModelCommand::Search { query, limit, json } => {
            let query = query.unwrap_or_default();
            let tools = until_cancelled(cancel, api.search_models(&query, limit)).await?;
            if json {
                return output::print_json(&tools);
            }
            output::print_tools(&tools);
        }
        ModelCommand::Inspect { model, json } => {
            let (owner, slug) = parse_model_arg(&model)?;
            let tool = until_cancelled(cancel, api.inspect_model(&owner, &slug)).await?;
            if json {
                return output::print_json(&tool);
            }
            output::print_tool_detail(&tool);
        }
    }
    Ok(())
}

async fn project(
    command: ProjectCommand,
    config: &CliConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let ProjectCommand::List { json } = command;

    let (mode, headers, api_key) = Credentials::from_env().project_list_auth()?;
    tracing::debug!(auth = mode.as_str(), "Listing projects");
    let api = WiroApi::new(&config.api_url, config.http_timeout)?.with_headers(headers);

    let projects = until_cancelled(cancel, api.list_projects(&api_key)).await?;
    if json {
        return output::print_json(&projects);
    }
    output::print_projects(&projects);
    Ok(())
}

/// Watch until delivery, Ctrl-C, or the configured deadline.
async fn watch_with_deadline(
    api: &Arc<WiroApi>,
    token: &str,
    config: &CliConfig,
    cancel: &CancellationToken,
    json: bool,
) -> Result<Task> {
    if !json {
        println!("Watching task... (WebSocket + polling fallback)");
    }

    let watch_cancel = cancel.child_token();
    let watch_config = config.watch_config();
    let watcher = watch_task(Arc::clone(api), token, &watch_config, &watch_cancel, |event| {
        if !json {
            output::print_watch_event(&event);
        }
    });
    tokio::pin!(watcher);

    tokio::select! {
        result = &mut watcher => Ok(result?),
        _ = tokio::time::sleep(config.watch_timeout) => {
            watch_cancel.cancel();
            match watcher.await {
                // Delivered in the same instant the deadline fired.
                Ok(task) => Ok(task),
                Err(WatchError::Cancelled) => {
                    bail!("watch timed out after {}s", config.watch_timeout.as_secs())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Print the final task and save its outputs.
async fn finish(
    api: &WiroApi,
    task: &Task,
    opts: &OutputArgs,
    config: &CliConfig,
    prompt: &str,
) -> Result<()> {
    if opts.json {
        output::print_json(task)?;
    } else {
        output::print_task(task);
    }

    if opts.no_download {
        return Ok(());
    }
    let dir = opts.output_dir.as_deref().unwrap_or(config.output_dir.as_path());
    let paths = download(api, task, dir, prompt).await?;
    if !opts.json {
        output::print_downloads(&paths);
    }
    Ok(())
}

async fn download(
    api: &WiroApi,
    task: &Task,
    dir: &Path,
    prompt: &str,
) -> Result<Vec<PathBuf>> {
    api.download_outputs(task, dir, prompt)
        .await
        .with_context(|| format!("downloading outputs of task {}", task.id))
}

/// Build the API client with auth headers from the environment.
fn api_client(config: &CliConfig) -> Result<(AuthMode, WiroApi)> {
    let (mode, headers) = Credentials::from_env().headers()?;
    tracing::debug!(auth = mode.as_str(), api_url = %config.api_url, "API client ready");
    let api = WiroApi::new(&config.api_url, config.http_timeout)?.with_headers(headers);
    Ok((mode, api))
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T> {
    tokio::select! {
        _ = cancel.cancelled() => Err(anyhow::anyhow!("request cancelled")),
        result = request => Ok(result?),
    }
}

/// `--set` and `--set-url` become text fields, `--set-file` file parts.
fn collect_inputs(
    set: &[String],
    set_file: &[String],
    set_url: &[String],
) -> Result<Vec<(String, RunInput)>> {
    let mut inputs = Vec::with_capacity(set.len() + set_file.len() + set_url.len());
    for pair in set.iter().chain(set_url) {
        let (key, value) = parse_key_value(pair)?;
        inputs.push((key, RunInput::Text(value)));
    }
    for pair in set_file {
        let (key, path) = parse_key_value(pair)?;
        inputs.push((key, RunInput::File(path.into())));
    }
    Ok(inputs)
}

/// The `prompt` text input, used to name downloaded files.
fn prompt_from_inputs(inputs: &[(String, RunInput)]) -> String {
    inputs
        .iter()
        .find_map(|(key, input)| match input {
            RunInput::Text(value) if key.trim().eq_ignore_ascii_case("prompt") => {
                Some(value.trim().to_string())
            }
            _ => None,
        })
        .unwrap_or_default()
}
