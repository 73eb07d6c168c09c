use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wiro")]
#[command(about = "Run and watch Wiro AI tasks from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a task and watch it to completion
    Run(RunArgs),

    /// Watch an already submitted task by its socket token
    Watch(WatchArgs),

    /// Inspect or stop a task
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Search and inspect models
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// List projects visible to the configured credentials
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model in owner/model form
    pub model: String,

    /// Text input (key=value). Repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// File input (key=/path/to/file). Repeatable
    #[arg(long = "set-file", value_name = "KEY=PATH")]
    pub set_file: Vec<String>,

    /// URL input (key=https://...). Repeatable
    #[arg(long = "set-url", value_name = "KEY=URL")]
    pub set_url: Vec<String>,

    /// Submit only, do not watch
    #[arg(long)]
    pub no_watch: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Socket access token returned when the task was submitted
    pub token: String,

    /// Prompt used to name downloaded files
    #[arg(long, default_value = "")]
    pub prompt: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory to save outputs (default: $WIRO_OUTPUT_DIR or ./wiro-outputs)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not download task outputs
    #[arg(long)]
    pub no_download: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Show a task by numeric id or socket token
    Detail {
        target: String,
        #[arg(long)]
        json: bool,
    },

    /// Cancel a queued task
    Cancel {
        task_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Kill a running task
    Kill {
        task_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Search public models (newest first when no query is given)
    Search {
        query: Option<String>,
        /// Maximum number of results
        #[arg(long, default_value_t = 40)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },

    /// Show a model's description and inputs
    Inspect {
        /// Model in owner/model form
        model: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects
    #[command(visible_alias = "ls")]
    List {
        #[arg(long)]
        json: bool,
    },
}
