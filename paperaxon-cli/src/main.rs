//! PaperAxon CLI - Command-line front end for the PaperAxon backend

mod output;

use clap::{Parser, Subcommand};
use paperaxon_client::{PaperClient, Poller};
use paperaxon_core::config::parse_duration;
use paperaxon_core::{
    AxonError, CollectSettings, Config, PaperQuery, PodcastTrigger, TaskKind, TaskOutcome,
    TaskRef,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paperaxon")]
#[command(about = "Manage papers, interpretations and podcasts on a PaperAxon backend", long_about = None)]
struct Cli {
    /// Backend origin (e.g., http://127.0.0.1:18527)
    #[arg(long, global = true, env = "PAPERAXON_URL")]
    base_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true, env = "PAPERAXON_CONFIG")]
    config: Option<PathBuf>,

    /// Delay between task status checks (e.g., 500ms, 2s)
    #[arg(long, global = true)]
    poll_interval: Option<String>,

    /// Give up waiting for a task after this long ("none" to wait forever)
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List papers
    List {
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
        /// Extra query parameter, passed through as-is (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Show paper metadata
    Show { paper_id: String },

    /// Upload a local PDF
    Upload { file: PathBuf },

    /// Import a paper from arXiv by id or URL
    Arxiv { source: String },

    /// Start an interpretation job
    Interpret {
        paper_id: String,
        /// Wait for the job and print the interpretation
        #[arg(long)]
        wait: bool,
    },

    /// Print the interpretation text of a paper
    Interpretation { paper_id: String },

    /// Start a podcast job
    Podcast {
        paper_id: String,
        /// Wait for the job to finish
        #[arg(long)]
        wait: bool,
        /// Save the audio to this file once available
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the podcast stream URL (no request is made)
    PodcastUrl { paper_id: String },

    /// Show the current status of a task
    Task { task_id: String },

    /// Wait for a task to finish
    Wait {
        task_id: String,
        /// Task kind: interpret, podcast or ingest
        #[arg(short, long, default_value = "interpret")]
        kind: TaskKind,
    },

    /// Delete a paper and its derived content
    Delete { paper_id: String },

    /// List papers related to a paper
    Related { paper_id: String },

    /// Show or replace the daily collect settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show the knowledge graph
    Graph,

    /// Show trending papers
    Trending,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Replace the settings, starting from the current record
    Set {
        /// Enable or disable the daily collect run
        #[arg(long)]
        enabled: Option<bool>,
        /// Daily run time, HH:mm
        #[arg(long)]
        time: Option<String>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        if json {
            let error_json = match &e {
                AxonError::Http { status, body } => {
                    serde_json::json!({ "code": e.code(), "status": status, "message": body })
                }
                _ => serde_json::json!({ "code": e.code(), "message": e.to_string() }),
            };
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error_json).unwrap_or_else(|_| error_json.to_string())
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> paperaxon_core::Result<()> {
    let config = load_config(&cli)?;
    let client = PaperClient::from_config(&config)?;
    let poller = Poller::from_config(&config);
    let json = cli.json;

    match cli.command {
        Commands::List {
            limit,
            offset,
            params,
        } => cmd_list(&client, limit, offset, params, json).await,
        Commands::Show { paper_id } => {
            let paper = client.get_paper(&paper_id).await?;
            output::paper(&paper, json)
        }
        Commands::Upload { file } => {
            let submission = client.upload_pdf_file(&file).await?;
            output::submission(&submission, json)
        }
        Commands::Arxiv { source } => {
            let submission = client.create_from_arxiv(&source).await?;
            output::submission(&submission, json)
        }
        Commands::Interpret { paper_id, wait } => {
            cmd_interpret(&client, &poller, &paper_id, wait, json).await
        }
        Commands::Interpretation { paper_id } => {
            let text = client.get_interpretation(&paper_id).await?;
            output::interpretation(&paper_id, &text, json)
        }
        Commands::Podcast {
            paper_id,
            wait,
            output,
        } => cmd_podcast(&client, &poller, &paper_id, wait, output, json).await,
        Commands::PodcastUrl { paper_id } => {
            output::podcast_url(&paper_id, &client.podcast_media_url(&paper_id), json)
        }
        Commands::Task { task_id } => {
            let task = client.get_task(&task_id).await?;
            output::task(&task, json)
        }
        Commands::Wait { task_id, kind } => {
            let task = TaskRef::new(task_id, kind);
            let outcome = wait_for(&client, &poller, &task, json).await?;
            output::outcome(&outcome, json)
        }
        Commands::Delete { paper_id } => {
            client.delete_paper(&paper_id).await?;
            output::deleted(&paper_id, json)
        }
        Commands::Related { paper_id } => {
            let related = client.get_related(&paper_id).await?;
            output::related(&related, json)
        }
        Commands::Settings { action } => cmd_settings(&client, action, json).await,
        Commands::Graph => {
            let graph = client.get_knowledge_graph().await?;
            output::graph(&graph, json)
        }
        Commands::Trending => {
            let items = client.get_trending().await?;
            output::trending(&items, json)
        }
    }
}

/// Config file (if any), then flag/env overrides.
fn load_config(cli: &Cli) -> paperaxon_core::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(url) = &cli.base_url {
        config.service.base_url = url.clone();
    }
    if let Some(interval) = &cli.poll_interval {
        match parse_duration(interval) {
            Some(d) if !d.is_zero() => config.tasks.poll_interval = interval.clone(),
            _ => {
                return Err(AxonError::InvalidArgument(format!(
                    "invalid --poll-interval '{}'",
                    interval
                )))
            }
        }
    }
    if let Some(timeout) = &cli.timeout {
        if timeout.eq_ignore_ascii_case("none") {
            config.tasks.timeout = String::new();
        } else if parse_duration(timeout).is_some() {
            config.tasks.timeout = timeout.clone();
        } else {
            return Err(AxonError::InvalidArgument(format!(
                "invalid --timeout '{}'",
                timeout
            )));
        }
    }
    tracing::debug!(
        base_url = config.base_url(),
        poll_interval = %config.tasks.poll_interval,
        "configuration resolved"
    );
    Ok(config)
}

async fn cmd_list(
    client: &PaperClient,
    limit: Option<u64>,
    offset: Option<u64>,
    params: Vec<(String, String)>,
    json: bool,
) -> paperaxon_core::Result<()> {
    let mut query = PaperQuery::new();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(offset) = offset {
        query = query.offset(offset);
    }
    for (key, value) in params {
        query = query.param(key, value);
    }
    let page = client.list_papers(&query).await?;
    output::papers(&page, json)
}

async fn cmd_interpret(
    client: &PaperClient,
    poller: &Poller,
    paper_id: &str,
    wait: bool,
    json: bool,
) -> paperaxon_core::Result<()> {
    let task = client.trigger_interpret(paper_id).await?;
    if !wait {
        return output::task_ref(&task, json);
    }
    wait_for(client, poller, &task, json).await?;
    let text = client.get_interpretation(paper_id).await?;
    output::interpretation(paper_id, &text, json)
}

async fn cmd_podcast(
    client: &PaperClient,
    poller: &Poller,
    paper_id: &str,
    wait: bool,
    output_path: Option<PathBuf>,
    json: bool,
) -> paperaxon_core::Result<()> {
    use colored::Colorize;

    match client.trigger_podcast(paper_id).await? {
        PodcastTrigger::AlreadyAvailable { message } => {
            if !json {
                eprintln!(
                    "{}: {}",
                    "Podcast".green(),
                    message.as_deref().unwrap_or("already available")
                );
            }
        }
        PodcastTrigger::Started(task) => {
            if !wait && output_path.is_none() {
                return output::task_ref(&task, json);
            }
            let outcome = wait_for(client, poller, &task, json).await?;
            if output_path.is_none() {
                return output::outcome(&outcome, json);
            }
        }
    }

    match output_path {
        Some(path) => {
            let audio = client.download_podcast(paper_id).await?;
            tokio::fs::write(&path, &audio).await?;
            output::saved(&path, audio.len(), json)
        }
        None => output::podcast_url(paper_id, &client.podcast_media_url(paper_id), json),
    }
}

async fn cmd_settings(
    client: &PaperClient,
    action: Option<SettingsAction>,
    json: bool,
) -> paperaxon_core::Result<()> {
    let current = client.get_collect_settings().await?;
    let Some(SettingsAction::Set { enabled, time }) = action else {
        return output::settings(&current, json);
    };

    let mut next: CollectSettings = current;
    if let Some(enabled) = enabled {
        next.auto_collect_enabled = enabled;
    }
    if let Some(time) = time {
        next.collect_time = time;
    }
    next.validate()?;
    let stored = client.update_collect_settings(&next).await?;
    output::settings(&stored, json)
}

/// Poll until the task is terminal. Ctrl-C stops waiting without touching
/// the backend job.
async fn wait_for(
    client: &PaperClient,
    poller: &Poller,
    task: &TaskRef,
    json: bool,
) -> paperaxon_core::Result<TaskOutcome> {
    use colored::Colorize;

    if !json {
        eprintln!(
            "{} for {} task {}...",
            "Waiting".blue(),
            task.kind,
            task.id.cyan()
        );
    }
    tokio::select! {
        outcome = poller.await_task(client, task) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{}", interrupted_message(task, json));
            std::process::exit(130);
        }
    }
}

fn interrupted_message(task: &TaskRef, json: bool) -> String {
    use colored::Colorize;

    if json {
        return serde_json::json!({
            "code": "interrupted",
            "message": "stopped waiting; the task keeps running on the server",
            "task_id": task.id,
            "kind": task.kind,
        })
        .to_string();
    }
    format!(
        "{}: stopped waiting; task {} keeps running on the server",
        "Interrupted".yellow(),
        task.id
    )
}
