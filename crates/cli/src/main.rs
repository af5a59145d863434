use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use dqbot_core::{
    DEFAULT_HISTORY_TABLE, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_PARALLEL_TESTS, DEFAULT_MODEL,
    DEFAULT_TARGET_DB, DEFAULT_TEMPERATURE, DEFAULT_TESTS_DIR, env_parse_with_default,
};
use dqbot_llm::LlmClient;
use dqbot_llm::prompts::system_prompt;
use dqbot_service::{ConversationGateway, RunPipeline};
use dqbot_storage::{AssertionStore, Database};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dqbot")]
#[command(about = "Chat-driven SQL data quality tests with scheduled runs and pass-rate history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat; type 'save test' to store the agreed SQL test
    Chat,
    /// Serve the JSON API
    Serve {
        #[arg(short, long, default_value = "5000")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Also run every stored test at this interval
        #[arg(long)]
        schedule_secs: Option<u64>,
    },
    /// Run every stored test once and append the results to history
    Run {
        /// Keep running at this interval until interrupted
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pass rates per test and run
    Report {
        /// Only these tests (comma separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Newest runs first
        #[arg(long)]
        desc: bool,
    },
    /// Stored tests
    List,
    /// Check that a file (or stdin) holds exactly one well-formed SQL statement
    Validate { file: Option<PathBuf> },
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn get_api_key() -> Result<String> {
    env_non_empty("DQBOT_API_KEY")
        .or_else(|| env_non_empty("OPENAI_API_KEY"))
        .ok_or_else(|| anyhow::anyhow!("DQBOT_API_KEY or OPENAI_API_KEY environment variable must be set"))
}

fn get_base_url() -> String {
    env_non_empty("DQBOT_API_URL").unwrap_or_else(|| "https://api.openai.com".to_owned())
}

fn get_tests_dir() -> PathBuf {
    env_non_empty("DQBOT_TESTS_DIR")
        .or_else(|| env_non_empty("TEST_FOLDER_PATH"))
        .map_or_else(|| PathBuf::from(DEFAULT_TESTS_DIR), PathBuf::from)
}

fn get_target_db() -> PathBuf {
    env_non_empty("DQBOT_TARGET_DB").map_or_else(|| PathBuf::from(DEFAULT_TARGET_DB), PathBuf::from)
}

/// Reads a prompt context file; a missing or unreadable file yields empty text.
fn read_context_file(var: &str, default: &str) -> String {
    let path = env_non_empty(var).unwrap_or_else(|| default.to_owned());
    match std::fs::read_to_string(Path::new(&path)) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(%path, error = %e, "context file not loaded, continuing without it");
            String::new()
        },
    }
}

fn session_prompt() -> String {
    system_prompt(
        &read_context_file("DQBOT_DB_DESCRIPTION", "db_description.txt"),
        &read_context_file("DQBOT_GUIDELINES", "chatbot_guidelines.txt"),
    )
}

fn assertion_store() -> AssertionStore {
    AssertionStore::new(get_tests_dir())
}

fn open_database() -> Result<Arc<Database>> {
    let path = get_target_db();
    let table = env_non_empty("DQBOT_HISTORY_TABLE").unwrap_or_else(|| DEFAULT_HISTORY_TABLE.to_owned());
    let db = Database::open_with_history_table(&path, &table)
        .with_context(|| format!("opening target database {}", path.display()))?;
    Ok(Arc::new(db))
}

fn build_pipeline(store: AssertionStore, db: Arc<Database>) -> Arc<RunPipeline> {
    let max_parallel = env_parse_with_default("DQBOT_MAX_PARALLEL_TESTS", DEFAULT_MAX_PARALLEL_TESTS);
    Arc::new(RunPipeline::for_database(store, db, max_parallel))
}

fn build_gateway(store: AssertionStore, pipeline: Arc<RunPipeline>) -> Result<ConversationGateway> {
    let model = env_non_empty("DQBOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned());
    let temperature = env_parse_with_default("DQBOT_TEMPERATURE", DEFAULT_TEMPERATURE);
    let timeout = env_parse_with_default("DQBOT_LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS);

    let client = LlmClient::new(get_api_key()?, get_base_url())?.with_model(model).with_temperature(temperature);
    let params = client.default_params();
    tracing::info!(model = %params.model, base_url = client.base_url(), "text generation configured");
    Ok(ConversationGateway::new(Arc::new(client), store, pipeline)
        .with_params(params)
        .with_timeout(Duration::from_secs(timeout)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat => commands::chat::run().await,
        Commands::Serve { port, host, schedule_secs } => commands::serve::run(port, host, schedule_secs).await,
        Commands::Run { every, json } => commands::run::run(every, json).await,
        Commands::Report { ids, desc } => commands::report::run_report(ids, desc).await,
        Commands::List => commands::report::run_list(),
        Commands::Validate { file } => commands::validate::run(file.as_deref()),
    }
}
