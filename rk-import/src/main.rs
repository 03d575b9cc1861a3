//! rk-import - batch import and upload client for a ReadKnows server
//!
//! Scans a server-side directory and imports the selected books one at a
//! time, or uploads local book files. Progress and per-item outcomes are
//! printed as they arrive; Ctrl+C stops the run after the current item.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rk_common::config::{self, TomlConfig};
use rk_common::events::EventBus;
use rk_import::commands;
use rk_import::models::ImportOptions;
use rk_import::pipeline::{BatchPipeline, DirectoryImporter, LocalUploader, RunStatus};
use rk_import::services::{LocalScanner, ReadKnowsClient};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Event channel capacity; the renderer drains concurrently
const EVENT_CAPACITY: usize = 256;

/// Largest history window the server is asked for
const HISTORY_FETCH_LIMIT: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "rk-import")]
#[command(about = "Batch import client for a ReadKnows library server")]
#[command(version)]
struct Cli {
    /// ReadKnows server base URL (or READKNOWS_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// API bearer token (or READKNOWS_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Config file (or READKNOWS_CONFIG; default: <config dir>/readknows/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List importable books in a server-side directory
    Scan {
        /// Directory on the server
        dir: String,
        /// Print the raw file list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan a server-side directory and import the books found
    Import {
        /// Directory on the server
        dir: String,
        #[command(flatten)]
        filter: ExtensionFilter,
        #[command(flatten)]
        options: OptionFlags,
    },
    /// Upload local book files or directories
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Confirm you have the right to upload these files
        #[arg(long)]
        accept_disclaimer: bool,
        #[command(flatten)]
        filter: ExtensionFilter,
        #[command(flatten)]
        options: OptionFlags,
    },
    /// Server-side import history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List history entries
    List {
        /// Rows per page (default from config)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Only show entries with this status (success, skipped, failed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete all history entries
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a config file with default values
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Args, Debug, Default)]
struct ExtensionFilter {
    /// Only process these extensions (comma separated, e.g. epub,pdf)
    #[arg(long, value_delimiter = ',')]
    ext: Vec<String>,
}

/// Overrides for the `[import]` defaults in the config file
#[derive(Args, Debug, Default)]
struct OptionFlags {
    #[arg(long)]
    no_convert_txt: bool,
    #[arg(long)]
    no_convert_mobi: bool,
    #[arg(long)]
    no_metadata: bool,
    /// Make imported books visible to every user
    #[arg(long)]
    public: bool,
    #[arg(long)]
    category: Option<String>,
    /// Delete the server-side source file after import
    #[arg(long)]
    delete_source: bool,
}

impl OptionFlags {
    fn apply(&self, config: &TomlConfig) -> ImportOptions {
        let mut options = ImportOptions::from(&config.import);
        if self.no_convert_txt {
            options.auto_convert_txt = false;
        }
        if self.no_convert_mobi {
            options.auto_convert_mobi = false;
        }
        if self.no_metadata {
            options.auto_fetch_metadata = false;
        }
        if self.public {
            options.is_public = true;
        }
        if let Some(category) = &self.category {
            options.category = Some(category.clone());
        }
        if self.delete_source {
            options.delete_source_after_import = true;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = config::load_or_default(cli.config.as_deref())
        .context("Failed to load config file")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let level = &toml_config.logging.level;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rk_import={0},rk_common={0}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "rk-import v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let Cli {
        server,
        token,
        config: config_path,
        command,
    } = cli;
    let connect = || -> Result<Arc<ReadKnowsClient>> {
        let server_url = config::resolve_server_url(server.as_deref(), &toml_config);
        let api_token = config::resolve_api_token(token.as_deref(), &toml_config);
        let client = ReadKnowsClient::new(server_url, api_token, toml_config.timeouts.clone())
            .context("Failed to create HTTP client")?;
        Ok(Arc::new(client))
    };

    match command {
        Command::Scan { dir, json } => {
            let response = connect()?.scan_list(&dir).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                for file in &response.files {
                    println!("{:>10}  {}", file.size, file.path);
                }
                for issue in &response.errors {
                    eprintln!("warning: {}", issue);
                }
                println!("{} file(s)", response.files.len());
            }
            Ok(())
        }
        Command::Import { dir, filter, options } => {
            let client = connect()?;
            let (mut selection, _) = commands::scan_candidates(&client, &dir).await?;
            commands::apply_extension_filter(&mut selection, &filter.ext);
            let options = options.apply(&toml_config);
            let collaborator = DirectoryImporter::new(client);

            let event_bus = EventBus::new(EVENT_CAPACITY);
            let renderer = tokio::spawn(commands::render_events(
                event_bus.subscribe(),
                std::io::stdout(),
            ));
            let cancel = cancel_on_ctrl_c();

            let mut pipeline = BatchPipeline::new(event_bus);
            let status = pipeline
                .run_directory_import(&mut selection, &options, &collaborator, &cancel)
                .await;
            renderer.await??;
            finish(status)
        }
        Command::Upload {
            paths,
            accept_disclaimer,
            filter,
            options,
        } => {
            let client = connect()?;
            let mut selection = commands::local_candidates(&LocalScanner::new(), &paths)?;
            commands::apply_extension_filter(&mut selection, &filter.ext);
            let options = options.apply(&toml_config);
            let collaborator = LocalUploader::new(client);

            let event_bus = EventBus::new(EVENT_CAPACITY);
            let renderer = tokio::spawn(commands::render_events(
                event_bus.subscribe(),
                std::io::stdout(),
            ));
            let cancel = cancel_on_ctrl_c();

            let mut pipeline = BatchPipeline::new(event_bus);
            let status = pipeline
                .run_local_upload(
                    &mut selection,
                    &options,
                    &collaborator,
                    accept_disclaimer,
                    &cancel,
                )
                .await;
            renderer.await??;
            finish(status)
        }
        Command::History { action } => match action {
            HistoryAction::List { limit, page, status } => {
                let page_size = limit.unwrap_or(toml_config.history_page_size);
                let entries = connect()?.import_history(HISTORY_FETCH_LIMIT).await?;
                let (rows, pagination) =
                    commands::list_history(&entries, status.as_deref(), page, page_size);

                for entry in &rows {
                    println!(
                        "{:<20} {:<8} {} {}",
                        entry.created_at,
                        entry.status,
                        entry.file_name,
                        entry.message.as_deref().unwrap_or("")
                    );
                }
                println!("page {}/{}", pagination.page, pagination.total_pages.max(1));
                Ok(())
            }
            HistoryAction::Clear { yes } => {
                if !yes {
                    bail!("Refusing to clear import history without --yes");
                }
                connect()?.clear_import_history().await?;
                println!("Import history cleared");
                Ok(())
            }
        },
        Command::Config { action } => run_config(action, &toml_config, config_path.as_deref()),
    }
}

fn run_config(action: ConfigAction, toml_config: &TomlConfig, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = match explicit {
                Some(path) => path.to_path_buf(),
                None => config::config_file_path()?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::write_toml_config(&TomlConfig::default(), &path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let mut shown = toml_config.clone();
            if shown.api_token.is_some() {
                shown.api_token = Some("<redacted>".to_string());
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

/// Cancellation token tripped by the first Ctrl+C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping after the current item");
            trigger.cancel();
        }
    });
    token
}

fn finish(status: RunStatus) -> Result<()> {
    match status {
        RunStatus::Rejected(reason) => bail!("{}", reason),
        RunStatus::Completed(report) if report.has_failures() => {
            bail!("{} item(s) failed", report.summary.failed)
        }
        RunStatus::Completed(_) => Ok(()),
    }
}
