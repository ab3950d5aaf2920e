use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info};

use funcpeek::ai::{GenerativeText, OpenAiClient};
use funcpeek::config::PeekConfig;
use funcpeek::finder::{LspLocationsProvider, ReferenceProvider};
use funcpeek::io::{RealFileSystem, Selection, TextDocument, TextSource, WorkspaceFileSearch};
use funcpeek::language::Language;
use funcpeek::logging::{LogConfig, init_logging};
use funcpeek::lookup::PeekSession;
use funcpeek::symbol::Position;

/// Default history location, relative to the workspace root
const HISTORY_FILE: &str = ".funcpeek/history.json";

/// Look up symbols in TypeScript, JavaScript, Python and Java sources
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Workspace root searched for usages (defaults to current directory)
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// History file (overrides FUNCPEEK_HISTORY_FILE env var)
    #[arg(long, value_name = "FILE", global = true)]
    history_file: Option<PathBuf>,

    /// Log level (overrides RUST_LOG env var)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log file path (overrides FUNCPEEK_LOG_FILE env var)
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Follow symbolic links while searching the workspace
    #[arg(long, global = true)]
    follow_symlinks: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize a symbol, synthesize an example and list its usages
    Peek {
        #[command(flatten)]
        target: Target,

        /// JSON array of LSP locations to use instead of the workspace search
        #[arg(long, value_name = "FILE")]
        references: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the configured AI service to explain a symbol
    Explain {
        #[command(flatten)]
        target: Target,

        /// Print the explanation as it is generated
        #[arg(long)]
        stream: bool,
    },
    /// Show recent lookups
    History {
        /// Number of entries to show (defaults to FUNCPEEK_HISTORY_RECENT)
        #[arg(long)]
        limit: Option<usize>,

        /// Only entries for this symbol name
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Delete all lookup history
    ClearHistory,
    /// Check that the AI endpoint accepts the configured key
    TestConnection,
}

/// Where in which file to look
#[derive(ClapArgs, Debug)]
struct Target {
    /// Source file
    file: PathBuf,

    /// Line of the symbol (1-based)
    #[arg(long)]
    line: u32,

    /// Cursor column (1-based); the identifier under it is looked up
    #[arg(long, conflicts_with = "select")]
    column: Option<u32>,

    /// Selected text, located at or after --line
    #[arg(long)]
    select: Option<String>,

    /// Language id (defaults to the file extension)
    #[arg(long)]
    language: Option<String>,
}

impl Target {
    fn load(&self) -> Result<TextDocument, Box<dyn std::error::Error>> {
        let mut document = TextDocument::load(&self.file, &RealFileSystem)?;
        if let Some(language) = &self.language {
            document = document.with_language(Language::from_id(language));
        }

        let line = self.line.saturating_sub(1);
        let selection = match (&self.select, self.column) {
            (Some(text), _) => select_text(&document, line, text)
                .ok_or_else(|| format!("\"{}\" not found in {}", text, self.file.display()))?,
            (None, Some(column)) => Selection::cursor(Position::new(line, column.saturating_sub(1))),
            (None, None) => select_line(&document, line)
                .ok_or_else(|| format!("Line {} is past the end of {}", self.line, self.file.display()))?,
        };
        Ok(document.with_selection(selection))
    }
}

/// First occurrence of `text` starting at or after `line`, else the first anywhere
fn select_text(document: &TextDocument, line: u32, text: &str) -> Option<Selection> {
    if text.is_empty() {
        return None;
    }
    let offsets: Vec<usize> = document.text().match_indices(text).map(|(i, _)| i).collect();
    let start = offsets
        .iter()
        .copied()
        .find(|&offset| document.position_at(offset).line >= line)
        .or_else(|| offsets.first().copied())?;
    Some(Selection::new(
        document.position_at(start),
        document.position_at(start + text.len()),
    ))
}

/// The whole of `line`, so a definition line is analyzed as written
fn select_line(document: &TextDocument, line: u32) -> Option<Selection> {
    let text = document.line_at(line as usize)?;
    Some(Selection::new(
        Position::new(line, 0),
        Position::new(line, text.chars().count() as u32),
    ))
}

fn workspace_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|e| {
            eprintln!("Failed to get current directory: {e}");
            std::process::exit(1);
        })
    })
}

fn load_config(root: &Path, history_file: Option<PathBuf>) -> PeekConfig {
    let config = match PeekConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let history_file = history_file
        .or_else(|| config.history.file_path.clone())
        .unwrap_or_else(|| root.join(HISTORY_FILE));
    config.with_history_file(history_file)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_config = LogConfig::from_env().with_overrides(args.log_level.clone(), args.log_file.clone());
    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let root = workspace_root(args.root.clone());
    let config = load_config(&root, args.history_file.clone());
    info!(root = %root.display(), "Starting funcpeek");

    let session = PeekSession::new(config.clone());
    let search = WorkspaceFileSearch::new(&root).with_follow_symlinks(args.follow_symlinks);

    match args.command {
        Command::Peek {
            target,
            references,
            json,
        } => {
            let document = target.load()?;
            let provider = match references {
                Some(path) => Some(LspLocationsProvider::load(&path).await?),
                None => None,
            };
            let provider = provider.as_ref().map(|p| p as &dyn ReferenceProvider);

            let report = session.peek(&document, &search, provider).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text(Some(search.root())));
            }
        }
        Command::Explain { target, stream } => {
            let document = target.load()?;
            if stream {
                let mut stdout = std::io::stdout();
                session
                    .explain_streaming(&document, &search, |chunk| {
                        let _ = write!(stdout, "{chunk}");
                        let _ = stdout.flush();
                    })
                    .await?;
                println!();
            } else {
                let explanation = session.explain(&document, &search).await?;
                println!("{}", explanation.text);
            }
        }
        Command::History { limit, name, json } => {
            let entries = match name {
                Some(name) => session.history().for_function(&name).await?,
                None => session.history().recent(limit).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No history");
            } else {
                for entry in entries {
                    println!(
                        "{}  {}  {}:{}\n    {}",
                        entry.timestamp.to_rfc3339(),
                        entry.signature,
                        entry.file_path.display(),
                        entry.line_number,
                        entry.usage.replace('\n', "\n    ")
                    );
                }
            }
        }
        Command::ClearHistory => {
            session.history().clear().await?;
            println!("History cleared");
        }
        Command::TestConnection => {
            let client = OpenAiClient::new(config.ai.clone());
            if !client.is_enabled() {
                error!("AI service is not enabled");
                eprintln!("AI service is not enabled or API key is not configured");
                std::process::exit(1);
            }
            if client.test_connection().await {
                println!("Connection OK ({})", config.ai.endpoint);
            } else {
                eprintln!("Connection to {} failed", config.ai.endpoint);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
