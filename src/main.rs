use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};

use rayband_assistant::config::{Config, API_URL_ENV};
use rayband_assistant::render::TranscriptRenderer;
use rayband_assistant::{logging, Assistant, AssistantBackend, AssistantEvent, DispatchOutcome, HttpBackend, SkipReason};

#[derive(Parser)]
#[command(name = "rayband")]
#[command(about = "Chat with the RayBand medical assistant")]
struct Cli {
    /// Assistant service URL (overrides config and RAYBAND_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question
    Ask {
        /// Your question
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Request a diagnosis from your synced health data
    Diagnose,
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Store a new assistant service URL
    SetUrl { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Config { action } => run_config(action, &config)?,
        command => {
            let backend = HttpBackend::from_config(&config)?;
            tracing::debug!("Using assistant service at {}", backend.base_url());
            let assistant = Assistant::new(backend);
            attach_terminal(&assistant);

            match command {
                Commands::Ask { question } => {
                    let outcome = assistant.submit_question(&question.join(" ")).await;
                    if outcome == DispatchOutcome::Skipped(SkipReason::EmptyInput) {
                        println!("{}", "Nothing to ask: the question is empty".yellow());
                    }
                }
                Commands::Diagnose => {
                    assistant.request_diagnosis().await;
                }
                _ => chat(&assistant).await?,
            }
        }
    }

    Ok(())
}

/// Print the transcript as it changes.
fn attach_terminal<B: AssistantBackend>(assistant: &Assistant<B>) {
    let renderer = Arc::new(Mutex::new(TranscriptRenderer::new()));

    if let Ok(mut renderer) = renderer.lock() {
        print!("{}", renderer.update(&assistant.messages()));
    }

    assistant.subscribe(move |event| {
        if let AssistantEvent::Changed(snapshot) = event {
            if let Ok(mut renderer) = renderer.lock() {
                print!("{}", renderer.update(snapshot));
                let _ = std::io::stdout().flush();
            }
        }
    });
}

async fn chat<B: AssistantBackend>(assistant: &Assistant<B>) -> Result<()> {
    println!(
        "{}",
        "Type a question, /diagnose for a diagnosis, /quit to leave.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bold().red());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/diagnose" => {
                assistant.request_diagnosis().await;
            }
            _ => {
                assistant.submit_question(&line).await;
            }
        }
    }

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", "⚙️  RayBand configuration".bold().blue());
            println!("  file:    {}", Config::get_config_path()?.display().to_string().dimmed());
            println!("  api_url: {}", config.api_url.green());
            match config.request_timeout_secs {
                Some(secs) => println!("  timeout: {}s", secs),
                None => println!("  timeout: {}", "none".dimmed()),
            }
            if std::env::var(API_URL_ENV).is_ok() {
                println!("  ({} is set and overrides the stored URL)", API_URL_ENV);
            }
        }
        ConfigAction::SetUrl { url } => {
            let path = Config::save_api_url(&url)?;
            println!("Saved {} to {}", url.green(), path.display());
        }
    }
    Ok(())
}
