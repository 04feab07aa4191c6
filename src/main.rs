//! EndyOS - Spanish voice assistant
//!
//! Reads prompts from stdin (or `--prompt`) and speaks the replies.

use anyhow::Result;
use clap::Parser;
use endyos::assistant::{Assistant, SubmitOutcome};
use endyos::config::Config;
use endyos::services::Backends;
use endyos::tts;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print replies instead of speaking them
    #[arg(long)]
    mute: bool,

    /// Answer a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🤖 EndyOS v{} starting...", env!("CARGO_PKG_VERSION"));

    let engine = tts::create_engine(&config, args.mute);
    let assistant = Assistant::new(&config, Backends::http(&config), engine);

    if let Some(prompt) = args.prompt {
        report(assistant.submit(&prompt).await);
        return Ok(());
    }

    let greeting = assistant.greet().await;
    println!("{greeting}");
    info!("✅ EndyOS ready - type a prompt (/status, /reset, /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/salir" => break,
            "/status" => {
                let status = assistant.status();
                println!(
                    "[{}] modelo: {} ({}), disponible: {}, respuestas en caché: {}, procesando: {}",
                    status.timestamp.format("%H:%M:%S"),
                    status.model.name,
                    status.model.provider,
                    status.generator_available,
                    status.cached_messages,
                    status.processing
                );
            }
            "/reset" => {
                assistant.reset();
                println!("Cachés limpiadas.");
            }
            prompt => report(assistant.submit(prompt).await),
        }
    }

    info!("👋 EndyOS shutting down");
    Ok(())
}

fn report(outcome: SubmitOutcome) {
    if let Some(text) = outcome.text() {
        println!("{text}");
    }
}
