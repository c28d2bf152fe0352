//! Subtrans - streaming subtitle translation client
//!
//! Entry point: submits translation jobs, streams their output into an SRT
//! file, and inspects how subtitle files are batched.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use subtrans::batch::group_segments_by_token_length;
use subtrans::cli::{Args, Commands};
use subtrans::client::HttpJobClient;
use subtrans::config::Config;
use subtrans::session::{save_srt, ConsoleProgress, TranslationSession};
use subtrans::subtitle::parse_srt;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate { job, endpoint, output_dir } => {
            if let Some(endpoint) = endpoint {
                config.server.endpoint = endpoint;
            }
            if let Some(output_dir) = output_dir {
                config.output.directory = output_dir;
            }
            config.validate()?;

            let client = HttpJobClient::new(&config.server)?;
            info!("Translating job {} via {}", job, client.endpoint());

            let session = TranslationSession::new(Box::new(client), Box::new(ConsoleProgress::new()));
            let outcome = match session.run(&job).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Error during translation of job {}: {}", job, e);
                    return Err(e.into());
                }
            };

            for (source, translated) in outcome.pairs() {
                debug!("{} => {}", source.unwrap_or("?"), translated);
            }

            let path = save_srt(&outcome, &config.output.directory).await?;
            println!("Saved {} translated segments to {}", outcome.chunks.len(), path.display());
        }
        Commands::Groups { input, max_tokens } => {
            if let Some(max_tokens) = max_tokens {
                config.batch.max_tokens = max_tokens;
            }
            config.validate()?;

            let content = tokio::fs::read_to_string(&input).await?;
            let segments = parse_srt(&content)?;
            let groups = group_segments_by_token_length(&segments, config.batch.max_tokens);

            println!(
                "\n{} segments in {} groups (budget: {} tokens)",
                segments.len(),
                groups.len(),
                config.batch.max_tokens
            );
            println!("{:<8} {:<12} {:<10} {:<10}", "Group", "Segments", "Tokens", "First id");
            println!("{}", "-".repeat(44));

            for (index, group) in groups.iter().enumerate() {
                let first_id = group.segments().first().map(|s| s.id).unwrap_or_default();
                println!(
                    "{:<8} {:<12} {:<10} {:<10}",
                    index + 1,
                    group.len(),
                    group.token_count(),
                    first_id
                );
            }
        }
        Commands::Config { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive the program
    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subtrans.log").display()
    );

    Ok(())
}
