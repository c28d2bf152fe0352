use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream a translation job and save the translated SRT file
    Translate {
        /// Job identifier issued by the translation server
        #[arg(short, long)]
        job: String,

        /// Translation server base URL (overrides the configuration)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Output directory for the translated file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show how a subtitle file would be batched for translation
    Groups {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Token budget per batch (overrides the configuration)
        #[arg(short, long)]
        max_tokens: Option<usize>,
    },

    /// Write the default configuration file
    Config {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
