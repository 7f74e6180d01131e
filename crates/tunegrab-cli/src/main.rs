mod bot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tunegrab_media::transcode::Transcoder;

#[derive(Parser)]
#[command(name = "tunegrab", about = "Telegram bot that fetches YouTube and SoundCloud tracks as MP3")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot until interrupted
    Run {
        /// Config file (defaults to ~/.tunegrab/config.json5)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Working directory for downloads (overrides config)
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Maximum number of downloads running at once
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
    /// Print the effective configuration and check the transcoder
    Health {
        /// Config file (defaults to ~/.tunegrab/config.json5)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            temp_dir,
            max_concurrent,
        } => {
            let mut config = tunegrab_config::load_config(config.as_deref())?;
            if let Some(dir) = temp_dir {
                config.downloads.temp_dir = dir;
            }
            if max_concurrent.is_some() {
                config.downloads.max_concurrent_downloads = max_concurrent;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(bot::run_bot(config))?;
        }
        Commands::Health { config } => {
            let config = tunegrab_config::load_config(config.as_deref())?;
            let downloads = &config.downloads;

            println!("tunegrab configuration");
            println!(
                "  telegram token: {}",
                if config.bot_token().is_ok() { "set" } else { "missing" }
            );
            println!("  api base: {}", config.telegram.api_base);
            println!("  temp dir: {}", downloads.temp_dir.display());
            println!("  download cap: {} bytes", downloads.max_download_bytes);
            println!("  upload limit: {} bytes", downloads.upload_limit_bytes);
            match downloads.max_concurrent_downloads {
                Some(n) => println!("  max concurrent downloads: {n}"),
                None => println!("  max concurrent downloads: unbounded"),
            }

            let rt = tokio::runtime::Runtime::new()?;
            let transcoder = Transcoder::new(downloads.transcoder.clone());
            match rt.block_on(transcoder.probe()) {
                Ok(version) => println!("  transcoder: {version}"),
                Err(e) => println!("  transcoder ({}): unavailable, {e}", transcoder.program()),
            }
        }
    }

    Ok(())
}
