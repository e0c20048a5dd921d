mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::CliConfig;
use sorteio_core::{
    CueDispatcher, KeyValueStore, MemoryStore, MutedCueDispatcher, SorteioError, SqliteStore,
};
use sorteio_draw::{DrawDesk, DrawError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sorteio")]
#[command(about = "Sorteio - draw names one at a time, without repetition")]
#[command(version)]
struct Cli {
    /// Data directory for saved names and config.json
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable sound cues (draws finish on a timer)
    #[arg(short, long, global = true)]
    mute: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add names to the pool
    Add {
        /// Names to add
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove a name from the pool
    Remove {
        /// Position as shown by `list` (starting at 1)
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
    /// Show available and drawn names
    List,
    /// Draw one name from the pool
    Draw,
    /// Return every drawn name to the pool
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Play a sound cue
    Play {
        /// Cue name (see `cues`)
        cue: String,
    },
    /// List available sound cues
    Cues,
    /// Show pool and history counts
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    let mut config = CliConfig::load(&data_dir)?;
    config.verbose |= cli.verbose;
    config.mute |= cli.mute;

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "sorteio={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = open_store(&config).await;
    let cues = open_cues(&config);

    let desk = DrawDesk::open(store, cues, config.draw.clone())
        .await
        .context("Failed to start the draw desk")?;

    // Execute command
    let result = match cli.command {
        Commands::Add { names } => commands::handle_add(&desk, names).await,
        Commands::Remove { position } => commands::handle_remove(&desk, position).await,
        Commands::List => commands::handle_list(&desk).await,
        Commands::Draw => commands::handle_draw(&desk).await,
        Commands::Reset { force } => commands::handle_reset(&desk, force).await,
        Commands::Play { cue } => commands::handle_play(&desk, &cue).await,
        Commands::Cues => commands::handle_cues(),
        Commands::Status { json } => commands::handle_status(&desk, json).await,
    };

    if let Err(e) = result {
        match e {
            DrawError::Core(SorteioError::EmptyName) => {
                eprintln!("Error: name cannot be empty");
            }
            DrawError::Core(SorteioError::DuplicateName { name }) => {
                eprintln!("Error: '{}' is already on the list", name);
            }
            DrawError::Core(SorteioError::IndexOutOfRange { index, len }) => {
                eprintln!("Error: no name at position {}", index.saturating_add(1));
                eprintln!("The pool has {} names. Use 'sorteio list' to see them", len);
            }
            DrawError::DrawInProgress => {
                eprintln!("Error: a draw is in progress, try again when it finishes");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Storage problems are not fatal. An offline store makes the registry run
/// in memory for this session.
async fn open_store(config: &CliConfig) -> Arc<dyn KeyValueStore> {
    match SqliteStore::new(&config.db_path()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Storage unavailable, changes will not be saved: {}", e);
            let store = MemoryStore::new();
            store.set_offline(true);
            Arc::new(store)
        }
    }
}

/// Without an output device every cue fails to start and draws finish on the
/// fallback timer.
#[cfg(feature = "audio")]
fn open_cues(config: &CliConfig) -> Arc<dyn CueDispatcher> {
    if config.mute {
        return Arc::new(MutedCueDispatcher);
    }

    match sorteio_core::AudioCueDispatcher::new() {
        Ok(cues) => Arc::new(cues),
        Err(e) => {
            tracing::warn!("Sound disabled: {}", e);
            Arc::new(MutedCueDispatcher)
        }
    }
}

/// Built without sound output: cues keep their timing but are silent.
#[cfg(not(feature = "audio"))]
fn open_cues(config: &CliConfig) -> Arc<dyn CueDispatcher> {
    if config.mute {
        Arc::new(MutedCueDispatcher)
    } else {
        Arc::new(sorteio_core::TimedCueDispatcher::new())
    }
}
