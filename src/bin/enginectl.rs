//! `enginectl` — the CLI driver around the fingerprinting engine (spec.md
//! §1 lists the CLI/driver harness as an out-of-scope collaborator; this is
//! deliberately thin, wiring `echofp::Engine`'s public API to `clap`
//! subcommands in the teacher's derive style).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echofp::audio::{capture, CaptureConfig};
use echofp::config::Config;
use echofp::Engine;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enginectl")]
#[command(version)]
#[command(about = "Fingerprint and recognize audio against a catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint a single audio file and store it in the catalog.
    Ingest {
        /// Path to an audio file.
        path: PathBuf,

        /// Song name to store; defaults to the file's stem.
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Recursively fingerprint every supported audio file under a directory.
    IngestDir {
        /// Directory to walk.
        path: PathBuf,

        /// Number of worker threads; defaults to the CPU count.
        #[arg(short, long)]
        parallelism: Option<usize>,
    },

    /// Recognize an audio file against the catalog.
    Recognize {
        /// Path to the query clip.
        path: PathBuf,
    },

    /// Record from the default microphone and recognize the capture.
    Listen {
        /// Seconds to record before matching.
        #[arg(short, long, default_value = "10")]
        seconds: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    let mut engine = Engine::new(&config).context("starting engine")?;

    match cli.command {
        Commands::Ingest { path, name } => {
            match engine.fingerprint_file(&path, name.as_deref())? {
                Some(song_id) => println!("fingerprinted {} as song_id={song_id}", path.display()),
                None => println!("{} already indexed, skipped", path.display()),
            }
        }
        Commands::IngestDir { path, parallelism } => {
            let report = engine.fingerprint_directory(&path, None, parallelism)?;
            println!(
                "scanned={} ingested={} skipped={} failed={}",
                report.scanned, report.ingested, report.skipped_already_known, report.failed
            );
        }
        Commands::Recognize { path } => match engine.recognize_file(&path)? {
            Some(m) => println!(
                "{} (song_id={}, confidence={}, offset={:.5}s)",
                m.song_name, m.song_id, m.confidence, m.offset_seconds
            ),
            None => println!("no match"),
        },
        Commands::Listen { seconds } => {
            let config = CaptureConfig {
                duration: Duration::from_secs(seconds),
                ..Default::default()
            };
            let captured = capture(config).context("recording from microphone")?;
            let Some(channel) = captured.channels.first() else {
                println!("no match");
                return Ok(());
            };
            match engine.recognize_samples(channel)? {
                Some(m) => println!(
                    "{} (song_id={}, confidence={}, offset={:.5}s)",
                    m.song_name, m.song_id, m.confidence, m.offset_seconds
                ),
                None => println!("no match"),
            }
        }
    }

    Ok(())
}
