// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use bellchoir::{
    config,
    ensemble::Ensemble,
    sink::{self, Sink},
    songs::{self, LoadError},
    util::duration_minutes_seconds,
};
use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A bell choir that performs songs note by note."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Performs a song.
    Play {
        /// The path to the song file. Each line is a note and a length, e.g. "C4 4".
        song_path: String,
        /// The path to the ensemble config.
        #[arg[short, long]]
        config: Option<String>,
        /// Render the performance into the given WAV file instead of ringing in real time.
        #[arg[short, long]]
        wav: Option<String>,
        /// Use a mock sink that produces no output.
        #[arg[short, long]]
        mock: bool,
    },
    /// Verifies a song file and reports every invalid line.
    Verify {
        /// The path to the song file.
        song_path: String,
        /// The path to the ensemble config, used for the measure length.
        #[arg[short, long]]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            song_path,
            config,
            wav,
            mock,
        } => {
            let score = load_score(&song_path)?;
            let ensemble_config = load_config(config)?;

            let sample_rate = ensemble_config.sample_rate()?;
            let wav_sink =
                wav.map(|wav| Arc::new(sink::wav::Sink::new(&PathBuf::from(wav), sample_rate)));
            let output: Arc<dyn Sink> = match (&wav_sink, mock) {
                (Some(wav_sink), _) => wav_sink.clone() as Arc<dyn Sink>,
                (None, true) => Arc::new(sink::mock::Sink::get("mock")),
                (None, false) => Arc::new(sink::timed::Sink::new("bells")),
            };

            let ensemble = Arc::new(Ensemble::from_config(&ensemble_config, &score, output)?);
            print!("{}", ensemble.roster());

            let cancel_handle = ensemble.cancel_handle();
            let mut performance = {
                let ensemble = ensemble.clone();
                tokio::task::spawn_blocking(move || ensemble.perform(score))
            };

            let result = tokio::select! {
                result = &mut performance => result??,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, cancelling the performance.");
                    cancel_handle.cancel();
                    performance.await??
                }
            };

            if let Some(wav_sink) = wav_sink {
                wav_sink.finish()?;
            }
            print!("{}", result);
        }
        Commands::Verify { song_path, config } => {
            let score = load_score(&song_path)?;
            let ensemble_config = load_config(config)?;
            println!(
                "{} is valid ({} notes, {}).",
                song_path,
                score.len(),
                duration_minutes_seconds(score.duration(ensemble_config.measure_length()?))
            );
        }
    }

    Ok(())
}

/// Loads the ensemble config, or the defaults if there is none.
fn load_config(config: Option<String>) -> Result<config::Ensemble, Box<dyn Error>> {
    Ok(match config {
        Some(config) => config::load_ensemble(&PathBuf::from(config))?,
        None => config::Ensemble::default(),
    })
}

/// Loads a song, printing every invalid line if the song can't be loaded.
fn load_score(song_path: &str) -> Result<bellchoir::cue::Score, Box<dyn Error>> {
    match songs::load_score(&PathBuf::from(song_path)) {
        Ok(score) => Ok(score),
        Err(LoadError::Invalid { file, errors }) => {
            eprintln!("Error loading song. The following issues were found:");
            for error in errors.iter() {
                eprintln!("  - {}", error);
            }
            Err(format!("{} is not a valid song", file).into())
        }
        Err(e) => Err(e.into()),
    }
}
