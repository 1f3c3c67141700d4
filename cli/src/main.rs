// SPDX-License-Identifier: MIT OR Apache-2.0

//! Goban CLI - headless driver for the session engine
//!
//! Runs sessions locally without any network or UI layer. Primarily used for
//! integration testing and for poking at time-control configurations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use goban_core::game::Player;
use goban_core::time::{
    update_time_controls, validate_blitz_settings, validate_time_per_move, GameType, TimeSettings,
};
use goban_core::Color;
use goban_session::actor::SeatProviders;
use goban_session::{
    EngineConfig, MemoryStore, RandomProvider, SessionEvent, SessionManager, Strength,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "goban-cli", about = "Headless goban session driver", version)]
struct Cli {
    /// Path to an engine config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a bot-vs-bot demo game and print each snapshot
    Demo {
        /// Board size
        #[arg(long, default_value_t = 9)]
        board_size: u8,
        /// RNG seed for both bots
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Stop after this many plies (0 = play until the game ends)
        #[arg(long, default_value_t = 0)]
        max_plies: usize,
    },
    /// Validate a time-control configuration and print the corrected form
    ValidateTime {
        /// Per-move allotment in seconds (positive values classify as blitz)
        #[arg(long, default_value_t = 0)]
        time_per_move: u32,
        /// Main time in seconds
        #[arg(long, default_value_t = 1800)]
        main_time: u32,
        /// Byo-yomi periods
        #[arg(long, default_value_t = 3)]
        byo_yomi_periods: u32,
        /// Byo-yomi period length in seconds
        #[arg(long, default_value_t = 30)]
        byo_yomi_time: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Demo {
            board_size,
            seed,
            max_plies,
        } => run_demo(config, board_size, seed, max_plies).await,
        Command::ValidateTime {
            time_per_move,
            main_time,
            byo_yomi_periods,
            byo_yomi_time,
        } => {
            let mut settings = TimeSettings {
                game_type: GameType::Even,
                main_time_secs: main_time,
                byo_yomi_enabled: byo_yomi_periods > 0,
                byo_yomi_periods,
                byo_yomi_time_secs: byo_yomi_time,
                time_per_move_secs: time_per_move,
            };
            update_time_controls(&mut settings);

            let blitz_verdict = validate_blitz_settings(&settings);
            let per_move_verdict = validate_time_per_move(&settings);
            println!("normalized: {}", serde_json::to_string_pretty(&settings)?);
            println!("blitz check: {}", serde_json::to_string(&blitz_verdict)?);
            println!("per-move check: {}", serde_json::to_string(&per_move_verdict)?);
            Ok(())
        }
    }
}

async fn run_demo(config: EngineConfig, board_size: u8, seed: u64, max_plies: usize) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let manager = SessionManager::new(store, config);

    let providers = SeatProviders::none()
        .with(
            Color::Black,
            Box::new(RandomProvider::seeded(seed)),
            Strength::default(),
        )
        .with(
            Color::White,
            Box::new(RandomProvider::seeded(seed.wrapping_add(1))),
            Strength::default(),
        );

    let handle = manager
        .create_session(
            board_size,
            [Player::bot(Color::Black), Player::bot(Color::White)],
            TimeSettings::default(),
            providers,
        )
        .await?;
    let mut events = handle.subscribe();
    tracing::info!(session = %handle.id(), "demo session running");
    handle.start().await?;

    loop {
        let event = match tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
        {
            Ok(event) => event,
            Err(_) => break,
        };
        match event {
            Ok(SessionEvent::SnapshotUpdated(snapshot)) => {
                println!(
                    "ply {:>3}  to-move {:?}  stones {}  captures B:{} W:{}",
                    snapshot.history.len(),
                    snapshot.current_player,
                    snapshot.board.len(),
                    snapshot.captures.0,
                    snapshot.captures.1,
                );
                if snapshot.game_over {
                    println!("game over: {}", snapshot.result.as_deref().unwrap_or("unscored"));
                    break;
                }
                if max_plies > 0 && snapshot.history.len() >= max_plies {
                    tracing::info!("ply limit reached, stopping demo");
                    break;
                }
            }
            Ok(SessionEvent::GameEnded { .. }) => break,
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "demo output lagged behind the bots");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }

    let final_snapshot = handle.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    Ok(())
}
