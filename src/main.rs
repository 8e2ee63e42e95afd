//! Hexblock: self-play driver for the Dodo and Gopher engines.
//!
//! ## Usage
//!
//! - `hexblock` - Show a demo
//! - `hexblock play dodo --size 4 --red mcts --blue random` - Run matches
//! - `hexblock demo` - Play one short Dodo game and print the board

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use hexblock::arena::play_match;
use hexblock::board::Player;
use hexblock::constants::N_SIMS;
use hexblock::engine::{Engine, EngineConfig, Policy};
use hexblock::mcts::{self, Budget};
use hexblock::playout::strategy_random;
use hexblock::position::{GameKind, GameState};

/// Hexblock: Dodo and Gopher engines on a hex board
#[derive(Parser)]
#[command(name = "hexblock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log search details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play engine-vs-engine matches
    Play {
        /// Game to play: dodo or gopher
        game: GameKind,
        /// Hexagon side length
        #[arg(long, default_value_t = 4)]
        size: i32,
        /// Policy of the Red player
        #[arg(long, default_value = "auto")]
        red: Policy,
        /// Policy of the Blue player
        #[arg(long, default_value = "random")]
        blue: Policy,
        /// Number of games
        #[arg(long, default_value_t = 1)]
        games: usize,
        /// Clock per side, in seconds
        #[arg(long, default_value_t = 60.0)]
        time: f64,
        /// Seed for reproducible games
        #[arg(long)]
        seed: Option<u64>,
        /// MCTS worker threads
        #[arg(long, default_value_t = 1)]
        threads: usize,
        /// Fixed MCTS simulations per move instead of a share of the clock
        #[arg(long)]
        simulations: Option<usize>,
    },
    /// Run a short demo game
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Some(Commands::Play {
            game,
            size,
            red,
            blue,
            games,
            time,
            seed,
            threads,
            simulations,
        }) => {
            let clock = Duration::try_from_secs_f64(time).context("invalid --time")?;
            let base = EngineConfig {
                seed,
                threads,
                simulations,
                ..EngineConfig::default()
            };
            run_matches(game, size, [red, blue], games, clock, &base)
        }
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn run_matches(
    game: GameKind,
    size: i32,
    policies: [Policy; 2],
    games: usize,
    clock: Duration,
    base: &EngineConfig,
) -> Result<()> {
    let config = |policy: Policy, offset: u64| EngineConfig {
        dodo_policy: policy,
        gopher_policy: policy,
        seed: base.seed.map(|s| s.wrapping_add(offset)),
        ..base.clone()
    };
    let mut engines = [
        Engine::new(config(policies[0], 0)),
        Engine::new(config(policies[1], 1)),
    ];

    let mut wins = [0usize; 2];
    let mut unfinished = 0;
    let mut plies = 0;
    let mut think = [Duration::ZERO; 2];
    for i in 0..games {
        let state = GameState::new(game, size, Player::Red)
            .with_context(|| format!("cannot set up {game} on size {size}"))?;
        let outcome = play_match(state, &mut engines, usize::MAX, clock)
            .with_context(|| format!("game {} failed", i + 1))?;
        match outcome.winner {
            Some(w) => wins[w.slot()] += 1,
            None => unfinished += 1,
        }
        plies += outcome.plies;
        think[0] += outcome.average_move_time(Player::Red);
        think[1] += outcome.average_move_time(Player::Blue);
    }

    let n = games.max(1) as u32;
    info!(
        "{game} size {size}, {games} games: Red ({}) {} wins, Blue ({}) {} wins, {} unfinished",
        policies[0], wins[0], policies[1], wins[1], unfinished
    );
    info!(
        "average {:.1} plies per game, {:.1?} per Red move, {:.1?} per Blue move",
        plies as f64 / n as f64,
        think[0] / n,
        think[1] / n
    );
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Hexblock: Dodo and Gopher engines\n");

    let mut state = GameState::new_dodo(4, Player::Red)?;
    println!("=== Dodo, size 4 ===");
    println!("{state}");

    println!("=== MCTS (Red) vs random (Blue) ===");
    let mut rng = fastrand::Rng::with_seed(2024);
    let mut plies = 0;
    while !state.is_terminal() {
        let action = match state.current_player() {
            Player::Red => mcts::best_action(&mut state, Budget::Simulations(N_SIMS), &mut rng)?,
            Player::Blue => strategy_random(&state, &mut rng)?,
        };
        state.apply(action);
        plies += 1;
    }

    println!("{state}");
    if let Some(winner) = state.winner() {
        println!("{winner} wins after {plies} plies");
    }
    Ok(())
}
