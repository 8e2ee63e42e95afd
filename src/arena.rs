//! Self-play between two engines.
//!
//! The arena keeps the authoritative [`GameState`] and a chess clock per
//! side. Each engine keeps its own local state and is handed the observed
//! board every turn, the same way a remote arbiter would drive it.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::board::Player;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::position::GameState;

/// Result of one game.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    /// `None` when the ply cap was reached first
    pub winner: Option<Player>,
    /// +1 if Red won, -1 if Blue won, 0 for an unfinished game
    pub score: i32,
    pub plies: usize,
    /// Thinking time used by Red and Blue
    pub think_time: [Duration; 2],
}

impl MatchOutcome {
    /// Mean thinking time per move of `player`.
    pub fn average_move_time(&self, player: Player) -> Duration {
        let moves = match player {
            Player::Red => self.plies.div_ceil(2),
            Player::Blue => self.plies / 2,
        };
        if moves == 0 {
            return Duration::ZERO;
        }
        self.think_time[player.slot()] / moves as u32
    }
}

/// Play `state` to the end with `engines[0]` as Red and `engines[1]` as Blue.
///
/// Each side starts with `clock` and is charged for its own thinking time.
/// The game stops after `max_plies` plies even if unfinished.
pub fn play_match(
    mut state: GameState,
    engines: &mut [Engine; 2],
    max_plies: usize,
    clock: Duration,
) -> Result<MatchOutcome> {
    let kind = state.kind().to_string();
    let radius = state.radius();
    let initial = state.to_cells();

    let mut local = Vec::with_capacity(2);
    for (engine, player) in engines.iter_mut().zip([Player::Red, Player::Blue]) {
        local.push(engine.initialize(&kind, &initial, player.id(), radius, clock)?);
    }

    let mut clocks = [clock; 2];
    let mut think_time = [Duration::ZERO; 2];
    let mut plies = 0;

    while plies < max_plies && !state.is_terminal() {
        let mover = state.current_player();
        let side = mover.slot();
        let observed = state.to_cells();

        let start = Instant::now();
        let action = engines[side].strategy(&mut local[side], &observed, mover.id(), clocks[side])?;
        let spent = start.elapsed();
        clocks[side] = clocks[side].saturating_sub(spent);
        think_time[side] += spent;

        if action.kind() != state.kind() {
            return Err(Error::WrongActionKind);
        }
        if !state.is_legal(action) {
            return Err(Error::IllegalAction(action));
        }
        debug!("ply {}: {mover} {action} ({spent:.0?})", plies + 1);
        state.apply(action);
        plies += 1;
    }

    let winner = state.winner();
    let score = match winner {
        Some(Player::Red) => 1,
        Some(Player::Blue) => -1,
        None => 0,
    };
    for (engine, player) in engines.iter_mut().zip([Player::Red, Player::Blue]) {
        let own = if player == Player::Red { score } else { -score };
        engine.on_final_result(&state, own, player.id());
    }
    info!(
        "{kind} radius {radius}: {} after {plies} plies",
        winner.map_or_else(|| "unfinished".to_string(), |w| format!("{w} wins"))
    );

    Ok(MatchOutcome {
        winner,
        score,
        plies,
        think_time,
    })
}
