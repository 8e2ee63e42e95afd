//! The engine behind a game client.
//!
//! An [`Engine`] answers the three calls a game loop makes:
//! [`Engine::initialize`] once per game, [`Engine::strategy`] once per turn
//! and [`Engine::on_final_result`] at the end. It owns its configuration, an
//! opening book, the round counter and a random generator; the game state
//! itself belongs to the caller and is passed back in on every turn.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use hexblock::engine::{Engine, EngineConfig, Policy};
//!
//! let config = EngineConfig {
//!     dodo_policy: Policy::FirstLegal,
//!     ..EngineConfig::default()
//! };
//! let mut engine = Engine::new(config);
//! let mut state = engine.initialize("dodo", &[], 1, 4, Duration::from_secs(60)).unwrap();
//! let observed = state.to_cells();
//! let action = engine.strategy(&mut state, &observed, 1, Duration::from_secs(60)).unwrap();
//! assert!(state.is_legal(action));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info, warn};

use crate::alphabeta::AlphaBeta;
use crate::board::Player;
use crate::constants::{NEGASCOUT_DEPTH, SURVIVAL_TIME, TIME_DIVISOR_BASE, TIME_DIVISOR_ROUNDS};
use crate::error::{Error, Result};
use crate::hex::Cell;
use crate::mcts::{self, Budget};
use crate::negascout::NegaScout;
use crate::playout::{strategy_first_legal, strategy_random};
use crate::position::{Action, CellState, GameKind, GameState};

/// How the engine picks its moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    /// MCTS for Dodo, corner opening then alpha-beta for Gopher
    Auto,
    AlphaBeta,
    Mcts,
    NegaScout,
    Random,
    FirstLegal,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "auto" => Ok(Policy::Auto),
            "alphabeta" | "ab" => Ok(Policy::AlphaBeta),
            "mcts" | "uct" => Ok(Policy::Mcts),
            "negascout" | "pvs" => Ok(Policy::NegaScout),
            "random" => Ok(Policy::Random),
            "firstlegal" | "first" => Ok(Policy::FirstLegal),
            _ => Err(format!("unknown policy '{s}'")),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::Auto => "auto",
            Policy::AlphaBeta => "alpha-beta",
            Policy::Mcts => "mcts",
            Policy::NegaScout => "negascout",
            Policy::Random => "random",
            Policy::FirstLegal => "first-legal",
        };
        write!(f, "{name}")
    }
}

/// Per-engine settings.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub dodo_policy: Policy,
    pub gopher_policy: Policy,
    /// Fixed simulations per move for [`Policy::Mcts`]. `None` searches
    /// for the move time instead.
    pub simulations: Option<usize>,
    /// Fixed thinking time per move. `None` spreads the clock over the game.
    pub move_time: Option<Duration>,
    pub early_stop: bool,
    /// Upper bound on the adaptive alpha-beta depth
    pub depth_cap: Option<u32>,
    pub negascout_depth: u32,
    /// MCTS workers; more than one switches to root-parallel search
    pub threads: usize,
    /// Below this much clock, play the first legal move
    pub survival_time: Duration,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dodo_policy: Policy::Auto,
            gopher_policy: Policy::Auto,
            simulations: None,
            move_time: None,
            early_stop: true,
            depth_cap: None,
            negascout_depth: NEGASCOUT_DEPTH,
            threads: 1,
            survival_time: SURVIVAL_TIME,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Same policy for both games.
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            dodo_policy: policy,
            gopher_policy: policy,
            ..Self::default()
        }
    }

    pub fn policy_for(&self, kind: GameKind) -> Policy {
        match kind {
            GameKind::Dodo => self.dodo_policy,
            GameKind::Gopher => self.gopher_policy,
        }
    }
}

/// Known first moves, keyed by position hash.
#[derive(Clone, Debug, Default)]
pub struct OpeningBook {
    entries: HashMap<u64, Action>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, hash: u64) -> Option<Action> {
        self.entries.get(&hash).copied()
    }

    /// Remember `action` for `hash`. An existing entry is kept.
    pub fn record(&mut self, hash: u64, action: Action) {
        self.entries.entry(hash).or_insert(action);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Share of the remaining clock to spend on the move of `round`.
///
/// Early rounds get less than later ones: the divisor starts at
/// `TIME_DIVISOR_BASE + TIME_DIVISOR_ROUNDS` and settles at `TIME_DIVISOR_BASE`.
pub fn move_budget(time_left: Duration, round: usize) -> Duration {
    let divisor = TIME_DIVISOR_BASE + TIME_DIVISOR_ROUNDS.saturating_sub(round) as f64;
    time_left.div_f64(divisor)
}

/// Game-playing engine.
pub struct Engine {
    config: EngineConfig,
    book: OpeningBook,
    round: usize,
    rng: fastrand::Rng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = config.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            config,
            book: OpeningBook::new(),
            round: 0,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn book(&self) -> &OpeningBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut OpeningBook {
        &mut self.book
    }

    /// Moves chosen so far in the current game.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Start a game of `game` as player `player_id`.
    ///
    /// `cells` is the initial board; an empty list means the standard
    /// starting position of a hexagon of side `radius`.
    pub fn initialize(
        &mut self,
        game: &str,
        cells: &[CellState],
        player_id: u8,
        radius: i32,
        total_time: Duration,
    ) -> Result<GameState> {
        let kind: GameKind = game.parse()?;
        let player = Player::from_id(player_id)?;
        let mut state = if cells.is_empty() {
            GameState::new(kind, radius, player)?
        } else {
            GameState::from_cells(kind, radius, cells, player)?
        };
        state.set_time_left(total_time);
        self.round = 0;
        info!(
            "new {kind} game on radius {radius} as {player} ({} policy), {:.0?} on the clock",
            self.config.policy_for(kind),
            total_time
        );
        Ok(state)
    }

    /// Choose a move for `player_id` in the position `observed`.
    ///
    /// `state` is first re-synchronized with `observed`, then searched in
    /// place; it is left at the observed position.
    pub fn strategy(
        &mut self,
        state: &mut GameState,
        observed: &[CellState],
        player_id: u8,
        time_left: Duration,
    ) -> Result<Action> {
        let player = Player::from_id(player_id)?;
        state.sync(observed, player, time_left)?;
        self.round += 1;

        let moves = state.legal_moves();
        let Some(&first) = moves.first() else {
            return Err(Error::NoLegalMoves);
        };
        if moves.len() == 1 {
            return Ok(first);
        }

        let hash = state.hash();
        if let Some(action) = self.book.lookup(hash) {
            if state.is_legal(action) {
                debug!("round {}: book move {action}", self.round);
                return Ok(action);
            }
            warn!("opening book move {action} is not legal here, ignoring it");
        }

        let action = self.choose(state, time_left)?;
        if self.round == 1 {
            self.book.record(hash, action);
        }
        debug!("round {}: {player} plays {action}", self.round);
        Ok(action)
    }

    /// End-of-game notification.
    pub fn on_final_result(&mut self, state: &GameState, score: i32, player_id: u8) {
        let outcome = match score {
            s if s > 0 => "won",
            s if s < 0 => "lost",
            _ => "drew",
        };
        info!(
            "{} game over after {} rounds: player {player_id} {outcome} (score {score})",
            state.kind(),
            self.round
        );
        self.round = 0;
    }

    fn choose(&mut self, state: &mut GameState, time_left: Duration) -> Result<Action> {
        let budget = self
            .config
            .move_time
            .unwrap_or_else(|| move_budget(time_left, self.round));

        let policy = self.config.policy_for(state.kind());
        let searching = !matches!(policy, Policy::Random | Policy::FirstLegal);
        if searching && time_left < self.config.survival_time {
            warn!("{time_left:.1?} left on the clock, playing the first legal move");
            return strategy_first_legal(state);
        }

        match policy {
            Policy::Auto => self.auto(state, budget),
            Policy::AlphaBeta => self.alpha_beta(state, budget),
            Policy::Mcts => {
                let budget = match self.config.simulations {
                    Some(n) => Budget::Simulations(n),
                    None => Budget::Time {
                        limit: budget,
                        early_stop: self.config.early_stop,
                    },
                };
                self.mcts(state, budget)
            }
            Policy::NegaScout => NegaScout::new(self.config.negascout_depth).best_action(state),
            Policy::Random => strategy_random(state, &mut self.rng),
            Policy::FirstLegal => strategy_first_legal(state),
        }
    }

    fn auto(&mut self, state: &mut GameState, budget: Duration) -> Result<Action> {
        match state.kind() {
            GameKind::Dodo => self.mcts(
                state,
                Budget::Time {
                    limit: budget,
                    early_stop: self.config.early_stop,
                },
            ),
            GameKind::Gopher => {
                if state.stones() == 0 {
                    let corner = Action::Place(Cell::new(0, state.radius() - 1));
                    if state.is_legal(corner) {
                        return Ok(corner);
                    }
                }
                self.alpha_beta(state, budget)
            }
        }
    }

    fn alpha_beta(&mut self, state: &mut GameState, budget: Duration) -> Result<Action> {
        let mut search = AlphaBeta::new().with_time_budget(budget);
        if let Some(cap) = self.config.depth_cap {
            search = search.with_depth_cap(cap);
        }
        search.best_action(state, &mut self.rng)
    }

    fn mcts(&mut self, state: &mut GameState, budget: Budget) -> Result<Action> {
        if self.config.threads > 1 {
            let seed = self.rng.u64(..);
            mcts::search_parallel(state, self.config.threads, budget, seed)
        } else {
            mcts::best_action(state, budget, &mut self.rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(policy: Policy) -> Engine {
        Engine::new(EngineConfig {
            seed: Some(1),
            ..EngineConfig::with_policy(policy)
        })
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("alpha-beta".parse::<Policy>().unwrap(), Policy::AlphaBeta);
        assert_eq!("MCTS".parse::<Policy>().unwrap(), Policy::Mcts);
        assert_eq!("first_legal".parse::<Policy>().unwrap(), Policy::FirstLegal);
        assert!("minimax".parse::<Policy>().is_err());
        for p in [Policy::Auto, Policy::NegaScout, Policy::Random] {
            assert_eq!(p.to_string().parse::<Policy>().unwrap(), p);
        }
    }

    #[test]
    fn test_move_budget() {
        let clock = Duration::from_secs(90);
        assert_eq!(move_budget(clock, 0), Duration::from_secs(1));
        assert_eq!(move_budget(clock, 60), Duration::from_secs(3));
        assert_eq!(move_budget(clock, 500), Duration::from_secs(3));
        assert!(move_budget(clock, 10) < move_budget(clock, 20));
    }

    #[test]
    fn test_initialize_rejects_bad_input() {
        let mut e = Engine::default();
        let clock = Duration::from_secs(1);
        assert!(matches!(
            e.initialize("chess", &[], 1, 4, clock),
            Err(Error::UnknownGame(_))
        ));
        assert_eq!(
            e.initialize("dodo", &[], 3, 4, clock).unwrap_err(),
            Error::InvalidPlayer(3)
        );
        assert_eq!(
            e.initialize("gopher", &[], 1, 0, clock).unwrap_err(),
            Error::InvalidRadius(0)
        );
    }

    #[test]
    fn test_gopher_opens_in_the_corner() {
        let mut e = Engine::default();
        let clock = Duration::from_secs(300);
        let mut state = e.initialize("gopher", &[], 1, 4, clock).unwrap();
        let observed = state.to_cells();
        let action = e.strategy(&mut state, &observed, 1, clock).unwrap();
        assert_eq!(action, Action::Place(Cell::new(0, 3)));
    }

    #[test]
    fn test_survival_mode_plays_first_legal() {
        let mut e = engine(Policy::Auto);
        let clock = Duration::from_secs(1);
        let mut state = e.initialize("dodo", &[], 1, 4, clock).unwrap();
        let observed = state.to_cells();
        let action = e.strategy(&mut state, &observed, 1, clock).unwrap();
        assert_eq!(action, state.legal_moves()[0]);
    }

    #[test]
    fn test_searching_policies_follow_the_clock() {
        // with a short clock, an uncapped alpha-beta stops on its move budget
        let mut e = engine(Policy::AlphaBeta);
        let clock = Duration::from_secs(6);
        let mut state = e.initialize("gopher", &[], 2, 5, clock).unwrap();
        state.apply(Action::Place(Cell::new(0, 0)));
        let observed = state.to_cells();
        let start = std::time::Instant::now();
        let action = e.strategy(&mut state, &observed, 2, clock).unwrap();
        assert!(state.is_legal(action));
        assert!(start.elapsed() < Duration::from_secs(2));

        // below the survival threshold every searching policy plays the first move
        for policy in [Policy::AlphaBeta, Policy::Mcts, Policy::NegaScout] {
            let mut e = engine(policy);
            let clock = Duration::from_secs(1);
            let mut state = e.initialize("dodo", &[], 1, 4, clock).unwrap();
            let observed = state.to_cells();
            let action = e.strategy(&mut state, &observed, 1, clock).unwrap();
            assert_eq!(action, state.legal_moves()[0], "{policy}");
        }
    }

    #[test]
    fn test_book_records_first_move_and_is_consulted() {
        let mut e = engine(Policy::Random);
        let clock = Duration::from_secs(60);
        let mut state = e.initialize("dodo", &[], 1, 3, clock).unwrap();
        let observed = state.to_cells();
        let first = e.strategy(&mut state, &observed, 1, clock).unwrap();
        assert_eq!(e.book().len(), 1);
        assert_eq!(e.book().lookup(state.hash()), Some(first));

        // a fresh game from the same position replays the book move
        for _ in 0..5 {
            let mut again = e.initialize("dodo", &[], 1, 3, clock).unwrap();
            let replay = e.strategy(&mut again, &observed, 1, clock).unwrap();
            assert_eq!(replay, first);
        }
    }

    #[test]
    fn test_stale_book_entry_is_ignored() {
        let mut e = engine(Policy::FirstLegal);
        let clock = Duration::from_secs(60);
        let mut state = e.initialize("dodo", &[], 1, 3, clock).unwrap();
        let observed = state.to_cells();
        state.sync(&observed, Player::Red, clock).unwrap();
        let bogus = Action::Move(Cell::new(2, 2), Cell::new(2, 3));
        e.book_mut().record(state.hash(), bogus);

        let action = e.strategy(&mut state, &observed, 1, clock).unwrap();
        assert_ne!(action, bogus);
        assert!(state.is_legal(action));
    }

    #[test]
    fn test_every_policy_returns_a_legal_move() {
        let clock = Duration::from_secs(60);
        for policy in [
            Policy::AlphaBeta,
            Policy::Mcts,
            Policy::NegaScout,
            Policy::Random,
            Policy::FirstLegal,
        ] {
            for game in ["dodo", "gopher"] {
                let mut e = Engine::new(EngineConfig {
                    seed: Some(3),
                    simulations: Some(200),
                    depth_cap: Some(3),
                    negascout_depth: 2,
                    ..EngineConfig::with_policy(policy)
                });
                let mut state = e.initialize(game, &[], 2, 3, clock).unwrap();
                // play one Red move so Blue has a real position to answer
                let red = state.legal_moves()[0];
                state.apply(red);
                let observed = state.to_cells();
                let before = state.clone();
                let action = e.strategy(&mut state, &observed, 2, clock).unwrap();
                assert!(state.is_legal(action), "{policy} on {game} played {action}");
                assert_eq!(state.to_cells(), before.to_cells());
            }
        }
    }
}
