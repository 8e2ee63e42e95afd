//! Hexblock: an engine for the hex board games Dodo and Gopher.
//!
//! Both games are played by two players, Red and Blue, on a hexagon of
//! cells. In Dodo each player moves stones forward and wins by running out
//! of moves. In Gopher players place stones that touch exactly one enemy
//! stone and none of their own, and the first player unable to place loses.
//!
//! Three searches work in place on a single [`position::GameState`],
//! relying on exact `apply`/`undo` pairs instead of copying the board.
//!
//! ## Modules
//!
//! - [`constants`] - Evaluation weights and search parameters
//! - [`hex`] - Axial coordinates, neighbor offsets and board geometry
//! - [`board`] - Players and cell occupancy
//! - [`position`] - Game state with legal moves, apply and undo
//! - [`dodo`] / [`gopher`] - Move generation rules of each game
//! - [`eval`] - Static evaluation used at search cutoffs
//! - [`alphabeta`] - Alpha-beta search with memo and adaptive depth
//! - [`mcts`] - Monte Carlo Tree Search with UCB1
//! - [`negascout`] - Principal variation search
//! - [`playout`] - Random rollouts and trivial strategies
//! - [`engine`] - Policies, time allocation and opening book
//! - [`arena`] - Self-play match loop
//!
//! ## Example
//!
//! ```
//! use hexblock::board::Player;
//! use hexblock::mcts::{self, Budget};
//! use hexblock::position::GameState;
//!
//! // A new Dodo game on a hexagon of side 4
//! let mut state = GameState::new_dodo(4, Player::Red).unwrap();
//!
//! // Run MCTS to pick Red's first move
//! let mut rng = fastrand::Rng::with_seed(7);
//! let best = mcts::best_action(&mut state, Budget::Simulations(200), &mut rng).unwrap();
//! println!("Best move: {best}");
//! state.apply(best);
//! ```

pub mod alphabeta;
pub mod arena;
pub mod board;
pub mod constants;
pub mod dodo;
pub mod engine;
pub mod error;
pub mod eval;
pub mod gopher;
pub mod hex;
pub mod mcts;
pub mod negascout;
pub mod playout;
pub mod position;

pub use error::{Error, Result};
