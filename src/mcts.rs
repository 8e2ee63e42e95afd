//! Monte Carlo Tree Search with UCB1 selection (UCT).
//!
//! Each simulation runs four steps over the caller's [`GameState`]:
//! - select: descend through fully expanded nodes by UCB1, applying each action
//! - expand: create one child for an untried action (applied, then undone)
//! - rollout: random play to the end of the game from the new child
//! - backpropagate: walk parent links to the root, updating visits and scores
//!
//! Nodes never hold a board. They live in an arena (`Vec<Node>`) and refer to
//! each other by index; the parent index is used for backpropagation only.
//! Every action applied during a simulation is undone before the next one
//! starts, so the state is back at the root position between simulations.

use std::time::{Duration, Instant};

use log::{debug, trace};
use rayon::prelude::*;

use crate::board::Player;
use crate::constants::{EARLY_STOP_CHECK_INTERVAL, EARLY_STOP_MARGIN, UCB_EXPLORATION};
use crate::error::{Error, Result};
use crate::playout::rollout;
use crate::position::{Action, GameState};

/// When a search stops.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Budget {
    /// A fixed number of simulations
    Simulations(usize),
    /// Wall-clock limit. With `early_stop`, the search also ends once the
    /// most visited root child can no longer be caught.
    Time { limit: Duration, early_stop: bool },
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Index of the parent node; `None` for the root
    pub parent: Option<usize>,
    /// Action leading here from the parent; `None` for the root
    pub action: Option<Action>,
    /// Player who played `action`. Scores are from this player's view.
    pub mover: Player,
    pub visits: u32,
    /// Sum of +1 (mover won) / -1 (mover lost) over all visits
    pub score: f64,
    pub children: Vec<usize>,
    /// Legal actions not yet turned into children
    unexplored: Vec<Action>,
    pub terminal: bool,
}

impl Node {
    fn new(parent: Option<usize>, action: Option<Action>, state: &GameState) -> Self {
        let mut unexplored = state.legal_moves();
        // expansion pops from the back; keep enumeration order
        unexplored.reverse();
        Self {
            parent,
            action,
            mover: state.current_player().opponent(),
            visits: 0,
            score: 0.0,
            children: Vec::new(),
            terminal: unexplored.is_empty(),
            unexplored,
        }
    }

    /// Average score, or 0 when unvisited.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.visits > 0 {
            self.score / self.visits as f64
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.unexplored.is_empty()
    }
}

/// Outcome of [`Tree::search`].
#[derive(Clone, Debug, Default)]
pub struct SearchSummary {
    pub simulations: usize,
    pub elapsed: Duration,
    pub early_stopped: bool,
}

/// Search tree rooted at the position it was created from.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(state: &GameState) -> Self {
        Self {
            nodes: vec![Node::new(None, None, state)],
        }
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    #[inline]
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run simulations until `budget` is spent.
    ///
    /// `state` must be at the root position and is returned there.
    pub fn search(
        &mut self,
        state: &mut GameState,
        budget: Budget,
        rng: &mut fastrand::Rng,
    ) -> SearchSummary {
        let start = Instant::now();
        let mut summary = SearchSummary::default();
        if self.root().terminal {
            return summary;
        }

        loop {
            match budget {
                Budget::Simulations(n) if summary.simulations >= n => break,
                Budget::Time { limit, .. } if start.elapsed() >= limit => break,
                _ => {}
            }

            self.simulate(state, rng);
            summary.simulations += 1;

            if let Budget::Time { limit, early_stop: true } = budget
                && summary.simulations % EARLY_STOP_CHECK_INTERVAL == 0
                && self.decided(summary.simulations, start.elapsed(), limit)
            {
                summary.early_stopped = true;
                break;
            }
        }

        summary.elapsed = start.elapsed();
        debug!(
            "mcts: {} simulations in {:.0?}{}, {} nodes",
            summary.simulations,
            summary.elapsed,
            if summary.early_stopped { " (early stop)" } else { "" },
            self.nodes.len()
        );
        summary
    }

    /// One select / expand / rollout / backpropagate pass.
    pub fn simulate(&mut self, state: &mut GameState, rng: &mut fastrand::Rng) {
        let mut path: Vec<Action> = Vec::new();
        let mut id = 0;

        while !self.nodes[id].terminal && self.nodes[id].is_fully_expanded() {
            id = self.select_child(id);
            if let Some(action) = self.nodes[id].action {
                state.apply(action);
                path.push(action);
            }
        }

        if let Some(action) = self.nodes[id].unexplored.pop() {
            state.apply(action);
            let child = self.nodes.len();
            self.nodes.push(Node::new(Some(id), Some(action), state));
            self.nodes[id].children.push(child);
            state.undo(action);

            // the rollout starts from the new child's position
            state.apply(action);
            path.push(action);
            id = child;
        }

        let winner = rollout(state, rng);
        self.backpropagate(id, winner);

        while let Some(action) = path.pop() {
            state.undo(action);
        }
    }

    fn backpropagate(&mut self, from: usize, winner: Player) {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let node = &mut self.nodes[id];
            node.visits += 1;
            node.score += if node.mover == winner { 1.0 } else { -1.0 };
            cursor = node.parent;
        }
    }

    /// Child of `id` maximizing UCB1. All children have been visited.
    fn select_child(&self, id: usize) -> usize {
        let parent = &self.nodes[id];
        let log_visits = (parent.visits.max(1) as f64).ln();
        let mut best = parent.children[0];
        let mut best_ucb = f64::NEG_INFINITY;
        for &child in &parent.children {
            let node = &self.nodes[child];
            let explore = (log_visits / node.visits.max(1) as f64).sqrt();
            let ucb = node.mean() + UCB_EXPLORATION * explore;
            if ucb > best_ucb {
                best_ucb = ucb;
                best = child;
            }
        }
        best
    }

    /// Whether the visit lead at the root can still be overturned in the
    /// remaining time, extrapolating the simulation rate so far.
    fn decided(&self, simulations: usize, spent: Duration, limit: Duration) -> bool {
        let spent = spent.as_secs_f64();
        if spent <= 0.0 {
            return false;
        }
        let left = limit.as_secs_f64() - spent;
        let mut visits: Vec<u32> =
            self.root().children.iter().map(|&c| self.nodes[c].visits).collect();
        if visits.len() < 2 {
            return self.root().is_fully_expanded();
        }
        visits.sort_unstable_by(|a, b| b.cmp(a));
        let remaining = simulations as f64 * (left.max(0.0) / spent) * EARLY_STOP_MARGIN;
        remaining < (visits[0] - visits[1]) as f64
    }

    /// Root child with the highest mean score among visited ones.
    /// Ties keep the first child created.
    pub fn best_child(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &child in &self.root().children {
            let node = &self.nodes[child];
            if node.visits == 0 {
                continue;
            }
            if best.is_none_or(|(_, mean)| node.mean() > mean) {
                best = Some((child, node.mean()));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn best_action(&self) -> Result<Action> {
        if self.root().terminal {
            return Err(Error::NoLegalMoves);
        }
        self.best_child()
            .and_then(|id| self.nodes[id].action)
            .ok_or(Error::NoSimulations)
    }

    /// `(action, visits, score)` of every root child, in creation order.
    pub fn root_children(&self) -> Vec<(Action, u32, f64)> {
        self.root()
            .children
            .iter()
            .filter_map(|&c| {
                let node = &self.nodes[c];
                node.action.map(|a| (a, node.visits, node.score))
            })
            .collect()
    }

    /// Log the statistics of each root child.
    pub fn dump_children(&self) {
        for (action, visits, score) in self.root_children() {
            let mean = if visits > 0 { score / visits as f64 } else { 0.0 };
            trace!("  {action}: visits={visits} mean={mean:.3}");
        }
    }
}

/// Build a tree from `state`, search it and return the best root action.
pub fn best_action(
    state: &mut GameState,
    budget: Budget,
    rng: &mut fastrand::Rng,
) -> Result<Action> {
    let moves = state.legal_moves();
    match moves.as_slice() {
        [] => return Err(Error::NoLegalMoves),
        [only] => return Ok(*only),
        _ => {}
    }
    let mut tree = Tree::new(state);
    tree.search(state, budget, rng);
    tree.dump_children();
    tree.best_action()
}

/// Root-parallel search on a pool of `threads` workers. Each worker owns a
/// clone of `state` and its own tree; root statistics are merged by action
/// once all workers are done.
///
/// A simulation budget is split evenly across workers. A time budget
/// applies to each worker as is.
pub fn search_parallel(
    state: &GameState,
    threads: usize,
    budget: Budget,
    seed: u64,
) -> Result<Action> {
    let threads = threads.max(1);
    let budget = match budget {
        Budget::Simulations(n) => Budget::Simulations(n.div_ceil(threads)),
        other => other,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;
    let per_worker: Vec<Vec<(Action, u32, f64)>> = pool.install(|| {
        (0..threads)
            .into_par_iter()
            .map(|worker| {
                let mut local = state.clone();
                let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(worker as u64));
                let mut tree = Tree::new(&local);
                tree.search(&mut local, budget, &mut rng);
                tree.root_children()
            })
            .collect()
    });

    let mut merged: Vec<(Action, u32, f64)> = Vec::new();
    for (action, visits, score) in per_worker.into_iter().flatten() {
        match merged.iter_mut().find(|(a, _, _)| *a == action) {
            Some(entry) => {
                entry.1 += visits;
                entry.2 += score;
            }
            None => merged.push((action, visits, score)),
        }
    }

    let total: u32 = merged.iter().map(|m| m.1).sum();
    debug!("parallel mcts: {threads} workers, {total} merged root visits");

    let mut best: Option<(Action, f64)> = None;
    for (action, visits, score) in merged {
        if visits == 0 {
            continue;
        }
        let mean = score / visits as f64;
        if best.is_none_or(|(_, m)| mean > m) {
            best = Some((action, mean));
        }
    }
    match best {
        Some((action, _)) => Ok(action),
        None if !state.has_legal_move(state.current_player()) => Err(Error::NoLegalMoves),
        None => Err(Error::NoSimulations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_conservation() {
        let mut state = GameState::new_dodo(3, Player::Red).unwrap();
        let mut rng = fastrand::Rng::with_seed(11);
        let mut tree = Tree::new(&state);
        let summary = tree.search(&mut state, Budget::Simulations(300), &mut rng);
        assert_eq!(summary.simulations, 300);
        assert_eq!(tree.root().visits, 300);

        for id in 1..tree.len() {
            let node = tree.node(id);
            let parent = tree.node(node.parent.unwrap());
            assert!(node.visits <= parent.visits);
            assert!(node.visits >= 1);
        }
        let child_sum: u32 = tree.root().children.iter().map(|&c| tree.node(c).visits).sum();
        assert_eq!(child_sum, 300);
    }

    #[test]
    fn test_state_restored_between_simulations() {
        let mut state = GameState::new_gopher(3, Player::Red).unwrap();
        let before = state.clone();
        let mut rng = fastrand::Rng::with_seed(2);
        let mut tree = Tree::new(&state);
        for _ in 0..50 {
            tree.simulate(&mut state, &mut rng);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_no_simulations() {
        let state = GameState::new_dodo(3, Player::Red).unwrap();
        let tree = Tree::new(&state);
        assert_eq!(tree.best_child(), None);
        assert_eq!(tree.best_action(), Err(Error::NoSimulations));
    }

    #[test]
    fn test_time_budget_returns_legal_move() {
        let mut state = GameState::new_dodo(4, Player::Red).unwrap();
        let mut rng = fastrand::Rng::with_seed(9);
        let budget = Budget::Time {
            limit: Duration::from_millis(50),
            early_stop: true,
        };
        let action = best_action(&mut state, budget, &mut rng).unwrap();
        assert!(state.is_legal(action));
    }

    #[test]
    fn test_finds_gopher_win() {
        // After the center stone, every Blue reply wins at once
        let mut state = GameState::new_gopher(2, Player::Blue).unwrap();
        state.apply(Action::Place(crate::hex::Cell::new(0, 0)));
        let mut rng = fastrand::Rng::with_seed(4);
        let mut tree = Tree::new(&state);
        tree.search(&mut state, Budget::Simulations(60), &mut rng);
        let best = tree.best_child().unwrap();
        assert_eq!(tree.node(best).mean(), 1.0);
    }

    #[test]
    fn test_parallel_merges_workers() {
        let state = GameState::new_dodo(3, Player::Red).unwrap();
        let action = search_parallel(&state, 3, Budget::Simulations(300), 17).unwrap();
        assert!(state.is_legal(action));
    }
}
