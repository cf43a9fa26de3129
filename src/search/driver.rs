//! Iterative-deepening negamax with alpha-beta pruning, a principal
//! variation zero-window re-search, quiescence, null move pruning and
//! transposition-table cutoffs. Move ordering and time control are
//! delegated to the orderer and time modules.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::trace_span;

use crate::prelude::*;
use crate::search::common::{SearchConfig, SearchStats, has_non_pawn_material};
use crate::search::history::{MoveHistory, SearchStackEntry};
use crate::search::orderer::MoveOrderer;
use crate::search::tt::{Entry, ScoreFlag};

const INFINITY: i32 = MATE_SCORE + 1;

/// How often the hot loop checks the clock, as a node-count mask
const POLL_INTERVAL: u64 = 2048;

pub struct Searcher {
    /// External deps
    evaluator: Box<dyn Evaluator>,
    running: Option<Arc<AtomicBool>>,
    /// Shared tables
    tt: TranspositionTable,
    history: MoveHistory,
    /// Clock
    time: TimeManagement,
    /// Per-ply state the history heuristics read back through
    stack: Box<[SearchStackEntry]>,
    /// Status
    nodes_searched: u64,
    stopped: bool,
    /// A depth-one result is always carried to completion so the driver
    /// can never come back empty-handed on a hopeless clock
    allow_stop: bool,
    config: SearchConfig,
    stats: SearchStats,
}

impl Searcher {
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Self::with_tunables(evaluator, Arc::new(Tunables::default()))
    }

    pub fn with_tunables(evaluator: Box<dyn Evaluator>, tunables: Arc<Tunables>) -> Self {
        let config = SearchConfig::default();
        Self {
            evaluator,
            running: None,
            tt: TranspositionTable::new(config.hash_size_mb),
            history: MoveHistory::new(),
            time: TimeManagement::new(tunables),
            stack: vec![SearchStackEntry::default(); MAX_PLY + 4].into_boxed_slice(),
            nodes_searched: 0,
            stopped: false,
            allow_stop: false,
            config,
            stats: SearchStats::new(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> miette::Result<Self> {
        if self.config.hash_size_mb != config.hash_size_mb {
            self.tt.resize(config.hash_size_mb)?;
        }
        self.config = config;
        Ok(self)
    }

    /// Shared stop flag for a protocol thread; cleared flag ends the search
    pub fn set_running(&mut self, flag: Arc<AtomicBool>) {
        self.running = Some(flag);
    }

    pub fn set_hash(&mut self, mb_size: usize) -> miette::Result<()> {
        self.tt.resize(mb_size)?;
        self.config.hash_size_mb = mb_size;
        Ok(())
    }

    /// Forgets everything learned from previous games
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.history.clear();
        self.stats = SearchStats::new();
    }

    pub fn get_stats(&mut self) -> SearchStats {
        self.stats.nodes_searched = self.nodes_searched;
        self.stats.hash_full = self.tt.hash_full();
        self.stats.calculate_nps();
        self.stats
    }

    pub fn go(&mut self, board: &mut Board, config: TimeConfig) -> SearchResult {
        let span = trace_span!("search_root");
        let _guard = span.enter();

        self.time.set_config(config);
        self.time.start();
        self.nodes_searched = 0;
        self.stopped = false;
        self.allow_stop = false;
        self.stats = SearchStats::new();
        self.history.clear_killers();
        if let Some(flag) = &self.running {
            flag.store(true, Ordering::Relaxed);
        }
        let started = Instant::now();

        debug!(
            "searching '{}' to depth {}",
            board.to_fen(),
            self.time.search_depth()
        );

        let mut best_move = Move::NULL;
        let mut best_score = -INFINITY;
        let mut completed_depth = 0u16;

        for depth in 1..=self.time.search_depth() {
            let (mv, score) = self.root_search(board, depth as i32);

            if self.stopped {
                break;
            }
            self.allow_stop = true;

            best_move = mv;
            best_score = score;
            completed_depth = depth;

            if self.config.emit_info {
                let pv = self.extract_pv(board, completed_depth);
                self.emit_info(completed_depth, best_score, started, &pv);
            }

            // Checkmate and stalemate cannot be improved by more depth
            if best_move.is_null() {
                break;
            }
            if self.time.should_stop(best_move, self.nodes_searched) {
                break;
            }
        }
        self.time.stop();

        if self.config.collect_stats {
            self.stats.depth_reached = completed_depth;
            self.stats.time_elapsed = started.elapsed();
            self.get_stats().log_summary();
        }
        if let Some(flag) = &self.running {
            flag.store(false, Ordering::Relaxed);
        }

        let pv = self.extract_pv(board, completed_depth);
        SearchResult {
            best_move: (!best_move.is_null()).then_some(best_move),
            score: best_score,
            depth: completed_depth,
            nodes_searched: self.nodes_searched,
            time_taken: started.elapsed(),
            pv,
        }
    }

    /// One full-width iteration at the root. Node counts are charged to
    /// the move that was on the board while they were searched, which is
    /// what the adaptive soft limit reads back.
    fn root_search(&mut self, board: &mut Board, depth: i32) -> (Move, i32) {
        let mut alpha = -INFINITY;
        let beta = INFINITY;

        let mut list = MoveList::new();
        generate_moves(board, GenMode::All, &mut list);
        let mut orderer = MoveOrderer::new(
            board,
            list,
            GenMode::All,
            &self.tt,
            &self.history,
            &self.stack,
            0,
        );

        let mut best_move = Move::NULL;
        let mut best_score = -INFINITY;
        let mut moves_made = 0usize;

        for idx in 0..orderer.len() {
            let mv = orderer.get_move(idx);
            self.stack[0] = SearchStackEntry {
                mv,
                side: board.stm,
                static_eval: 0,
            };

            let nodes_before = self.nodes_searched;
            if !board.make_move(mv) {
                continue;
            }
            let score = -self.negamax(board, depth - 1, 1, -beta, -alpha);
            board.undo_move();
            *self.time.nodes_spent(mv) += self.nodes_searched - nodes_before;

            if self.stopped {
                return (best_move, best_score);
            }
            moves_made += 1;

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
            }
            if self.allow_stop && self.time.should_stop(best_move, self.nodes_searched) {
                self.stopped = true;
                return (best_move, best_score);
            }
        }

        if moves_made == 0 {
            let score = if board.in_check(board.stm) {
                -MATE_SCORE
            } else {
                STALEMATE_SCORE
            };
            return (Move::NULL, score);
        }

        let entry = Entry::new(board.hash, depth as u8, ScoreFlag::Exact, best_score, best_move);
        self.tt.save(&entry, 0);

        (best_move, best_score)
    }

    fn negamax(
        &mut self,
        board: &mut Board,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        if self.check_stop() {
            return 0;
        }

        if ply >= MAX_PLY {
            return self.corrected_eval(board);
        }
        if board.halfmove_clock >= 100 {
            if self.config.collect_stats {
                self.stats.draw_returns += 1;
            }
            return STALEMATE_SCORE;
        }
        if depth <= 0 {
            return self.qsearch(board, ply, alpha, beta);
        }
        self.nodes_searched += 1;

        let original_alpha = alpha;
        let hash = board.hash;

        if self.config.collect_stats {
            self.stats.tt_probes += 1;
        }
        let tt_entry = self.tt.probe(hash);
        if tt_entry.matches(hash) {
            if self.config.collect_stats {
                self.stats.tt_hits += 1;
            }
            if tt_entry.depth as i32 >= depth {
                let score = TranspositionTable::score_from_tt(tt_entry.score, ply);
                match tt_entry.flag {
                    ScoreFlag::Exact => {
                        if self.config.collect_stats {
                            self.stats.tt_cutoffs += 1;
                        }
                        return score;
                    }
                    // The true score is at least this; enough to beat beta?
                    ScoreFlag::LowerBound => alpha = alpha.max(score),
                    // The true score is at most this; enough to fall under alpha?
                    ScoreFlag::UpperBound => beta = beta.min(score),
                }
                if alpha >= beta {
                    if self.config.collect_stats {
                        self.stats.tt_cutoffs += 1;
                    }
                    return score;
                }
            }
        }

        let in_check = board.in_check(board.stm);
        let static_eval = self.corrected_eval(board);

        // Killers two plies up belong to a sibling line, not this one
        self.history.clear_killers_at(ply + 1);

        // Null move pruning: hand the opponent a free move and see if the
        // position still beats beta. Unsound in zugzwang, hence the
        // non-pawn-material guard, and never twice in a row.
        let prior_was_null = ply >= 1 && self.stack[ply - 1].mv.is_null();
        if !in_check
            && !prior_was_null
            && depth >= 3
            && static_eval >= beta
            && has_non_pawn_material(board)
        {
            if self.config.collect_stats {
                self.stats.null_move_attempts += 1;
            }
            let reduction = if depth >= 6 { 4 } else { 2 };
            self.stack[ply] = SearchStackEntry {
                mv: Move::NULL,
                side: board.stm,
                static_eval,
            };
            board.make_null_move();
            let score = -self.negamax(board, depth - reduction, ply + 1, -beta, -beta + 1);
            board.undo_move();
            if self.stopped {
                return 0;
            }
            if score >= beta {
                if self.config.collect_stats {
                    self.stats.null_move_cutoffs += 1;
                }
                return score;
            }
        }

        let mut list = MoveList::new();
        generate_moves(board, GenMode::All, &mut list);
        let mut orderer = MoveOrderer::new(
            board,
            list,
            GenMode::All,
            &self.tt,
            &self.history,
            &self.stack,
            ply,
        );

        if self.config.collect_stats {
            self.stats.main_search_nodes += 1;
        }

        let mut best_score = -INFINITY;
        let mut best_move = Move::NULL;
        let mut moves_made = 0usize;
        let mut bad_quiets = MoveList::new();

        for idx in 0..orderer.len() {
            let mv = orderer.get_move(idx);
            let is_quiet = !board.is_capture(mv) && mv.promotion().is_none();

            self.stack[ply] = SearchStackEntry {
                mv,
                side: board.stm,
                static_eval,
            };
            if !board.make_move(mv) {
                continue;
            }
            self.tt.prefetch(board.hash);

            let score = if moves_made == 0 {
                -self.negamax(board, depth - 1, ply + 1, -beta, -alpha)
            } else {
                // Zero-window probe; re-search on an unexpected fail-high
                let probe = -self.negamax(board, depth - 1, ply + 1, -alpha - 1, -alpha);
                if probe > alpha && probe < beta {
                    -self.negamax(board, depth - 1, ply + 1, -beta, -alpha)
                } else {
                    probe
                }
            };
            board.undo_move();

            if self.stopped {
                return 0;
            }
            moves_made += 1;

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if self.config.collect_stats {
                    if idx < MAX_PLY {
                        self.stats.cutoff_at_move[idx] += 1;
                    }
                    self.stats.beta_cutoffs_main += 1;
                }
                // Fail high on a quiet move feeds every quiet heuristic
                if is_quiet {
                    self.history.update_killer_move(mv, ply);
                    self.history
                        .update_history(mv, bad_quiets.as_slice(), board.stm, depth);
                    self.history.update_cont_history(
                        mv,
                        bad_quiets.as_slice(),
                        board.stm,
                        depth,
                        &self.stack,
                        ply,
                    );
                }
                break;
            }
            if is_quiet {
                bad_quiets.push(mv);
            }
        }

        if moves_made == 0 {
            if self.config.collect_stats {
                self.stats.mate_returns += 1;
            }
            return if in_check {
                // Deeper mates score worse, so the search prefers the fastest
                -MATE_SCORE + ply as i32
            } else {
                STALEMATE_SCORE
            };
        }

        let flag = if best_score >= beta {
            ScoreFlag::LowerBound
        } else if best_score <= original_alpha {
            if self.config.collect_stats {
                self.stats.fail_lows += 1;
            }
            ScoreFlag::UpperBound
        } else {
            if self.config.collect_stats {
                self.stats.exact_scores += 1;
            }
            ScoreFlag::Exact
        };

        let entry = Entry::new(hash, depth as u8, flag, best_score, best_move);
        self.tt.save(&entry, ply);

        // Teach the correction term how far the static eval missed, but
        // only where the search result actually bounds the truth: a fail
        // high below the eval or a fail low above it says nothing
        let best_is_quiet = !board.is_capture(best_move) && best_move.promotion().is_none();
        if !in_check
            && best_is_quiet
            && best_score.abs() < MATE_THRESHOLD
            && !(flag == ScoreFlag::LowerBound && best_score <= static_eval)
            && !(flag == ScoreFlag::UpperBound && best_score >= static_eval)
        {
            let bonus = (best_score - static_eval) * depth / 8;
            self.history
                .update_correction_history(bonus, board.stm, board.pawn_hash);
        }

        best_score
    }

    /// Captures-only search until the position is quiet enough to trust
    /// the static eval
    fn qsearch(&mut self, board: &mut Board, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        if self.check_stop() {
            return 0;
        }
        self.nodes_searched += 1;

        let static_eval = self.corrected_eval(board);
        if ply >= MAX_PLY {
            return static_eval;
        }

        if static_eval >= beta {
            if self.config.collect_stats {
                self.stats.standpat_returns += 1;
            }
            return static_eval;
        }
        if static_eval > alpha {
            alpha = static_eval;
        }

        if self.config.collect_stats {
            self.stats.qsearch_nodes += 1;
        }

        let mut list = MoveList::new();
        generate_moves(board, GenMode::Captures, &mut list);
        let mut orderer = MoveOrderer::new(
            board,
            list,
            GenMode::Captures,
            &self.tt,
            &self.history,
            &self.stack,
            ply,
        );

        let mut best_score = static_eval;

        for idx in 0..orderer.len() {
            let mv = orderer.get_move(idx);
            self.stack[ply] = SearchStackEntry {
                mv,
                side: board.stm,
                static_eval,
            };
            if !board.make_move(mv) {
                continue;
            }
            let score = -self.qsearch(board, ply + 1, -beta, -alpha);
            board.undo_move();

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if self.config.collect_stats {
                    self.stats.beta_cutoffs_qs += 1;
                }
                break;
            }
        }

        best_score
    }

    fn corrected_eval(&self, board: &Board) -> i32 {
        let raw = self.evaluator.evaluate(board);
        self.history
            .correct_static_eval(raw, board.stm, board.pawn_hash)
    }

    /// Hot-loop stop poll. Already-stopped searches unwind immediately;
    /// the clock and the shared flag are only consulted every
    /// POLL_INTERVAL nodes.
    #[inline]
    fn check_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if !self.allow_stop || self.nodes_searched % POLL_INTERVAL != 0 {
            return false;
        }
        if self.time.times_up() {
            self.stopped = true;
            return true;
        }
        if let Some(flag) = &self.running
            && !flag.load(Ordering::Acquire)
        {
            debug!("stop signal received");
            self.stopped = true;
            return true;
        }
        false
    }

    /// Walks the table from the root, re-validating each stored move
    /// against the live position; a stale or colliding entry ends the line
    fn extract_pv(&self, board: &mut Board, depth: u16) -> Vec<Move> {
        let mut pv = Vec::new();
        for _ in 0..depth {
            let entry = self.tt.probe(board.hash);
            if !entry.matches(board.hash) || entry.best_move.is_null() {
                break;
            }
            let mv = entry.best_move;
            if !board.is_valid_move(mv) {
                break;
            }
            board.make_move(mv);
            pv.push(mv);
        }
        for _ in 0..pv.len() {
            board.undo_move();
        }
        pv
    }

    fn emit_info(&self, depth: u16, score: i32, started: Instant, pv: &[Move]) {
        let elapsed = started.elapsed().as_millis().max(1) as u64;
        let nps = self.nodes_searched * 1000 / elapsed;
        let score_str = if score.abs() > MATE_THRESHOLD {
            let plies = MATE_SCORE - score.abs();
            let moves = (plies + 1) / 2;
            format!("mate {}", if score > 0 { moves } else { -moves })
        } else {
            format!("cp {score}")
        };
        let pv_str = pv
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let msg = format!(
            "info depth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
            depth,
            score_str,
            self.nodes_searched,
            nps,
            elapsed,
            self.tt.hash_full(),
            pv_str
        );
        println!("{msg}");
        debug!(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_searcher() -> Searcher {
        Searcher::new(Box::new(MaterialEvaluator))
            .with_config(SearchConfig {
                emit_info: false,
                collect_stats: false,
                hash_size_mb: 16,
            })
            .unwrap()
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut searcher = quiet_searcher();

        let result = searcher.go(&mut board, TimeConfig::depth(3));

        assert_eq!(result.best_move, Some(Move::new(0, 56, Piece::Rook)));
        assert!(result.is_mate());
        assert_eq!(result.mate_in(), Some(1));
    }

    #[test]
    fn avoids_hanging_material() {
        // Only exd5 wins the queen; everything else loses on balance
        let mut board = Board::from_fen("k7/8/8/3q4/4P3/8/8/K7 w - - 0 1").unwrap();
        let mut searcher = quiet_searcher();

        let result = searcher.go(&mut board, TimeConfig::depth(3));

        assert_eq!(result.best_move, Some(Move::new(28, 35, Piece::Pawn)));
        assert!(result.score > 0);
    }

    #[test]
    fn depth_limited_search_reports_its_depth() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let mut searcher = quiet_searcher();

        let result = searcher.go(&mut board, TimeConfig::depth(4));

        assert_eq!(result.depth, 4);
        assert!(result.nodes_searched > 0);
        assert!(result.best_move.is_some());
        assert!(!result.pv.is_empty());
    }

    #[test]
    fn stalemate_returns_no_move_and_draw_score() {
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut searcher = quiet_searcher();

        let result = searcher.go(&mut board, TimeConfig::depth(5));

        assert_eq!(result.best_move, None);
        assert_eq!(result.score, STALEMATE_SCORE);
    }

    #[test]
    fn near_zero_clock_still_produces_a_legal_move() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let mut searcher = quiet_searcher();

        let config = TimeConfig {
            time_left: 1,
            ..Default::default()
        };
        let result = searcher.go(&mut board, config);

        let best = result.best_move.expect("a move must always be produced");
        assert!(board.is_valid_move(best));
        assert!(result.depth >= 1);
    }

    #[test]
    fn search_state_survives_consecutive_calls() {
        let mut board = Board::from_fen(KIWIPETE).unwrap();
        let mut searcher = quiet_searcher();

        let first = searcher.go(&mut board, TimeConfig::depth(3));
        let second = searcher.go(&mut board, TimeConfig::depth(3));

        assert!(first.best_move.is_some());
        assert!(second.best_move.is_some());
        // The board must come back untouched from a full search
        assert_eq!(board.to_fen(), KIWIPETE);
    }
}
