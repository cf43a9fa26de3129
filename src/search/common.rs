use tracing::debug_span;

use crate::prelude::*;
use std::time::Duration;

/// Counters collected during a search, logged at debug level afterwards
#[derive(Debug, Clone, Copy)]
pub struct SearchStats {
    pub nodes_searched: u64,
    pub depth_reached: u16,
    pub time_elapsed: Duration,
    pub nps: u64,
    pub hash_full: u16, // per-mille

    pub main_search_nodes: u64, // Nodes that entered the move loop
    pub qsearch_nodes: u64,

    // Early exit tracking
    pub tt_cutoffs: u64,
    pub draw_returns: u64,
    pub mate_returns: u64,
    pub standpat_returns: u64,

    // Transposition table
    pub tt_probes: u64,
    pub tt_hits: u64,

    // Pruning techniques
    pub null_move_attempts: u64,
    pub null_move_cutoffs: u64,

    // Alpha-Beta window outcomes
    pub beta_cutoffs_main: u64,
    pub beta_cutoffs_qs: u64,
    pub exact_scores: u64,
    pub fail_lows: u64,

    // Move ordering quality
    pub cutoff_at_move: [u64; MAX_PLY],
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            nodes_searched: 0,
            depth_reached: 0,
            time_elapsed: Duration::default(),
            nps: 0,
            hash_full: 0,
            main_search_nodes: 0,
            qsearch_nodes: 0,
            tt_cutoffs: 0,
            draw_returns: 0,
            mate_returns: 0,
            standpat_returns: 0,
            tt_probes: 0,
            tt_hits: 0,
            null_move_attempts: 0,
            null_move_cutoffs: 0,
            beta_cutoffs_main: 0,
            beta_cutoffs_qs: 0,
            exact_scores: 0,
            fail_lows: 0,
            cutoff_at_move: [0; MAX_PLY],
        }
    }
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn percent(numerator: u64, denominator: u64) -> f64 {
        if denominator == 0 {
            0.0
        } else {
            100.0 * numerator as f64 / denominator as f64
        }
    }

    pub fn calculate_nps(&mut self) {
        let time_ms = self.time_elapsed.as_millis().max(1) as u64;
        self.nps = (self.nodes_searched * 1000) / time_ms;
    }

    /// Mean index at which beta cutoffs happened; lower is better ordering
    pub fn avg_cutoff_index(&self) -> f64 {
        let total_cutoffs: u64 = self.cutoff_at_move.iter().sum();
        if total_cutoffs == 0 {
            0.0
        } else {
            let weighted_sum: u64 = self
                .cutoff_at_move
                .iter()
                .enumerate()
                .map(|(i, &count)| i as u64 * count)
                .sum();
            weighted_sum as f64 / total_cutoffs as f64
        }
    }

    pub fn log_summary(&self) {
        let _span = debug_span!("search_stats").entered();
        debug!("=> SEARCH STATISTICS (depth {})", self.depth_reached);
        debug!(
            "NODES total={} time={:?} nps={}",
            self.nodes_searched, self.time_elapsed, self.nps
        );
        debug!(
            "  - Main Nodes:       {:>9}  QSearch Nodes: {:>9}",
            self.main_search_nodes, self.qsearch_nodes
        );
        debug!(
            "  - Draw Returns:     {:>9}  Mate Returns:  {:>9}  Stand-pat: {:>9}",
            self.draw_returns, self.mate_returns, self.standpat_returns
        );
        debug!(
            "  - TT Hits:          {:>9} ({:>6.2}% of probes), hash_full: {}/1000",
            self.tt_hits,
            Self::percent(self.tt_hits, self.tt_probes),
            self.hash_full
        );
        debug!(
            "    - TT Cutoffs:     {:>9} ({:>6.2}% of hits)",
            self.tt_cutoffs,
            Self::percent(self.tt_cutoffs, self.tt_hits)
        );
        debug!("  - NMP Attempts:     {:>9}", self.null_move_attempts);
        debug!(
            "    - NMP Cutoffs:    {:>9} ({:>6.2}% success rate)",
            self.null_move_cutoffs,
            Self::percent(self.null_move_cutoffs, self.null_move_attempts)
        );
        debug!(
            "  - Beta Cutoffs:     {:>9} main, {:>9} qsearch",
            self.beta_cutoffs_main, self.beta_cutoffs_qs
        );
        debug!(
            "  - Exact Scores:     {:>9}  Fail Lows:     {:>9}",
            self.exact_scores, self.fail_lows
        );

        let total_cutoffs: u64 = self.cutoff_at_move.iter().sum();
        if total_cutoffs > 0 {
            debug!("  - Avg. Cutoff Index:  {:.2}", self.avg_cutoff_index());

            let histogram: Vec<String> = self
                .cutoff_at_move
                .iter()
                .take(10) // Limit to first 10 for readability
                .enumerate()
                .filter(|&(_, &count)| count > 0)
                .map(|(i, count)| format!("{}:{}", i, count))
                .collect();

            if !histogram.is_empty() {
                debug!(
                    "  - Cutoff Histogram (move index:count): [{}]",
                    histogram.join(", ")
                );
            }
        }
    }
}

/// Configuration for search behavior
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub emit_info: bool,
    pub collect_stats: bool,
    pub hash_size_mb: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            emit_info: true,
            collect_stats: true,
            hash_size_mb: 16,
        }
    }
}

/// Result of a search
#[derive(Debug, Default, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u16,
    pub nodes_searched: u64,
    pub time_taken: Duration,
    pub pv: Vec<Move>,
}

impl SearchResult {
    pub fn nps(&self) -> u64 {
        let time_ms = self.time_taken.as_millis().max(1) as u64;
        (self.nodes_searched * 1000) / time_ms
    }

    pub fn is_mate(&self) -> bool {
        self.score.abs() > MATE_THRESHOLD
    }

    /// Full moves until mate, negative when the side to move is being mated
    pub fn mate_in(&self) -> Option<i32> {
        if !self.is_mate() {
            return None;
        }
        let plies = MATE_SCORE - self.score.abs();
        let moves = (plies + 1) / 2;
        Some(if self.score > 0 { moves } else { -moves })
    }
}

#[inline(always)]
pub fn has_non_pawn_material(board: &Board) -> bool {
    let side = board.stm;
    let pawns = board.piece_bb(side, Piece::Pawn);
    let king = board.piece_bb(side, Piece::King);
    (board.side_bb(side) & !(pawns | king)).any()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_decode_to_move_counts() {
        let result = SearchResult {
            score: MATE_SCORE - 1,
            ..Default::default()
        };
        assert!(result.is_mate());
        assert_eq!(result.mate_in(), Some(1));

        let mated = SearchResult {
            score: -(MATE_SCORE - 4),
            ..Default::default()
        };
        assert_eq!(mated.mate_in(), Some(-2));

        let quiet = SearchResult {
            score: 35,
            ..Default::default()
        };
        assert_eq!(quiet.mate_in(), None);
    }

    #[test]
    fn non_pawn_material_detection() {
        let kp = Board::from_fen("k7/8/8/8/8/8/P7/K7 w - - 0 1").unwrap();
        assert!(!has_non_pawn_material(&kp));

        let with_rook = Board::from_fen("k7/8/8/8/8/8/P7/KR6 w - - 0 1").unwrap();
        assert!(has_non_pawn_material(&with_rook));
    }
}
