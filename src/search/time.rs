use std::sync::{
    Arc, LazyLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;

use tracing::debug;

use crate::{consts::MAX_PLY, moves::Move, tuning::Tunables};

/// Millisecond clock anchored at first use; lets timestamps live in atomics
static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

#[inline(always)]
fn now_ms() -> u64 {
    EPOCH.elapsed().as_millis() as u64
}

/// Snapshot of the time controls handed over by the protocol layer,
/// all durations in milliseconds
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeConfig {
    pub time_left: u64,
    pub increment: u64,
    /// Fixed time for this move; disables the adaptive soft limit
    pub move_time: u64,
    /// Explicit depth limit; nonzero selects depth-governed search
    pub depth: u16,
    pub infinite: bool,
    /// Safety margin for protocol/GUI latency
    pub move_overhead: u64,
}

impl TimeConfig {
    pub fn depth(depth: u16) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn move_time(ms: u64) -> Self {
        Self {
            move_time: ms,
            time_left: ms,
            ..Default::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeMode {
    Infinite,
    Depth,
    Timed,
}

/// Decides when the search must stop. The hard limit is absolute; the soft
/// limit shrinks as the search piles more of its nodes onto a single stable
/// best move. Limits and timestamps are atomics so a polling search thread
/// never takes a lock.
pub struct TimeManagement {
    config: TimeConfig,
    mode: TimeMode,
    tunables: Arc<Tunables>,
    start_time: AtomicU64,
    end_time: AtomicU64,
    soft_limit: AtomicU64,
    hard_limit: AtomicU64,
    /// Nodes spent under each candidate best move, addressed by the low
    /// 12 bits of the move encoding. Collisions are a tolerated,
    /// bounded-error approximation.
    nodes_spent: Box<[u64; 4096]>,
}

impl TimeManagement {
    pub fn new(tunables: Arc<Tunables>) -> Self {
        Self {
            config: TimeConfig::default(),
            mode: TimeMode::Infinite,
            tunables,
            start_time: AtomicU64::new(0),
            end_time: AtomicU64::new(0),
            soft_limit: AtomicU64::new(0),
            hard_limit: AtomicU64::new(0),
            nodes_spent: Box::new([0; 4096]),
        }
    }

    /// The mode is fixed once per search from the config shape
    pub fn set_config(&mut self, config: TimeConfig) {
        self.config = config;
        self.mode = if config.infinite {
            TimeMode::Infinite
        } else if config.depth != 0 {
            TimeMode::Depth
        } else {
            TimeMode::Timed
        };
    }

    /// Computes the limits for this search and resets live counters
    pub fn start(&mut self) {
        let t = &self.tunables;
        let config = &self.config;

        let base_time = (config.time_left as f64 * (t.base_time_scale / 1000.0)
            + config.increment as f64 * (t.increment_scale / 100.0)
            - config.move_overhead as f64)
            .max(1.0);
        let maximum_time = if config.move_time != 0 {
            config.move_time as f64
        } else {
            t.percent_limit / 100.0 * config.time_left as f64
        };

        let hard = (t.hard_limit_scale / 100.0 * base_time).min(maximum_time);
        let soft = (t.soft_limit_scale / 100.0 * base_time).min(maximum_time);

        // Even a hopeless clock must leave room to finish one ply
        self.hard_limit.store((hard as u64).max(1), Ordering::Relaxed);
        self.soft_limit.store((soft as u64).max(1), Ordering::Relaxed);
        self.start_time.store(now_ms(), Ordering::Relaxed);
        self.nodes_spent.fill(0);

        debug!(
            "time limits: soft {}ms hard {}ms (left {}ms inc {}ms)",
            self.soft_limit.load(Ordering::Relaxed),
            self.hard_limit.load(Ordering::Relaxed),
            config.time_left,
            config.increment
        );
    }

    pub fn stop(&self) {
        self.end_time.store(now_ms(), Ordering::Relaxed);
    }

    /// Depth cap for iterative deepening under the current mode
    pub fn search_depth(&self) -> u16 {
        match self.mode {
            TimeMode::Depth => self.config.depth,
            TimeMode::Infinite | TimeMode::Timed => MAX_PLY as u16,
        }
    }

    #[inline(always)]
    pub fn elapsed(&self) -> u64 {
        now_ms()
            .saturating_sub(self.start_time.load(Ordering::Relaxed))
            .max(1)
    }

    /// The absolute cutoff, polled from the search hot loop
    #[inline]
    pub fn times_up(&self) -> bool {
        self.mode == TimeMode::Timed && self.elapsed() >= self.hard_limit.load(Ordering::Relaxed)
    }

    /// Between-iteration stop check. When most of the search effort has
    /// gone into confirming one best move, the result is stable and the
    /// soft limit shrinks; an unsettled best move keeps the full budget.
    pub fn should_stop(&self, best_move: Move, nodes_searched: u64) -> bool {
        if self.mode != TimeMode::Timed {
            return false;
        }
        if self.config.move_time != 0 {
            return self.times_up();
        }
        self.elapsed() >= self.adjusted_soft_limit(best_move, nodes_searched)
    }

    fn adjusted_soft_limit(&self, best_move: Move, nodes_searched: u64) -> u64 {
        let t = &self.tunables;
        let searched_fraction =
            self.nodes_spent[Self::spent_index(best_move)] as f64 / nodes_searched.max(1) as f64;
        let scale =
            (t.node_fraction_base / 100.0 - searched_fraction) * (t.node_fraction_scale / 100.0);

        let soft = self.soft_limit.load(Ordering::Relaxed) as f64 * scale;
        (soft as u64).min(self.hard_limit.load(Ordering::Relaxed))
    }

    /// Counter of nodes spent while this move was the search candidate
    #[inline]
    pub fn nodes_spent(&mut self, mv: Move) -> &mut u64 {
        &mut self.nodes_spent[Self::spent_index(mv)]
    }

    #[inline(always)]
    fn spent_index(mv: Move) -> usize {
        (mv.data() & 4095) as usize
    }

    #[cfg(test)]
    fn limits(&self) -> (u64, u64) {
        (
            self.soft_limit.load(Ordering::Relaxed),
            self.hard_limit.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::components::Piece;

    fn timed(config: TimeConfig) -> TimeManagement {
        let mut tm = TimeManagement::new(Arc::new(Tunables::default()));
        tm.set_config(config);
        tm.start();
        tm
    }

    #[test]
    fn depth_mode_never_times_out() {
        let tm = timed(TimeConfig::depth(5));
        assert_eq!(tm.search_depth(), 5);
        assert!(!tm.times_up());
        assert!(!tm.should_stop(Move::new(12, 28, Piece::Pawn), 1_000_000));
    }

    #[test]
    fn infinite_mode_never_stops() {
        let tm = timed(TimeConfig::infinite());
        assert_eq!(tm.search_depth(), MAX_PLY as u16);
        assert!(!tm.times_up());
        assert!(!tm.should_stop(Move::NULL, u64::MAX));
    }

    #[test]
    fn limit_ordering_holds_for_timed_configs() {
        for time_left in [50u64, 1_000, 60_000, 3_600_000] {
            for increment in [0u64, 100, 5_000] {
                let tm = timed(TimeConfig {
                    time_left,
                    increment,
                    move_overhead: 10,
                    ..Default::default()
                });
                let (soft, hard) = tm.limits();
                let tunables = Tunables::default();
                let cap = (tunables.percent_limit / 100.0 * time_left as f64) as u64;
                assert!(soft > 0);
                assert!(soft <= hard, "soft {soft} > hard {hard}");
                assert!(hard <= cap.max(1), "hard {hard} above cap {cap}");
            }
        }
    }

    #[test]
    fn near_zero_clock_still_leaves_a_budget() {
        let tm = timed(TimeConfig {
            time_left: 1,
            move_overhead: 100,
            ..Default::default()
        });
        let (soft, hard) = tm.limits();
        assert!(soft >= 1 && hard >= 1);
    }

    #[test]
    fn stable_best_move_shrinks_the_soft_limit() {
        let mv = Move::new(12, 28, Piece::Pawn);
        let other = Move::new(6, 21, Piece::Knight);
        let total_nodes = 1_000_000u64;

        let mut stable = timed(TimeConfig {
            time_left: 60_000,
            ..Default::default()
        });
        *stable.nodes_spent(mv) = 900_000;
        let stable_limit = stable.adjusted_soft_limit(mv, total_nodes);

        let mut unstable = timed(TimeConfig {
            time_left: 60_000,
            ..Default::default()
        });
        *unstable.nodes_spent(mv) = 50_000;
        *unstable.nodes_spent(other) = 950_000;
        let unstable_limit = unstable.adjusted_soft_limit(mv, total_nodes);

        assert!(
            stable_limit < unstable_limit,
            "high node share must stop sooner: {stable_limit} vs {unstable_limit}"
        );
    }

    #[test]
    fn fixed_move_time_delegates_to_hard_limit() {
        let tm = timed(TimeConfig::move_time(5_000));
        // Fresh search, nothing elapsed: neither limit can have passed
        assert!(!tm.times_up());
        assert!(!tm.should_stop(Move::NULL, 1));
    }

    #[test]
    fn colliding_move_encodings_share_a_counter() {
        let mut tm = timed(TimeConfig {
            time_left: 10_000,
            ..Default::default()
        });
        let mv = Move::new(1, 2, Piece::Knight);
        *tm.nodes_spent(mv) += 10;
        // Same low 12 bits, same counter slot: accepted approximation
        let alias = Move::from_data(mv.data() ^ (1 << 15));
        assert_eq!(*tm.nodes_spent(alias), 10);
    }
}
