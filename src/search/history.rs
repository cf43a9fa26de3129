use crate::{
    board::components::Side,
    consts::{MAX_PLY, NUM_PIECES, NUM_SIDES, NUM_SQUARES},
    moves::Move,
};

/// Saturation bound for butterfly and continuation history values
pub const MAX_HISTORY: i32 = 8192;

const FROM_TO: usize = NUM_SQUARES * NUM_SQUARES;
const CONT_KEYS: usize = NUM_SIDES * NUM_PIECES * NUM_SQUARES;
const CORRECTION_HISTORY_SIZE: usize = 16384;
const CORRECTION_HISTORY_LIMIT: i32 = 512;
/// Applied correction is `value / CORRECTION_GRAIN` centipawns
const CORRECTION_GRAIN: i32 = 4;

/// One frame of the current search line, consulted by continuation history
#[derive(Debug, Clone, Copy)]
pub struct SearchStackEntry {
    pub mv: Move,
    pub side: Side,
    pub static_eval: i32,
}

impl Default for SearchStackEntry {
    fn default() -> Self {
        Self {
            mv: Move::NULL,
            side: Side::White,
            static_eval: 0,
        }
    }
}

/// Saturating reinforcement update: pulls the entry toward +/-limit with a
/// step that shrinks as the entry approaches the bound, so values can
/// never leave [-limit, limit]
#[inline(always)]
fn gravity(entry: &mut i32, bonus: i32, limit: i32) {
    let bonus = bonus.clamp(-limit, limit);
    *entry += bonus - *entry * bonus.abs() / limit;
}

/// Adjustment magnitude for a cutoff found at the given depth
#[inline(always)]
fn history_bonus(depth: i32) -> i32 {
    (depth * depth).min(MAX_HISTORY)
}

/// Adaptive move-quality memory: killer moves per ply, butterfly (from,to)
/// history, continuation history keyed by recent moves in the search line,
/// and a static-eval correction table keyed by pawn structure. Persists
/// across searches; cleared explicitly between games.
pub struct MoveHistory {
    killers: [[Move; 2]; MAX_PLY],
    /// [side][from * 64 + to]
    butterfly: Box<[i32]>,
    /// [prior move's (side, piece, to)][current move's (side, piece, to)]
    continuation: Box<[i32]>,
    /// [side][pawn_hash % CORRECTION_HISTORY_SIZE]
    correction: Box<[i32]>,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveHistory {
    pub fn new() -> Self {
        Self {
            killers: [[Move::NULL; 2]; MAX_PLY],
            butterfly: vec![0; NUM_SIDES * FROM_TO].into_boxed_slice(),
            continuation: vec![0; CONT_KEYS * CONT_KEYS].into_boxed_slice(),
            correction: vec![0; NUM_SIDES * CORRECTION_HISTORY_SIZE].into_boxed_slice(),
        }
    }

    pub fn clear(&mut self) {
        self.killers = [[Move::NULL; 2]; MAX_PLY];
        self.butterfly.fill(0);
        self.continuation.fill(0);
        self.correction.fill(0);
    }

    #[inline(always)]
    fn butterfly_index(mv: Move, side: Side) -> usize {
        side.index() * FROM_TO + mv.from_sq() as usize * NUM_SQUARES + mv.to_sq() as usize
    }

    #[inline(always)]
    fn cont_key(mv: Move, side: Side) -> usize {
        (side.index() * NUM_PIECES + mv.piece().index()) * NUM_SQUARES + mv.to_sq() as usize
    }

    /// Quiet-move ordering signal for (from, to) under the given side
    #[inline]
    pub fn history_score(&self, mv: Move, side: Side) -> i32 {
        self.butterfly[Self::butterfly_index(mv, side)]
    }

    /// "This move after that recent move" signal, read from the entry the
    /// move `plies_ago` steps back in the search line points at
    pub fn cont_history_score(
        &self,
        mv: Move,
        side: Side,
        plies_ago: usize,
        stack: &[SearchStackEntry],
        ply: usize,
    ) -> i32 {
        if ply < plies_ago {
            return 0;
        }
        let prior = stack[ply - plies_ago];
        if prior.mv.is_null() {
            return 0;
        }
        let idx = Self::cont_key(prior.mv, prior.side) * CONT_KEYS + Self::cont_key(mv, side);
        self.continuation[idx]
    }

    #[inline]
    pub fn killers(&self, ply: usize) -> [Move; 2] {
        self.killers[ply.min(MAX_PLY - 1)]
    }

    pub fn update_killer_move(&mut self, mv: Move, ply: usize) {
        if ply >= MAX_PLY {
            return;
        }
        let slot = &mut self.killers[ply];
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    pub fn clear_killers(&mut self) {
        self.killers = [[Move::NULL; 2]; MAX_PLY];
    }

    pub fn clear_killers_at(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.killers[ply] = [Move::NULL; 2];
        }
    }

    /// Rewards the quiet move that produced a cutoff and penalizes the
    /// quiets tried before it, scaled by depth. Values saturate at
    /// MAX_HISTORY rather than overflowing.
    pub fn update_history(&mut self, best: Move, bad_quiets: &[Move], side: Side, depth: i32) {
        let bonus = history_bonus(depth);
        gravity(
            &mut self.butterfly[Self::butterfly_index(best, side)],
            bonus,
            MAX_HISTORY,
        );
        for &quiet in bad_quiets {
            gravity(
                &mut self.butterfly[Self::butterfly_index(quiet, side)],
                -bonus,
                MAX_HISTORY,
            );
        }
    }

    /// Same reward/penalty scheme applied to the continuation entries of
    /// the moves made one and two plies earlier
    pub fn update_cont_history(
        &mut self,
        best: Move,
        bad_quiets: &[Move],
        side: Side,
        depth: i32,
        stack: &[SearchStackEntry],
        ply: usize,
    ) {
        let bonus = history_bonus(depth);
        for plies_ago in [1usize, 2] {
            if ply < plies_ago {
                continue;
            }
            let prior = stack[ply - plies_ago];
            if prior.mv.is_null() {
                continue;
            }
            let base = Self::cont_key(prior.mv, prior.side) * CONT_KEYS;
            gravity(
                &mut self.continuation[base + Self::cont_key(best, side)],
                bonus,
                MAX_HISTORY,
            );
            for &quiet in bad_quiets {
                gravity(
                    &mut self.continuation[base + Self::cont_key(quiet, side)],
                    -bonus,
                    MAX_HISTORY,
                );
            }
        }
    }

    /// Adjusts the raw static eval by the learned bias for this pawn
    /// structure
    pub fn correct_static_eval(&self, static_eval: i32, side: Side, pawn_hash: u64) -> i32 {
        let value = self.correction[Self::correction_index(side, pawn_hash)];
        static_eval + value / CORRECTION_GRAIN
    }

    /// Nudges the correction term toward the search's retrospective
    /// finding (search score minus static eval); clamped so a run of
    /// one-sided results cannot drift without bound
    pub fn update_correction_history(&mut self, bonus: i32, side: Side, pawn_hash: u64) {
        gravity(
            &mut self.correction[Self::correction_index(side, pawn_hash)],
            bonus,
            CORRECTION_HISTORY_LIMIT,
        );
    }

    #[inline(always)]
    fn correction_index(side: Side, pawn_hash: u64) -> usize {
        side.index() * CORRECTION_HISTORY_SIZE + (pawn_hash as usize % CORRECTION_HISTORY_SIZE)
    }
}
