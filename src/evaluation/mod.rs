use crate::{
    board::{
        Board,
        components::{Piece, Side},
    },
    consts::NUM_PIECES,
};

/// Centipawn piece values, indexed by `Piece::index()`. Shared between the
/// evaluator and the MVV-LVA capture scoring in move ordering.
pub const PIECE_VALUES: [i32; NUM_PIECES] = [100, 320, 330, 500, 900, 20_000];

/// Static evaluation seam. The search driver only ever sees this trait;
/// a real engine plugs a positional evaluator in here.
pub trait Evaluator: Send {
    /// Score from the side to move's perspective, in centipawns
    fn evaluate(&self, board: &Board) -> i32;

    fn name(&self) -> &'static str;
}

/// Plain material count. Enough to drive search tests and tactics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let mut score = 0;
        for piece in Piece::PIECES {
            if piece == Piece::King {
                continue;
            }
            let diff = board.piece_bb(Side::White, piece).pop_count() as i32
                - board.piece_bb(Side::Black, piece).pop_count() as i32;
            score += diff * PIECE_VALUES[piece.index()];
        }
        match board.stm {
            Side::White => score,
            Side::Black => -score,
        }
    }

    fn name(&self) -> &'static str {
        "material"
    }
}
