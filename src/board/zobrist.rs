use std::sync::LazyLock;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    board::components::{Piece, Side},
    consts::*,
};

pub static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

#[derive(Debug)]
pub struct ZobristKeys {
    /// For each side, each piece type, each square
    pub pieces: [[[u64; NUM_SQUARES]; NUM_PIECES]; NUM_SIDES],
    /// For each of the 16 possible castling rights states
    pub castling: [u64; NUM_CASTLING_RIGHTS],
    /// Single key to flip when stm changes
    pub black_to_move: u64,
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(1070373321345817214);
        let mut keys = Self {
            pieces: [[[0; NUM_SQUARES]; NUM_PIECES]; NUM_SIDES],
            castling: [0; NUM_CASTLING_RIGHTS],
            black_to_move: rng.random(),
        };

        for side in Side::SIDES {
            for piece in Piece::PIECES {
                for square in 0..NUM_SQUARES {
                    keys.pieces[side.index()][piece.index()][square] = rng.random();
                }
            }
        }

        for key in keys.castling.iter_mut() {
            *key = rng.random();
        }

        keys
    }

    #[inline(always)]
    pub fn piece(&self, side: Side, piece: Piece, sq: u8) -> u64 {
        self.pieces[side.index()][piece.index()][sq as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for side in Side::SIDES {
            for piece in Piece::PIECES {
                for sq in 0..NUM_SQUARES as u8 {
                    assert!(seen.insert(ZOBRIST.piece(side, piece, sq)));
                }
            }
        }
        assert!(seen.insert(ZOBRIST.black_to_move));
    }
}
