use std::fmt::Display;

use crate::board::components::{Piece, square_name};

const SQUARE_MASK: u32 = 0b111111;
const PIECE_MASK: u32 = 0b111;
const PROMO_MASK: u32 = 0b111;

/// A move packed into a single u32:
/// bits 0-5 from square, 6-11 to square, 12-14 moved piece (1-based,
/// 0 = none), 15-17 promotion piece (1-based, 0 = none).
///
/// Equality is by raw value; the encoding is immutable once built.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    pub const NULL: Move = Move(0);

    pub const fn new(from: u8, to: u8, piece: Piece) -> Self {
        Self(
            (from as u32 & SQUARE_MASK)
                | ((to as u32 & SQUARE_MASK) << 6)
                | (((piece as u32 + 1) & PIECE_MASK) << 12),
        )
    }

    pub const fn new_promotion(from: u8, to: u8, piece: Piece, promotion: Piece) -> Self {
        let base = Self::new(from, to, piece);
        Self(base.0 | (((promotion as u32 + 1) & PROMO_MASK) << 15))
    }

    #[inline(always)]
    pub const fn from_sq(self) -> u8 {
        (self.0 & SQUARE_MASK) as u8
    }

    #[inline(always)]
    pub const fn to_sq(self) -> u8 {
        ((self.0 >> 6) & SQUARE_MASK) as u8
    }

    #[inline(always)]
    pub const fn piece(self) -> Piece {
        debug_assert!(!self.is_null());
        Piece::PIECES[((self.0 >> 12) & PIECE_MASK) as usize - 1]
    }

    #[inline(always)]
    pub const fn promotion(self) -> Option<Piece> {
        let bits = (self.0 >> 15) & PROMO_MASK;
        if bits == 0 {
            None
        } else {
            Some(Piece::PIECES[bits as usize - 1])
        }
    }

    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw encoding, used for truncated-hash addressing
    #[inline(always)]
    pub const fn data(self) -> u32 {
        self.0
    }

    /// Rebuilds a move from its raw encoding (transposition table storage)
    #[inline(always)]
    pub const fn from_data(data: u32) -> Self {
        Self(data)
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", square_name(self.from_sq()), square_name(self.to_sq()))?;
        if let Some(promo) = self.promotion() {
            write!(f, "{}", promo.to_char(crate::board::components::Side::Black))?;
        }
        Ok(())
    }
}
