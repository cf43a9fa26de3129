use crate::{consts::MAX_MOVES, moves::move_info::Move};

/// Fixed-capacity move list, lives on the stack in the search hot path
#[derive(Clone, Debug)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveList {
    pub const fn new() -> Self {
        Self {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    #[inline(always)]
    pub const fn push(&mut self, m: Move) {
        debug_assert!(self.len < MAX_MOVES, "MoveList overflow");
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Move {
        self.moves[..self.len][idx]
    }

    #[inline(always)]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.moves[..self.len].swap(a, b);
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl FromIterator<Move> for MoveList {
    fn from_iter<T: IntoIterator<Item = Move>>(iter: T) -> Self {
        let mut list = Self::new();
        for mv in iter {
            list.push(mv);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::components::Piece;

    #[test]
    fn push_and_iterate() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        for to in 8..12 {
            list.push(Move::new(0, to, Piece::Rook));
        }
        assert_eq!(list.len(), 4);
        let tos: Vec<u8> = list.iter().map(|m| m.to_sq()).collect();
        assert_eq!(tos, vec![8, 9, 10, 11]);
    }

    #[test]
    fn swap_reorders() {
        let mut list = MoveList::new();
        list.push(Move::new(0, 1, Piece::King));
        list.push(Move::new(0, 2, Piece::King));
        list.swap(0, 1);
        assert_eq!(list.get(0).to_sq(), 2);
        assert_eq!(list.get(1).to_sq(), 1);
    }
}
