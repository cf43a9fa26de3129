use std::sync::LazyLock;

use crate::{
    board::{
        Board,
        components::{BitBoard, CastlingRights, Piece, Side, file_of, rank_of},
    },
    moves::{move_info::Move, move_list::MoveList},
};

/// Which class of moves to generate. An explicit tag, checked at
/// generation/scoring time, rather than separate generator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenMode {
    All,
    Captures,
}

const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_DELTAS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub struct AttackTables {
    pub knight: [BitBoard; 64],
    pub king: [BitBoard; 64],
    /// Squares a pawn of the given side attacks from each square
    pub pawn: [[BitBoard; 64]; 2],
}

pub static ATTACKS: LazyLock<AttackTables> = LazyLock::new(|| {
    let mut knight = [BitBoard::EMPTY; 64];
    let mut king = [BitBoard::EMPTY; 64];
    let mut pawn = [[BitBoard::EMPTY; 64]; 2];

    for sq in 0..64u8 {
        for (df, dr) in KNIGHT_DELTAS {
            if let Some(to) = offset(sq, df, dr) {
                knight[sq as usize].set(to);
            }
        }
        for (df, dr) in KING_DELTAS {
            if let Some(to) = offset(sq, df, dr) {
                king[sq as usize].set(to);
            }
        }
        for df in [-1i8, 1] {
            if let Some(to) = offset(sq, df, 1) {
                pawn[Side::White.index()][sq as usize].set(to);
            }
            if let Some(to) = offset(sq, df, -1) {
                pawn[Side::Black.index()][sq as usize].set(to);
            }
        }
    }

    AttackTables { knight, king, pawn }
});

#[inline]
fn offset(sq: u8, df: i8, dr: i8) -> Option<u8> {
    let file = file_of(sq) as i8 + df;
    let rank = rank_of(sq) as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some((rank * 8 + file) as u8)
    } else {
        None
    }
}

/// Sliding attacks by ray walk, stopping at the first blocker (inclusive)
fn slider_attacks(sq: u8, occupied: BitBoard, dirs: &[(i8, i8)]) -> BitBoard {
    let mut attacks = BitBoard::EMPTY;
    for &(df, dr) in dirs {
        let mut current = sq;
        while let Some(to) = offset(current, df, dr) {
            attacks.set(to);
            if occupied.is_set(to) {
                break;
            }
            current = to;
        }
    }
    attacks
}

/// Is `sq` attacked by any piece of side `by`?
pub fn is_square_attacked(board: &Board, sq: u8, by: Side) -> bool {
    let tables = &*ATTACKS;
    let occupied = board.occupied();

    // Pawn attacks are looked up from the defender's perspective
    if (tables.pawn[by.flip().index()][sq as usize] & board.piece_bb(by, Piece::Pawn)).any() {
        return true;
    }
    if (tables.knight[sq as usize] & board.piece_bb(by, Piece::Knight)).any() {
        return true;
    }
    if (tables.king[sq as usize] & board.piece_bb(by, Piece::King)).any() {
        return true;
    }

    let diagonal = board.piece_bb(by, Piece::Bishop) | board.piece_bb(by, Piece::Queen);
    if (slider_attacks(sq, occupied, &BISHOP_DIRS) & diagonal).any() {
        return true;
    }
    let straight = board.piece_bb(by, Piece::Rook) | board.piece_bb(by, Piece::Queen);
    (slider_attacks(sq, occupied, &ROOK_DIRS) & straight).any()
}

/// Generates pseudo-legal moves for the side to move. Moves that would leave
/// the mover's own king attacked are rejected later by `Board::make_move`.
pub fn generate_moves(board: &Board, mode: GenMode, list: &mut MoveList) {
    let us = board.stm;
    let them = us.flip();
    let own = board.side_bb(us);
    let enemy = board.side_bb(them);
    let occupied = own | enemy;

    generate_pawn_moves(board, mode, list, us, enemy, occupied);

    for from in board.piece_bb(us, Piece::Knight) {
        push_targets(list, from, Piece::Knight, ATTACKS.knight[from as usize], own, enemy, mode);
    }
    for from in board.piece_bb(us, Piece::Bishop) {
        let attacks = slider_attacks(from, occupied, &BISHOP_DIRS);
        push_targets(list, from, Piece::Bishop, attacks, own, enemy, mode);
    }
    for from in board.piece_bb(us, Piece::Rook) {
        let attacks = slider_attacks(from, occupied, &ROOK_DIRS);
        push_targets(list, from, Piece::Rook, attacks, own, enemy, mode);
    }
    for from in board.piece_bb(us, Piece::Queen) {
        let attacks =
            slider_attacks(from, occupied, &BISHOP_DIRS) | slider_attacks(from, occupied, &ROOK_DIRS);
        push_targets(list, from, Piece::Queen, attacks, own, enemy, mode);
    }
    for from in board.piece_bb(us, Piece::King) {
        push_targets(list, from, Piece::King, ATTACKS.king[from as usize], own, enemy, mode);
    }

    if mode == GenMode::All {
        generate_castling_moves(board, list, us, occupied);
    }
}

#[inline]
fn push_targets(
    list: &mut MoveList,
    from: u8,
    piece: Piece,
    attacks: BitBoard,
    own: BitBoard,
    enemy: BitBoard,
    mode: GenMode,
) {
    let targets = match mode {
        GenMode::All => attacks & !own,
        GenMode::Captures => attacks & enemy,
    };
    for to in targets {
        list.push(Move::new(from, to, piece));
    }
}

fn generate_pawn_moves(
    board: &Board,
    mode: GenMode,
    list: &mut MoveList,
    us: Side,
    enemy: BitBoard,
    occupied: BitBoard,
) {
    let (push_dir, start_rank, promo_rank): (i8, u8, u8) = match us {
        Side::White => (1, 1, 7),
        Side::Black => (-1, 6, 0),
    };

    for from in board.piece_bb(us, Piece::Pawn) {
        // Captures
        for to in ATTACKS.pawn[us.index()][from as usize] & enemy {
            push_pawn_move(list, from, to, promo_rank);
        }

        if let Some(to) = offset(from, 0, push_dir)
            && !occupied.is_set(to)
        {
            // Quiet promotions are forcing enough to belong in the
            // captures-only set as well
            if rank_of(to) == promo_rank || mode == GenMode::All {
                push_pawn_move(list, from, to, promo_rank);
            }
            if mode == GenMode::All
                && rank_of(from) == start_rank
                && let Some(double) = offset(to, 0, push_dir)
                && !occupied.is_set(double)
            {
                list.push(Move::new(from, double, Piece::Pawn));
            }
        }
    }
}

#[inline]
fn push_pawn_move(list: &mut MoveList, from: u8, to: u8, promo_rank: u8) {
    if rank_of(to) == promo_rank {
        for promo in [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight] {
            list.push(Move::new_promotion(from, to, Piece::Pawn, promo));
        }
    } else {
        list.push(Move::new(from, to, Piece::Pawn));
    }
}

fn generate_castling_moves(board: &Board, list: &mut MoveList, us: Side, occupied: BitBoard) {
    let (king_sq, rank_base) = match us {
        Side::White => (4u8, 0u8),
        Side::Black => (60u8, 56u8),
    };
    if !board.piece_bb(us, Piece::King).is_set(king_sq) {
        return;
    }
    let them = us.flip();

    if board.castling.has(CastlingRights::kingside(us))
        && !occupied.is_set(rank_base + 5)
        && !occupied.is_set(rank_base + 6)
        && !is_square_attacked(board, king_sq, them)
        && !is_square_attacked(board, rank_base + 5, them)
    {
        list.push(Move::new(king_sq, rank_base + 6, Piece::King));
    }

    if board.castling.has(CastlingRights::queenside(us))
        && !occupied.is_set(rank_base + 1)
        && !occupied.is_set(rank_base + 2)
        && !occupied.is_set(rank_base + 3)
        && !is_square_attacked(board, king_sq, them)
        && !is_square_attacked(board, rank_base + 3, them)
    {
        list.push(Move::new(king_sq, rank_base + 2, Piece::King));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::START_FEN;

    #[test]
    fn start_position_has_twenty_moves() {
        let board = Board::from_fen(START_FEN).unwrap();
        let mut list = MoveList::new();
        generate_moves(&board, GenMode::All, &mut list);
        assert_eq!(list.len(), 20);
    }

    #[test]
    fn start_position_has_no_captures() {
        let board = Board::from_fen(START_FEN).unwrap();
        let mut list = MoveList::new();
        generate_moves(&board, GenMode::Captures, &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn captures_mode_is_subset_of_all() {
        let board = Board::from_fen(crate::consts::KIWIPETE).unwrap();
        let mut all = MoveList::new();
        let mut captures = MoveList::new();
        generate_moves(&board, GenMode::All, &mut all);
        generate_moves(&board, GenMode::Captures, &mut captures);
        assert!(!captures.is_empty());
        for mv in &captures {
            assert!(all.contains(*mv));
        }
    }

    #[test]
    fn promotions_are_generated_in_captures_mode() {
        let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut captures = MoveList::new();
        generate_moves(&board, GenMode::Captures, &mut captures);
        let promos: Vec<_> = captures
            .iter()
            .filter(|m| m.promotion().is_some())
            .collect();
        assert_eq!(promos.len(), 4);
    }

    #[test]
    fn castling_requires_empty_path() {
        let board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut list = MoveList::new();
        generate_moves(&board, GenMode::All, &mut list);
        assert!(list.contains(Move::new(4, 6, Piece::King)));
        assert!(list.contains(Move::new(4, 2, Piece::King)));

        let blocked = Board::from_fen("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1").unwrap();
        let mut list = MoveList::new();
        generate_moves(&blocked, GenMode::All, &mut list);
        assert!(!list.contains(Move::new(4, 6, Piece::King)));
        assert!(!list.contains(Move::new(4, 2, Piece::King)));
    }

    #[test]
    fn attacked_square_detection() {
        let board = Board::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        // Rook on e2 attacks the e-file and second rank
        assert!(is_square_attacked(&board, 4, Side::Black));
        assert!(is_square_attacked(&board, 8, Side::Black));
        assert!(!is_square_attacked(&board, 0, Side::Black));
    }
}
