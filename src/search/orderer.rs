use crate::{
    board::Board,
    consts::MAX_MOVES,
    evaluation::PIECE_VALUES,
    moves::{GenMode, Move, MoveList},
    search::{
        history::{MoveHistory, SearchStackEntry},
        tt::TranspositionTable,
    },
};

const CAPTURE_BASE: i32 = 1000;
/// Above any reachable history sum, below nothing else in the quiet class
const KILLER_BONUS: i32 = 25_000;

/// Yields moves in descending estimated quality. Every move is scored once
/// at construction; `get_move` then runs one step of a selection sort, so
/// an early beta cutoff never pays for ordering the rest of the list.
///
/// All inputs are consumed at construction, so the orderer can stay alive
/// across the make/undo cycles of the caller's move loop.
pub struct MoveOrderer {
    moves: MoveList,
    scores: [i32; MAX_MOVES],
    tt_move: Move,
}

impl MoveOrderer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        board: &Board,
        moves: MoveList,
        mode: GenMode,
        tt: &TranspositionTable,
        history: &MoveHistory,
        stack: &[SearchStackEntry],
        ply: usize,
    ) -> Self {
        let mut scores = [0i32; MAX_MOVES];
        let killers = history.killers(ply);
        for (i, &mv) in moves.iter().enumerate() {
            scores[i] = score_move(board, mv, &killers, history, stack, ply);
        }

        // A key-matched transposition entry is the hint for the first pick.
        // Under a captures-only filter the stored move must itself be a
        // capture to qualify.
        let entry = tt.probe(board.hash);
        let tt_move = if entry.matches(board.hash)
            && !entry.best_move.is_null()
            && (mode != GenMode::Captures || board.is_capture(entry.best_move))
        {
            entry.best_move
        } else {
            Move::NULL
        };

        Self {
            moves,
            scores,
            tt_move,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns the best remaining move, swapping it into `start`.
    ///
    /// At the very first pick the transposition hint short circuits the
    /// scored list: its move was already proven best in this position (or
    /// an equivalent transposition), so it is returned as-is, unscored.
    pub fn get_move(&mut self, start: usize) -> Move {
        if start == 0 && !self.tt_move.is_null() {
            return self.tt_move;
        }

        let mut best_idx = start;
        let mut best_score = self.scores[start];
        for i in (start + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_score = self.scores[i];
                best_idx = i;
            }
        }

        self.moves.swap(start, best_idx);
        self.scores.swap(start, best_idx);
        self.moves.get(start)
    }
}

/// Promotion value, plus MVV-LVA for moves landing on an enemy-occupied
/// square, plus killer/history signals for quiets. The capture test reads
/// the destination against the opposing occupancy; a miss there only
/// weakens ordering, never correctness.
fn score_move(
    board: &Board,
    mv: Move,
    killers: &[Move; 2],
    history: &MoveHistory,
    stack: &[SearchStackEntry],
    ply: usize,
) -> i32 {
    let side = board.stm;
    let mut score = 0;

    if let Some(promo) = mv.promotion() {
        score += PIECE_VALUES[promo.index()];
    }

    if board.is_capture(mv) {
        let victim = board.piece_at(mv.to_sq()).unwrap_or_default();
        score += CAPTURE_BASE + 10 * PIECE_VALUES[victim.index()]
            - PIECE_VALUES[mv.piece().index()];
    } else {
        if killers.contains(&mv) {
            score += KILLER_BONUS;
        }
        score += history.history_score(mv, side)
            + history.cont_history_score(mv, side, 1, stack, ply)
            + history.cont_history_score(mv, side, 2, stack, ply);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        board::components::{Piece, parse_square},
        consts::{MAX_PLY, START_FEN},
        moves::generate_moves,
        search::tt::{Entry, ScoreFlag},
    };

    fn ordered(
        board: &Board,
        mode: GenMode,
        tt: &TranspositionTable,
        history: &MoveHistory,
        ply: usize,
    ) -> (Vec<Move>, Vec<i32>) {
        let stack = [SearchStackEntry::default(); MAX_PLY];
        let mut list = MoveList::new();
        generate_moves(board, mode, &mut list);
        let mut orderer = MoveOrderer::new(board, list, mode, tt, history, &stack, ply);

        let mut moves = Vec::new();
        let mut scores = Vec::new();
        for i in 0..orderer.len() {
            moves.push(orderer.get_move(i));
            scores.push(orderer.scores[i]);
        }
        (moves, scores)
    }

    #[test]
    fn scores_are_non_increasing() {
        let board = Board::from_fen(crate::consts::KIWIPETE).unwrap();
        let tt = TranspositionTable::new(1);
        let history = MoveHistory::new();
        let (_, scores) = ordered(&board, GenMode::All, &tt, &history, 0);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn most_valuable_victim_comes_first() {
        // White pawn can take the queen on c6, white knight the pawn on h5
        let board = Board::from_fen("k7/8/2q5/3P3p/8/6N1/8/K7 w - - 0 1").unwrap();
        let tt = TranspositionTable::new(1);
        let history = MoveHistory::new();
        let (moves, _) = ordered(&board, GenMode::Captures, &tt, &history, 0);

        let pawn_takes_queen = Move::new(
            parse_square("d5").unwrap(),
            parse_square("c6").unwrap(),
            Piece::Pawn,
        );
        let knight_takes_pawn = Move::new(
            parse_square("g3").unwrap(),
            parse_square("h5").unwrap(),
            Piece::Knight,
        );
        let pq = moves.iter().position(|&m| m == pawn_takes_queen).unwrap();
        let np = moves.iter().position(|&m| m == knight_takes_pawn).unwrap();
        assert!(pq < np, "victim value must dominate the capture order");
    }

    #[test]
    fn tt_move_bypasses_scoring() {
        let board = Board::from_fen(START_FEN).unwrap();
        let tt = TranspositionTable::new(1);
        let history = MoveHistory::new();

        let hint = Move::new(
            parse_square("g1").unwrap(),
            parse_square("f3").unwrap(),
            Piece::Knight,
        );
        tt.save(&Entry::new(board.hash, 4, ScoreFlag::Exact, 30, hint), 0);

        let (moves, _) = ordered(&board, GenMode::All, &tt, &history, 0);
        assert_eq!(moves[0], hint);
    }

    #[test]
    fn quiet_tt_move_is_ignored_under_captures_filter() {
        let board = Board::from_fen("k7/8/2q5/3P3p/8/6N1/8/K7 w - - 0 1").unwrap();
        let tt = TranspositionTable::new(1);
        let history = MoveHistory::new();

        let quiet_hint = Move::new(
            parse_square("g3").unwrap(),
            parse_square("e4").unwrap(),
            Piece::Knight,
        );
        tt.save(&Entry::new(board.hash, 4, ScoreFlag::Exact, 0, quiet_hint), 0);

        let (moves, _) = ordered(&board, GenMode::Captures, &tt, &history, 0);
        assert_ne!(moves[0], quiet_hint);
        assert!(board.is_capture(moves[0]));
    }

    #[test]
    fn killer_outranks_untried_quiets() {
        let board = Board::from_fen(START_FEN).unwrap();
        let tt = TranspositionTable::new(1);
        let mut history = MoveHistory::new();

        // A quiet move that caused a cutoff at ply 4 in a sibling branch
        let killer = Move::new(
            parse_square("b1").unwrap(),
            parse_square("c3").unwrap(),
            Piece::Knight,
        );
        history.update_killer_move(killer, 4);
        assert!(history.killers(4).contains(&killer));

        let (moves, _) = ordered(&board, GenMode::All, &tt, &history, 4);
        assert_eq!(moves[0], killer);
        // At a different ply the killer confers nothing
        let (moves, _) = ordered(&board, GenMode::All, &tt, &history, 3);
        assert_ne!(moves[0], killer);
    }
}
