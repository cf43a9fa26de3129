use miette::{Context, miette};

use crate::board::{
    Board,
    components::{CastlingRights, Piece, Side},
    zobrist::ZOBRIST,
};

/// Parses a FEN string. The en-passant field is accepted but ignored;
/// this board carries no en-passant state.
pub fn parse(fen: &str) -> miette::Result<Board> {
    let mut parts = fen.split_whitespace();
    let placement = parts.next().ok_or_else(|| miette!("empty FEN"))?;
    let stm = parts.next().unwrap_or("w");
    let castling = parts.next().unwrap_or("-");
    let _en_passant = parts.next();
    let halfmove = parts.next().unwrap_or("0");
    let fullmove = parts.next().unwrap_or("1");

    let mut board = Board::empty();

    let ranks: Vec<&str> = placement.split('/').collect();
    miette::ensure!(ranks.len() == 8, "FEN placement must have 8 ranks: {placement}");

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
            } else {
                let (side, piece) = Piece::from_char(c)
                    .ok_or_else(|| miette!("bad piece char '{c}' in FEN: {placement}"))?;
                miette::ensure!(file < 8, "rank overflow in FEN: {rank_str}");
                board.put_piece(side, piece, rank * 8 + file);
                file += 1;
            }
        }
        miette::ensure!(file == 8, "rank {rank_str} does not span 8 files");
    }

    board.stm = match stm {
        "w" => Side::White,
        "b" => Side::Black,
        other => return Err(miette!("bad side to move: {other}")),
    };
    if board.stm == Side::Black {
        board.hash ^= ZOBRIST.black_to_move;
    }

    let mut rights = CastlingRights(0);
    if castling != "-" {
        for c in castling.chars() {
            match c {
                'K' => rights.0 |= CastlingRights::WHITE_KINGSIDE,
                'Q' => rights.0 |= CastlingRights::WHITE_QUEENSIDE,
                'k' => rights.0 |= CastlingRights::BLACK_KINGSIDE,
                'q' => rights.0 |= CastlingRights::BLACK_QUEENSIDE,
                other => return Err(miette!("bad castling char: {other}")),
            }
        }
    }
    board.castling = rights;
    board.hash ^= ZOBRIST.castling[rights.0 as usize];

    board.halfmove_clock = halfmove
        .parse()
        .map_err(|_| miette!("bad halfmove clock: {halfmove}"))
        .context("parsing FEN counters")?;
    board.fullmove_number = fullmove
        .parse()
        .map_err(|_| miette!("bad fullmove number: {fullmove}"))?;

    Ok(board)
}

pub fn render(board: &Board) -> String {
    let mut out = String::with_capacity(80);
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            let sq = rank * 8 + file;
            match (board.piece_at(sq), board.side_at(sq)) {
                (Some(piece), Some(side)) => {
                    if empty > 0 {
                        out.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    out.push(piece.to_char(side));
                }
                _ => empty += 1,
            }
        }
        if empty > 0 {
            out.push((b'0' + empty) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }
    format!(
        "{out} {} {} - {} {}",
        board.stm, board.castling, board.halfmove_clock, board.fullmove_number
    )
}

/// Recomputes the position key from scratch; the incremental keys kept by
/// `make_move` must always agree with this
pub fn calculate_hash(board: &Board) -> (u64, u64) {
    let mut hash = 0u64;
    let mut pawn_hash = 0u64;

    for side in Side::SIDES {
        for piece in Piece::PIECES {
            for sq in board.piece_bb(side, piece) {
                let key = ZOBRIST.piece(side, piece, sq);
                hash ^= key;
                if piece == Piece::Pawn {
                    pawn_hash ^= key;
                }
            }
        }
    }

    hash ^= ZOBRIST.castling[board.castling.0 as usize];
    if board.stm == Side::Black {
        hash ^= ZOBRIST.black_to_move;
    }

    (hash, pawn_hash)
}
