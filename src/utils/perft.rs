use std::time::Instant;

use tracing::info;

use crate::{
    board::Board,
    moves::{GenMode, MoveList, generate_moves},
};

/// Counts leaf nodes of the legal move tree to the given depth
pub fn perft(board: &mut Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    generate_moves(board, GenMode::All, &mut list);

    let mut nodes = 0;
    for &mv in &list {
        if !board.make_move(mv) {
            continue;
        }
        nodes += perft(board, depth - 1);
        board.undo_move();
    }
    nodes
}

/// Per-root-move breakdown, the usual debugging aid for generator bugs
pub fn perft_divide(board: &mut Board, depth: u8) -> u64 {
    let start = Instant::now();
    let mut list = MoveList::new();
    generate_moves(board, GenMode::All, &mut list);

    let mut total = 0;
    for &mv in &list {
        if !board.make_move(mv) {
            continue;
        }
        let nodes = if depth > 1 { perft(board, depth - 1) } else { 1 };
        board.undo_move();
        println!("{mv}: {nodes}");
        total += nodes;
    }

    let elapsed = start.elapsed();
    info!("perft({depth}) = {total} in {elapsed:?}");
    println!("total: {total}");
    total
}
