use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use skewer::prelude::*;
use skewer::search::{MoveHistory, MoveOrderer, SearchStackEntry};

const POSITIONS: &[(&str, &str)] = &[
    (
        "Start",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "Kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ),
    (
        "Tactical",
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1",
    ),
    ("Endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

fn pseudo_legal(board: &Board) -> MoveList {
    let mut moves = MoveList::new();
    generate_moves(board, GenMode::All, &mut moves);
    moves
}

/// Cost of scoring a whole move list at orderer construction
fn bench_orderer_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderer_construction");

    let tt = TranspositionTable::new(1);
    let history = MoveHistory::new();
    let stack = [SearchStackEntry::default(); 8];

    for (name, fen) in POSITIONS {
        let board = Board::from_fen(fen).unwrap();
        let move_count = pseudo_legal(&board).len();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{name}_({move_count})_moves")),
            &board,
            |b, board| {
                b.iter_batched(
                    || pseudo_legal(board),
                    |moves| {
                        black_box(MoveOrderer::new(
                            board,
                            moves,
                            GenMode::All,
                            &tt,
                            &history,
                            &stack,
                            0,
                        ))
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Cost of draining the full list through the selection-sort picker,
/// the worst case a node with no cutoff pays
fn bench_full_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pick");

    let tt = TranspositionTable::new(1);
    let history = MoveHistory::new();
    let stack = [SearchStackEntry::default(); 8];

    for (name, fen) in POSITIONS {
        let board = Board::from_fen(fen).unwrap();
        let move_count = pseudo_legal(&board).len();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{name}_({move_count})_moves")),
            &board,
            |b, board| {
                b.iter_batched(
                    || {
                        MoveOrderer::new(
                            board,
                            pseudo_legal(board),
                            GenMode::All,
                            &tt,
                            &history,
                            &stack,
                            0,
                        )
                    },
                    |mut orderer| {
                        for idx in 0..orderer.len() {
                            black_box(orderer.get_move(idx));
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_orderer_construction, bench_full_pick);
criterion_main!(benches);
