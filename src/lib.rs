pub mod board;
pub mod cli;
pub mod evaluation;
pub mod moves;
pub mod prelude;
pub mod search;
pub mod tuning;
pub mod utils;

pub mod consts {
    pub const NUM_SIDES: usize = 2;
    pub const NUM_PIECES: usize = 6;
    pub const NUM_SQUARES: usize = 64;
    pub const NUM_CASTLING_RIGHTS: usize = 16;
    pub const NUM_FILES: usize = 8;
    pub const NUM_RANKS: usize = 8;

    pub const MAX_PLY: usize = 64;
    pub const MAX_MOVES: usize = 256;
    pub const MAX_HASH_MB: usize = 1024;

    pub const MATE_SCORE: i32 = 20_000;
    pub const MATE_THRESHOLD: i32 = MATE_SCORE - MAX_PLY as i32;
    pub const STALEMATE_SCORE: i32 = 0;

    pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    pub const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
}
