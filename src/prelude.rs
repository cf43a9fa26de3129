pub use crate::board::{
    self, Board,
    components::{BitBoard, CastlingRights, Piece, Side, square_name},
    fen,
    zobrist::ZOBRIST,
};
pub use crate::consts::*;
pub use crate::evaluation::{self, Evaluator, MaterialEvaluator, PIECE_VALUES};
pub use crate::moves::{
    self,
    move_gen::{GenMode, generate_moves},
    move_info::Move,
    move_list::MoveList,
};
pub use crate::search::{
    self, SearchResult, Searcher,
    time::{TimeConfig, TimeManagement},
    tt::TranspositionTable,
};
pub use crate::tuning::Tunables;
pub use crate::utils::{self, log::*, perft::*};
pub use miette::{self, Context, IntoDiagnostic, Result};
pub use std::fmt::Display;
pub use std::str::FromStr;
pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
