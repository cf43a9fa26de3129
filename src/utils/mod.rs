pub mod log;
pub mod perft;
