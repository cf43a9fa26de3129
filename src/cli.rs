use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::consts::START_FEN;

#[derive(Parser)]
#[command(version = env!("APP_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML file overriding the built-in search tunables
    #[arg(long, global = true)]
    pub tunables: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a position and print the best move
    Search {
        /// FEN string for the position
        #[arg(short, long, default_value = START_FEN)]
        fen: String,
        /// Fixed search depth; overrides the clock
        #[arg(short, long)]
        depth: Option<u16>,
        /// Fixed time for this move, in milliseconds
        #[arg(short, long)]
        movetime: Option<u64>,
        /// Remaining clock time, in milliseconds
        #[arg(short, long)]
        time: Option<u64>,
        /// Increment per move, in milliseconds
        #[arg(short, long, default_value = "0")]
        increment: u64,
        /// Transposition table size in MiB
        #[arg(long, default_value = "16")]
        hash: usize,
    },

    /// Count leaf nodes to a given depth, for move generator validation
    Perft {
        /// FEN string for the position
        #[arg(short, long, default_value = START_FEN)]
        fen: String,
        /// Leaf depth
        #[arg(short, long, default_value = "5")]
        depth: u8,
        /// Break the count down by root move
        #[arg(long)]
        divide: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_version_carries_the_package_version() {
        assert!(env!("APP_VERSION").starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn search_defaults_parse() {
        let cli = Cli::try_parse_from(["skewer", "search"]).unwrap();
        match cli.command {
            Commands::Search { fen, hash, increment, .. } => {
                assert_eq!(fen, START_FEN);
                assert_eq!(hash, 16);
                assert_eq!(increment, 0);
            }
            _ => panic!("expected the search subcommand"),
        }
    }
}
