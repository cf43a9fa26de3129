use std::sync::Arc;

use clap::Parser;
use tracing::{Level, span, trace};

use skewer::cli::{Cli, Commands};
use skewer::prelude::*;
use skewer::search::SearchConfig;

fn main() -> miette::Result<()> {
    utils::log::init();

    let span = span!(Level::DEBUG, "main");
    let _guard = span.enter();

    let cli = Cli::parse();
    let tunables = match &cli.tunables {
        Some(path) => Arc::new(Tunables::load(path)?),
        None => Arc::new(Tunables::default()),
    };

    match cli.command {
        Commands::Search {
            fen,
            depth,
            movetime,
            time,
            increment,
            hash,
        } => {
            trace!("Searching fen: {fen:?}, depth: {depth:?}, movetime: {movetime:?}");
            let mut board = Board::from_fen(&fen)?;
            println!("{board}");

            let mut searcher =
                Searcher::with_tunables(Box::new(MaterialEvaluator), tunables).with_config(
                    SearchConfig {
                        hash_size_mb: hash,
                        ..Default::default()
                    },
                )?;

            let config = match (depth, movetime, time) {
                (Some(d), _, _) => TimeConfig::depth(d),
                (_, Some(ms), _) => TimeConfig::move_time(ms),
                (_, _, Some(left)) => TimeConfig {
                    time_left: left,
                    increment,
                    ..Default::default()
                },
                _ => TimeConfig::depth(8),
            };

            let result = searcher.go(&mut board, config);
            match result.best_move {
                Some(mv) => println!("bestmove {mv}"),
                None => println!("bestmove (none)"),
            }
        }
        Commands::Perft { fen, depth, divide } => {
            trace!("Running perft with fen: {fen:?}, depth: {depth}, divide: {divide}");
            let mut board = Board::from_fen(&fen)?;
            println!("{board}");
            if divide {
                perft_divide(&mut board, depth);
            } else {
                let nodes = perft(&mut board, depth);
                println!("perft({depth}) = {nodes}");
            }
        }
    }
    Ok(())
}
