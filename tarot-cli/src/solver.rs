mod utils;

use crate::utils::*;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tarot_common::board::{Board, REFERENCE_DEAL};
use tarot_solver::{CancelToken, SearchOptions};

use std::{
    io::{IsTerminal, Read, stdin},
    path::PathBuf,
    time::Duration,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Search driver to run
    #[arg(short = 'D', long, value_enum, default_value_t = Driver::Parallel)]
    driver: Driver,
    /// Max states to accept before giving up
    #[arg(short = 's', long, value_name = "NUM")]
    max_nodes: Option<u64>,
    /// Give up after this many seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Move single cards instead of whole runs
    #[arg(long)]
    single_card: bool,
    /// Worker threads for the concurrent drivers
    #[arg(short, long, default_value_t = 20, value_name = "NUM")]
    workers: usize,
    /// Dump every explored state to this file
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,
    /// Persist visited states here and skip them on later runs
    #[arg(long, value_name = "FILE")]
    seen_cache: Option<PathBuf>,
    /// Preview the initial game state without solving
    #[arg(short, long)]
    preview: bool,
    /// Path to a deal file to solve
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Driver {
    Sequential,
    Parallel,
    Pipelined,
}

fn main() -> Result<()> {
    env_logger::init();
    let Cli {
        driver,
        max_nodes,
        timeout,
        single_card,
        workers,
        dump,
        seen_cache,
        preview,
        file,
    } = Cli::parse();

    let board = if let Some(file) = file {
        let content = std::fs::read_to_string(file)?;
        Board::from_deal(&content).context("Failed to parse deal")?
    } else if !stdin().is_terminal() {
        let mut content = String::new();
        stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        Board::from_deal(&content).context("Failed to parse deal")?
    } else {
        Board::from_deal(REFERENCE_DEAL).context("Failed to parse the built-in deal")?
    };
    if !board.is_valid() {
        bail!("The deal does not account for all 74 cards.");
    }
    if preview {
        println!("{}", board.render());
        return Ok(());
    }
    let cancel = match timeout {
        Some(secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let options = SearchOptions {
        single_card_moves: single_card,
        max_nodes,
        workers,
        cancel,
        seen_cache,
        dump,
    };
    do_solve(board, driver, &options)
}
