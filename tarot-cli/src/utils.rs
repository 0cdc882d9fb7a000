use anyhow::{Result, bail};
use tarot_common::{action::format_actions, board::Board};
use tarot_solver::{
    Outcome, SearchOptions, SearchReport, solve_parallel, solve_pipelined, solve_sequential,
};

use std::{
    io::{IsTerminal, Write, stderr},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::Driver;

pub fn do_solve(board: Board, driver: Driver, options: &SearchOptions) -> Result<()> {
    println!("{}\n", board.render());
    let SearchReport {
        outcome,
        expanded,
        accepted,
        elapsed,
    } = with_spinner("Solving the game...", move || match driver {
        Driver::Sequential => solve_sequential(board, options),
        Driver::Parallel => solve_parallel(board, options),
        Driver::Pipelined => solve_pipelined(board, options),
    })?;
    let elapsed_str = format_elapsed(elapsed);
    match outcome {
        Outcome::Solved(goal) => {
            let actions = goal.actions();
            println!(
                "✓ Solved in {} Moves — Time: {elapsed_str}, States: {accepted}, Expanded: {expanded}\n",
                actions.len()
            );
            println!("{}", format_actions(&actions));
            Ok(())
        }
        Outcome::Exhausted => {
            bail!("No solution exists — explored all {accepted} reachable states in {elapsed_str}.")
        }
        Outcome::BudgetReached => {
            bail!("Gave up after {accepted} states in {elapsed_str}; raise --max-nodes to search deeper.")
        }
        Outcome::Cancelled => {
            bail!("Timed out after {elapsed_str} with {accepted} states explored.")
        }
    }
}

fn with_spinner<T, F: FnOnce() -> T>(message: &str, f: F) -> T {
    if stderr().is_terminal() {
        let spinning = Arc::new(AtomicBool::new(true));
        let spinning_clone = Arc::clone(&spinning);
        let message = message.to_string();

        let handle = std::thread::spawn(move || {
            let spinner_chars = ['|', '/', '-', '\\'];
            let mut i = 0;
            let stderr = stderr();
            let mut handle = stderr.lock();

            let _ = write!(handle, "\x1b[?25l"); // hide cursor
            let _ = handle.flush();

            while spinning_clone.load(Ordering::Relaxed) {
                let spinner_char = spinner_chars[i % spinner_chars.len()];
                let _ = write!(handle, "\r{spinner_char} {message}",);
                let _ = handle.flush();
                std::thread::sleep(Duration::from_millis(100));
                i += 1;
            }

            let _ = write!(handle, "\r\x1b[2K\r\x1b[?25h"); // clear line and show cursor
            let _ = handle.flush();
        });

        let result = f();
        spinning.store(false, Ordering::Relaxed);
        let _ = handle.join();
        result
    } else {
        f()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}
