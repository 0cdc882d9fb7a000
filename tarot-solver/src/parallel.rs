use tarot_common::board::Board;

use anyhow::Result;
use log::debug;

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::search::{OpenEntry, Outcome, SearchContext, SearchOptions, SearchReport};
use crate::solution::Solution;

const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Worker-pool best-first search: a fixed pool of threads pops from one
/// shared frontier. An outstanding-expansion counter tells an idle worker
/// whether the empty frontier means exhaustion or just a momentary lull.
pub fn solve_parallel(board: Board, options: &SearchOptions) -> Result<SearchReport> {
    let started = Instant::now();
    let (context, root) = SearchContext::new(board, options)?;
    if root.is_done {
        return context.finish(Outcome::Solved(root), 0, started);
    }

    let frontier = Mutex::new(BinaryHeap::from([OpenEntry(root)]));
    let stop = AtomicBool::new(false);
    let found: Mutex<Option<std::sync::Arc<Solution>>> = Mutex::new(None);
    let outstanding = AtomicUsize::new(0);
    let expanded = AtomicU64::new(0);
    let workers = options.workers.max(1);

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(|| -> Result<()> {
                loop {
                    if stop.load(Ordering::Acquire) {
                        return Ok(());
                    }
                    if options.cancel.is_cancelled() || context.over_budget(options) {
                        stop.store(true, Ordering::Release);
                        return Ok(());
                    }
                    let entry = {
                        let mut frontier = frontier.lock().expect("frontier poisoned");
                        let entry = frontier.pop();
                        match &entry {
                            Some(_) => {
                                outstanding.fetch_add(1, Ordering::AcqRel);
                            }
                            None => {
                                // Checked while still holding the lock:
                                // children are pushed before `outstanding`
                                // drops, so empty-plus-zero here means no
                                // expansion can refill the frontier.
                                if outstanding.load(Ordering::Acquire) == 0 {
                                    stop.store(true, Ordering::Release);
                                    return Ok(());
                                }
                            }
                        }
                        entry
                    };
                    let Some(OpenEntry(node)) = entry else {
                        thread::sleep(IDLE_BACKOFF);
                        continue;
                    };
                    expanded.fetch_add(1, Ordering::Relaxed);
                    let children = context.expand(&node);
                    let children = match children {
                        Ok(children) => children,
                        Err(err) => {
                            outstanding.fetch_sub(1, Ordering::AcqRel);
                            stop.store(true, Ordering::Release);
                            return Err(err);
                        }
                    };
                    let mut done = None;
                    for child in &children {
                        if child.is_done {
                            done = Some(child.clone());
                            break;
                        }
                    }
                    if let Some(goal) = done {
                        debug!("worker found a line of length {}", goal.length);
                        let mut found = found.lock().expect("result slot poisoned");
                        let better = found
                            .as_ref()
                            .is_none_or(|held| goal.length < held.length);
                        if better {
                            *found = Some(goal);
                        }
                        stop.store(true, Ordering::Release);
                        outstanding.fetch_sub(1, Ordering::AcqRel);
                        return Ok(());
                    }
                    {
                        let mut frontier = frontier.lock().expect("frontier poisoned");
                        for child in children {
                            frontier.push(OpenEntry(child));
                        }
                    }
                    outstanding.fetch_sub(1, Ordering::AcqRel);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked")?;
        }
        Ok(())
    })?;

    let solved = found.lock().expect("result slot poisoned").take();
    let expanded = expanded.load(Ordering::Relaxed);
    let outcome = if let Some(goal) = solved {
        Outcome::Solved(goal)
    } else if options.cancel.is_cancelled() {
        Outcome::Cancelled
    } else if context.over_budget(options) {
        Outcome::BudgetReached
    } else {
        Outcome::Exhausted
    };
    context.finish(outcome, expanded, started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_common::action::replay;
    use tarot_common::board::TOTAL_COLUMNS;
    use tarot_common::card::{Card, Suit};
    use tarot_common::tableau::Column;

    use crate::search::CancelToken;

    fn small_options() -> SearchOptions {
        SearchOptions {
            workers: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_solves_one_move_puzzle() {
        let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
        columns[0].push_card(Card::Major(21));
        columns[0].push_card(Card::Major(20));
        let board = Board::from_columns(columns);
        let report = solve_parallel(board.clone(), &small_options()).unwrap();
        let Outcome::Solved(goal) = report.outcome else {
            panic!("expected a solved outcome");
        };
        let replayed = replay(&board, &goal.actions(), false).unwrap();
        assert!(replayed.is_complete());
    }

    #[test]
    fn test_exhausts_dead_end() {
        let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
        columns[0].push_card(Card::Minor(Suit::Swords, 9));
        let board = Board::with_parts(
            Default::default(),
            Default::default(),
            Some(Card::Major(10)),
            columns,
        );
        let report = solve_parallel(board, &small_options()).unwrap();
        assert!(matches!(report.outcome, Outcome::Exhausted));
    }

    #[test]
    fn test_solvable_board_never_exhausts_under_contention() {
        // Needs two real moves (store the 20, then shift the 18 aside),
        // so workers race over a frontier that repeatedly runs dry while
        // expansions are still in flight. Any Exhausted here means an
        // idle worker misread an in-flight expansion as a drained space.
        for _ in 0..200 {
            let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
            columns[0].push_card(Card::Major(21));
            columns[0].push_card(Card::Major(20));
            columns[1].push_card(Card::Major(19));
            columns[1].push_card(Card::Major(18));
            let board = Board::from_columns(columns);
            let options = SearchOptions {
                workers: 8,
                ..Default::default()
            };
            let report = solve_parallel(board.clone(), &options).unwrap();
            let Outcome::Solved(goal) = report.outcome else {
                panic!("solvable board reported unsolvable");
            };
            let replayed = replay(&board, &goal.actions(), false).unwrap();
            assert!(replayed.is_complete());
        }
    }

    #[test]
    fn test_budget_stops_search() {
        use tarot_common::board::REFERENCE_DEAL;
        let board = Board::from_deal(REFERENCE_DEAL).unwrap();
        let options = SearchOptions {
            workers: 4,
            max_nodes: Some(5),
            ..Default::default()
        };
        let report = solve_parallel(board, &options).unwrap();
        assert!(matches!(report.outcome, Outcome::BudgetReached));
        assert!(report.accepted >= 5);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = SearchOptions {
            workers: 4,
            cancel,
            ..Default::default()
        };
        let board = Board::with_parts(
            Default::default(),
            Default::default(),
            Some(Card::Major(10)),
            Default::default(),
        );
        let report = solve_parallel(board, &options).unwrap();
        assert!(matches!(report.outcome, Outcome::Cancelled));
    }
}
