use tarot_common::board::Board;

use anyhow::Result;
use crossbeam_channel::{RecvTimeoutError, bounded, unbounded};
use log::debug;
use smallvec::SmallVec;

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::search::{OpenEntry, Outcome, SearchContext, SearchOptions, SearchReport};
use crate::solution::Solution;

const RESULT_POLL: Duration = Duration::from_millis(50);

type Expansion = Result<SmallVec<[Arc<Solution>; 16]>>;

/// Pipelined best-first search: the frontier stays on the coordinating
/// thread, which streams nodes through a bounded work channel to a pool of
/// expanders and folds their results back into the heap. A one-slot solved
/// channel short-circuits the pipeline as soon as any expander hits a
/// complete board.
pub fn solve_pipelined(board: Board, options: &SearchOptions) -> Result<SearchReport> {
    let started = Instant::now();
    let (context, root) = SearchContext::new(board, options)?;
    if root.is_done {
        return context.finish(Outcome::Solved(root), 0, started);
    }

    let workers = options.workers.max(1);
    let (work_tx, work_rx) = bounded::<Arc<Solution>>(workers);
    let (result_tx, result_rx) = unbounded::<Expansion>();
    let (solved_tx, solved_rx) = bounded::<Arc<Solution>>(1);

    thread::scope(|scope| -> Result<SearchReport> {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let solved_tx = solved_tx.clone();
            let context = &context;
            scope.spawn(move || {
                while let Ok(node) = work_rx.recv() {
                    let expansion = context.expand(&node);
                    if let Ok(children) = &expansion {
                        for child in children {
                            if child.is_done {
                                // Full slot means another worker already won.
                                let _ = solved_tx.try_send(child.clone());
                            }
                        }
                    }
                    if result_tx.send(expansion).is_err() {
                        return;
                    }
                }
            });
        }
        drop(result_tx);

        let mut frontier = BinaryHeap::from([OpenEntry(root)]);
        let mut pending = 0usize;
        let mut expanded = 0u64;
        let outcome = loop {
            if let Ok(goal) = solved_rx.try_recv() {
                debug!("pipeline solved, line length {}", goal.length);
                break Outcome::Solved(goal);
            }
            if options.cancel.is_cancelled() {
                break Outcome::Cancelled;
            }
            if context.over_budget(options) {
                break Outcome::BudgetReached;
            }
            while pending < workers {
                let Some(OpenEntry(node)) = frontier.pop() else {
                    break;
                };
                work_tx.send(node).expect("expander pool hung up");
                pending += 1;
                expanded += 1;
            }
            if pending == 0 && frontier.is_empty() {
                break Outcome::Exhausted;
            }
            match result_rx.recv_timeout(RESULT_POLL) {
                Ok(Ok(children)) => {
                    pending -= 1;
                    let mut goal = None;
                    for child in children {
                        if child.is_done {
                            goal = Some(child);
                            break;
                        }
                        frontier.push(OpenEntry(child));
                    }
                    if let Some(goal) = goal {
                        debug!("pipeline solved, line length {}", goal.length);
                        break Outcome::Solved(goal);
                    }
                }
                Ok(Err(err)) => return Err(err),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break Outcome::Exhausted,
            }
        };
        drop(work_tx);
        context.finish(outcome, expanded, started)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_common::action::replay;
    use tarot_common::board::{REFERENCE_DEAL, TOTAL_COLUMNS};
    use tarot_common::card::{Card, Suit};
    use tarot_common::tableau::Column;

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
        let report = solve_pipelined(board.clone(), &small_options()).unwrap();
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
        let report = solve_pipelined(board, &small_options()).unwrap();
        assert!(matches!(report.outcome, Outcome::Exhausted));
    }

    #[test]
    fn test_cancelled_before_start() {
        use crate::search::CancelToken;
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
        let report = solve_pipelined(board, &options).unwrap();
        assert!(matches!(report.outcome, Outcome::Cancelled));
    }

    #[test]
    fn test_budget_stops_search() {
        let board = Board::from_deal(REFERENCE_DEAL).unwrap();
        let options = SearchOptions {
            workers: 4,
            max_nodes: Some(5),
            ..Default::default()
        };
        let report = solve_pipelined(board, &options).unwrap();
        assert!(matches!(
            report.outcome,
            Outcome::BudgetReached | Outcome::Solved(_)
        ));
    }
}
