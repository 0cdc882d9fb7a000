use tarot_common::board::Board;

use anyhow::Result;
use log::debug;

use std::collections::BinaryHeap;
use std::time::Instant;

use crate::search::{OpenEntry, Outcome, SearchContext, SearchOptions, SearchReport};

/// Single-threaded best-first search: pop the most promising board, expand
/// it, push the unseen children, until a complete board appears or the
/// frontier drains.
pub fn solve_sequential(board: Board, options: &SearchOptions) -> Result<SearchReport> {
    let started = Instant::now();
    let (context, root) = SearchContext::new(board, options)?;
    if root.is_done {
        return context.finish(Outcome::Solved(root), 0, started);
    }

    let mut frontier = BinaryHeap::new();
    frontier.push(OpenEntry(root));
    let mut expanded = 0u64;

    while let Some(OpenEntry(node)) = frontier.pop() {
        if options.cancel.is_cancelled() {
            return context.finish(Outcome::Cancelled, expanded, started);
        }
        if context.over_budget(options) {
            return context.finish(Outcome::BudgetReached, expanded, started);
        }
        expanded += 1;
        for child in context.expand(&node)? {
            if child.is_done {
                debug!(
                    "solved after expanding {expanded} nodes, line length {}",
                    child.length
                );
                return context.finish(Outcome::Solved(child), expanded, started);
            }
            frontier.push(OpenEntry(child));
        }
    }
    context.finish(Outcome::Exhausted, expanded, started)
}
