//! The pieces shared by every driver: cancellation, options, the expansion
//! contract and the frontier ordering.

use tarot_common::board::Board;

use anyhow::Result;
use smallvec::SmallVec;

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use crate::codec;
use crate::dedup::VisitedStore;
use crate::solution::Solution;
use crate::tree::TreeWriter;

/// A cooperative stop signal, optionally armed with a deadline. Drivers
/// poll it once per frontier pop.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(AtomicOrdering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

pub struct SearchOptions {
    /// Move whole runs (false) or single cards only (true).
    pub single_card_moves: bool,
    /// Stop after accepting this many distinct states.
    pub max_nodes: Option<u64>,
    /// Worker count for the concurrent drivers.
    pub workers: usize,
    pub cancel: CancelToken,
    /// Disk journal for the visited set, shared across runs.
    pub seen_cache: Option<PathBuf>,
    /// Dump every accepted node to this file for offline inspection.
    pub dump: Option<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            single_card_moves: false,
            max_nodes: None,
            workers: 20,
            cancel: CancelToken::new(),
            seen_cache: None,
            dump: None,
        }
    }
}

/// How a search run ended.
pub enum Outcome {
    Solved(Arc<Solution>),
    /// The frontier drained with every reachable state visited.
    Exhausted,
    BudgetReached,
    Cancelled,
}

pub struct SearchReport {
    pub outcome: Outcome,
    /// Nodes popped from the frontier and expanded.
    pub expanded: u64,
    /// Distinct states accepted into the visited set.
    pub accepted: u64,
    pub elapsed: Duration,
}

/// State shared by all workers of one run: the visited set, the optional
/// dump writer and the acceptance counter the budget is checked against.
pub struct SearchContext {
    visited: VisitedStore,
    dump: Option<TreeWriter>,
    single_card: bool,
    accepted: AtomicU64,
}

impl SearchContext {
    /// Builds the context and seeds it with the starting board as root.
    pub fn new(board: Board, options: &SearchOptions) -> Result<(Self, Arc<Solution>)> {
        let visited = VisitedStore::open_optional(options.seen_cache.as_deref())?;
        let dump = match &options.dump {
            Some(path) => Some(TreeWriter::create(path)?),
            None => None,
        };
        let root_fingerprint = codec::fingerprint(&board);
        visited.insert(&root_fingerprint)?;
        let root = Solution::root(board);
        if let Some(writer) = &dump {
            writer.record(&root)?;
        }
        let context = Self {
            visited,
            dump,
            single_card: options.single_card_moves,
            accepted: AtomicU64::new(1),
        };
        Ok((context, root))
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(AtomicOrdering::Relaxed)
    }

    pub fn over_budget(&self, options: &SearchOptions) -> bool {
        match options.max_nodes {
            Some(budget) => self.accepted() >= budget,
            None => false,
        }
    }

    /// Applies every legal move to `parent` and returns the children whose
    /// normalized state has not been seen before.
    pub fn expand(&self, parent: &Arc<Solution>) -> Result<SmallVec<[Arc<Solution>; 16]>> {
        let mut children = SmallVec::new();
        for action in parent.board.legal_moves() {
            let board = parent.board.apply(action, self.single_card)?;
            let fingerprint = codec::fingerprint(&board);
            if !self.visited.insert(&fingerprint)? {
                continue;
            }
            self.accepted.fetch_add(1, AtomicOrdering::Relaxed);
            let child = Solution::step(parent, action, board, &fingerprint);
            if let Some(writer) = &self.dump {
                writer.record(&child)?;
            }
            children.push(child);
        }
        Ok(children)
    }

    pub fn finish(&self, outcome: Outcome, expanded: u64, started: Instant) -> Result<SearchReport> {
        self.visited.flush()?;
        if let Some(writer) = &self.dump {
            writer.flush()?;
        }
        Ok(SearchReport {
            outcome,
            expanded,
            accepted: self.accepted(),
            elapsed: started.elapsed(),
        })
    }
}

/// Frontier entry ordered so the lowest priority pops first from a
/// max-heap; length breaks ties toward shallower nodes.
pub struct OpenEntry(pub Arc<Solution>);

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority && self.0.length == other.0.length
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .priority
            .cmp(&self.0.priority)
            .then_with(|| other.0.length.cmp(&self.0.length))
    }
}
