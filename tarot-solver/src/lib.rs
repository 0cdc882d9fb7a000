//! Best-first search for the tarot patience game, with sequential,
//! worker-pool and pipelined drivers sharing one expansion contract.

pub mod codec;
pub mod dedup;
pub mod heuristics;
mod parallel;
mod pipeline;
mod search;
mod sequential;
pub mod solution;
pub mod tree;

pub use crate::parallel::solve_parallel;
pub use crate::pipeline::solve_pipelined;
pub use crate::search::{CancelToken, Outcome, SearchOptions, SearchReport};
pub use crate::sequential::solve_sequential;
pub use crate::solution::Solution;
