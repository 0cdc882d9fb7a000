//! Search nodes. Each node owns its board and points back at its parent,
//! so the winning line is recovered by walking the chain to the root.

use tarot_common::action::Action;
use tarot_common::board::Board;

use crate::codec;
use crate::heuristics;

use std::sync::Arc;

/// A board reached by the search, linked to the move that produced it.
pub struct Solution {
    pub board: Board,
    prev: Option<(Arc<Solution>, Action)>,
    pub length: u32,
    pub priority: u32,
    pub is_done: bool,
    pub id: u128,
}

impl Solution {
    /// Wraps the starting board as the root node.
    pub fn root(board: Board) -> Arc<Self> {
        let fingerprint = codec::fingerprint(&board);
        let priority = heuristics::combined_priority(&board);
        let is_done = board.is_complete();
        Arc::new(Self {
            board,
            prev: None,
            length: 0,
            priority,
            is_done,
            id: codec::node_id(&fingerprint),
        })
    }

    /// Wraps a board reached from `parent` by playing `action`.
    pub fn step(parent: &Arc<Self>, action: Action, board: Board, fingerprint: &[u8]) -> Arc<Self> {
        let priority = heuristics::combined_priority(&board);
        let is_done = board.is_complete();
        Arc::new(Self {
            board,
            prev: Some((parent.clone(), action)),
            length: parent.length + 1,
            priority,
            is_done,
            id: codec::node_id(fingerprint),
        })
    }

    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.prev.as_ref().map(|(parent, _)| parent)
    }

    pub fn action(&self) -> Option<Action> {
        self.prev.as_ref().map(|(_, action)| *action)
    }

    /// The moves from the root to this node, in play order.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.length as usize);
        let mut node = self;
        while let Some((parent, action)) = &node.prev {
            actions.push(*action);
            node = parent;
        }
        actions.reverse();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_common::board::{REFERENCE_DEAL, TOTAL_COLUMNS};
    use tarot_common::tableau::Column;

    #[test]
    fn test_root_node() {
        let board = Board::from_deal(REFERENCE_DEAL).unwrap();
        let root = Solution::root(board.clone());
        assert_eq!(root.length, 0);
        assert!(root.parent().is_none());
        assert!(root.actions().is_empty());
        assert!(!root.is_done);
        assert_eq!(root.priority, heuristics::combined_priority(&board));
        assert_ne!(root.id, 0);
    }

    #[test]
    fn test_step_chains_actions_in_play_order() {
        let board = Board::from_deal(REFERENCE_DEAL).unwrap();
        let root = Solution::root(board);
        let mut node = root.clone();
        let mut played = Vec::new();
        for _ in 0..3 {
            let action = node.board.legal_moves()[0];
            let next = node.board.apply(action, false).unwrap();
            let fingerprint = codec::fingerprint(&next);
            node = Solution::step(&node, action, next, &fingerprint);
            played.push(action);
        }
        assert_eq!(node.length, 3);
        assert_eq!(node.actions(), played);
        assert_eq!(node.action(), Some(played[2]));
    }

    #[test]
    fn test_completed_board_is_done() {
        let columns: [Column; TOTAL_COLUMNS] = Default::default();
        let root = Solution::root(Board::from_columns(columns));
        assert!(root.is_done);
    }
}
