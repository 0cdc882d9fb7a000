use crate::board::Board;

/// A player move. Column indices are 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the top card (or the whole top run) between two columns.
    Transfer { from: usize, to: usize },
    /// Move the top card of a column to the free cell.
    Store { from: usize },
    /// Move the free cell card onto a column.
    Retrieve { to: usize },
}

pub fn describe_action(action: &Action) -> String {
    match action {
        Action::Transfer { from, to } => {
            format!("Move a card from column {} to column {}.", from + 1, to + 1)
        }
        Action::Store { from } => {
            format!("Place a card from column {} on the free cell.", from + 1)
        }
        Action::Retrieve { to } => {
            format!("Retrieve the free cell card to column {}.", to + 1)
        }
    }
}

/// Renders a solution path as numbered steps.
pub fn format_actions(actions: &[Action]) -> String {
    let mut output = String::new();
    for (i, action) in actions.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, describe_action(action)));
    }
    output
}

/// Replays a move list from an initial board, stopping at the first
/// illegal move. Used to verify solutions end to end.
pub fn replay(board: &Board, actions: &[Action], single_card: bool) -> anyhow::Result<Board> {
    let mut current = board.clone();
    for action in actions {
        current = current.apply(*action, single_card)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_action() {
        assert_eq!(
            describe_action(&Action::Transfer { from: 0, to: 4 }),
            "Move a card from column 1 to column 5."
        );
        assert_eq!(
            describe_action(&Action::Store { from: 10 }),
            "Place a card from column 11 on the free cell."
        );
        assert_eq!(
            describe_action(&Action::Retrieve { to: 2 }),
            "Retrieve the free cell card to column 3."
        );
    }

    #[test]
    fn test_format_actions_numbers_steps() {
        let actions = [Action::Store { from: 0 }, Action::Retrieve { to: 1 }];
        let text = format_actions(&actions);
        assert!(text.starts_with("1. Place"));
        assert!(text.contains("\n2. Retrieve"));
    }
}
