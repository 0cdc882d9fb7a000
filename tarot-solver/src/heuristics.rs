use tarot_common::board::Board;
use tarot_common::card::{Card, MAJOR_MAX, MAJOR_MIN, MINOR_MAX, Suit};

use smallvec::SmallVec;

/// Weight of `run_count` in the combined priority.
pub const RUN_WEIGHT: u32 = 3;
/// Weight of `terminal_depth` in the combined priority.
pub const DEPTH_WEIGHT: u32 = 2;

/// Number of maximal adjacent runs across all columns. Fewer, longer runs
/// mean a board closer to sorted.
pub fn run_count(board: &Board) -> u32 {
    let mut runs = 0;
    for column in &board.columns {
        let cards = column.cards();
        if cards.is_empty() {
            continue;
        }
        runs += 1;
        for pair in cards.windows(2) {
            if !pair[0].is_adjacent_to(&pair[1]) {
                runs += 1;
            }
        }
    }
    runs
}

/// The cards each foundation needs next. The major side contributes its
/// inner gap ends only while both ends are set and unmerged.
fn needed_cards(board: &Board) -> SmallVec<[Card; 6]> {
    let mut needed = SmallVec::new();
    let majors = &board.majors;
    if majors.left.is_none() {
        needed.push(Card::Major(MAJOR_MIN));
    }
    if majors.right.is_none() {
        needed.push(Card::Major(MAJOR_MAX));
    }
    if let (Some(left), Some(right)) = (majors.left, majors.right) {
        if !majors.is_merged() {
            needed.push(Card::Major(left + 1));
            if right - 1 != left + 1 {
                needed.push(Card::Major(right - 1));
            }
        }
    }
    for suit in Suit::ALL {
        let top = board.minors.top(suit);
        if top < MINOR_MAX {
            needed.push(Card::Minor(suit, top + 1));
        }
    }
    needed
}

/// Sums, for every occurrence of a needed card, the number of cards that
/// bury it in its column.
pub fn terminal_depth(board: &Board) -> u32 {
    let needed = needed_cards(board);
    let mut total = 0u32;
    for column in &board.columns {
        let cards = column.cards();
        for (position, card) in cards.iter().enumerate() {
            if needed.contains(card) {
                total += (cards.len() - position) as u32;
            }
        }
    }
    total
}

/// The frontier priority; lower is better.
pub fn combined_priority(board: &Board) -> u32 {
    run_count(board) * RUN_WEIGHT + terminal_depth(board) * DEPTH_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_common::board::TOTAL_COLUMNS;
    use tarot_common::tableau::Column;

    fn board_with_column(cards: &[Card]) -> Board {
        let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
        for &card in cards {
            columns[0].push_card(card);
        }
        // Keep the run intact: park a blocker in the free cell so minor
        // tops cannot auto-promote.
        Board::with_parts(
            Default::default(),
            Default::default(),
            Some(Card::Major(10)),
            columns,
        )
    }

    #[test]
    fn test_run_count_counts_breaks() {
        // Major 5,4,3 then Goblets 5,6,7: one break, two runs.
        let board = board_with_column(&[
            Card::Major(5),
            Card::Major(4),
            Card::Major(3),
            Card::Minor(Suit::Goblets, 5),
            Card::Minor(Suit::Goblets, 6),
            Card::Minor(Suit::Goblets, 7),
        ]);
        assert_eq!(run_count(&board), 2);
    }

    #[test]
    fn test_run_count_empty_board() {
        let board = Board::from_columns(Default::default());
        assert_eq!(run_count(&board), 0);
    }

    #[test]
    fn test_terminal_depth_counts_burial() {
        // Major 0 is needed (left end empty) and buried under two cards:
        // column length 3 at position 0 contributes 3.
        let board = board_with_column(&[
            Card::Major(0),
            Card::Minor(Suit::Swords, 9),
            Card::Minor(Suit::Wands, 4),
        ]);
        // Needed cards in play: Major(0) at depth 3, Swords 2 and Wands 2
        // absent, Coins/Goblets 2 absent, Major 21 absent.
        assert_eq!(terminal_depth(&board), 3);
    }

    #[test]
    fn test_major_gap_ends_need_both_sides() {
        let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
        columns[0].push_card(Card::Major(7));
        columns[0].push_card(Card::Minor(Suit::Swords, 9));
        columns[1].push_card(Card::Major(15));
        columns[1].push_card(Card::Minor(Suit::Wands, 4));
        let board = Board::with_parts(
            tarot_common::foundation::MajorFoundation {
                left: Some(6),
                right: Some(16),
            },
            Default::default(),
            None,
            columns,
        );
        // Both gap ends (7 and 15) lie one card deep in length-2 columns.
        assert_eq!(terminal_depth(&board), 4);
    }

    #[test]
    fn test_combined_priority_weights() {
        let board = board_with_column(&[
            Card::Major(5),
            Card::Major(4),
            Card::Major(3),
            Card::Minor(Suit::Goblets, 5),
            Card::Minor(Suit::Goblets, 6),
            Card::Minor(Suit::Goblets, 7),
        ]);
        assert_eq!(
            combined_priority(&board),
            run_count(&board) * RUN_WEIGHT + terminal_depth(&board) * DEPTH_WEIGHT
        );
    }
}
