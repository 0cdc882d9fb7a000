use crate::action::Action;
use crate::card::Card;
use crate::error::GameError;
use crate::foundation::{MajorFoundation, MinorFoundation};
use crate::tableau::Column;

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;

pub const TOTAL_COLUMNS: usize = 11;
/// 22 major arcana plus 4 suits of 13 minor arcana.
pub const TOTAL_CARDS: usize = 74;

pub type ActionList = SmallVec<[Action; 64]>;

/// The documented fixed starting deal: 10 columns of 7 cards with the
/// middle column empty. The four minor aces begin on their foundations
/// and are never dealt.
pub const REFERENCE_DEAL: &str = "\
C7,19,S6,S11,C6,17,4
S13,S5,10,W4,9,W12,18
W8,7,C11,C2,S9,3,W10
S7,G13,G11,13,11,G3,G12
G8,16,1,8,G9,C9,S8

G10,G7,G5,W5,6,W9,C5
S4,W11,14,20,W3,12,C13
21,S10,0,W2,C4,W7,C10
C3,2,S2,G2,W13,S12,C12
S3,15,C8,G4,G6,W6,5";

/// A full board position. Boards are produced only by the constructors and
/// by `apply`, all of which normalize to a fixed point; treat every
/// instance as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pub majors: MajorFoundation,
    pub minors: MinorFoundation,
    pub free_cell: Option<Card>,
    pub columns: [Column; TOTAL_COLUMNS],
}

fn check_index(index: usize) -> Result<(), GameError> {
    if index >= TOTAL_COLUMNS {
        return Err(GameError::OutOfRange { index });
    }
    Ok(())
}

impl Board {
    /// Builds a board from dealt columns with fresh foundations, then
    /// normalizes.
    pub fn from_columns(columns: [Column; TOTAL_COLUMNS]) -> Self {
        Self::with_parts(
            MajorFoundation::new(),
            MinorFoundation::new(),
            None,
            columns,
        )
    }

    /// Builds a board from explicit parts, then normalizes.
    pub fn with_parts(
        majors: MajorFoundation,
        minors: MinorFoundation,
        free_cell: Option<Card>,
        columns: [Column; TOTAL_COLUMNS],
    ) -> Self {
        let mut board = Self {
            majors,
            minors,
            free_cell,
            columns,
        };
        board.normalize();
        board
    }

    /// Parses the textual deal format: exactly 11 lines, one column per
    /// line, comma-separated card tokens, a blank line for an empty column.
    pub fn from_deal(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() != TOTAL_COLUMNS {
            bail!(
                "a deal must have exactly {TOTAL_COLUMNS} lines, found {}",
                lines.len()
            );
        }
        let mut columns: [Column; TOTAL_COLUMNS] = Default::default();
        for (index, line) in lines.iter().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            for token in line.split(',') {
                let card = Card::parse(token)
                    .with_context(|| format!("failed to parse column {}", index + 1))?;
                columns[index].push_card(card);
            }
        }
        Ok(Self::from_columns(columns))
    }

    /// Runs the self-promotion loop to a fixed point: the free cell first,
    /// then the first column (in index order) whose top card is promotable.
    /// A major run promotes regardless of the free cell; a minor run
    /// promotes only while the free cell is empty.
    fn normalize(&mut self) {
        loop {
            let mut promoted = false;

            if let Some(card) = self.free_cell {
                let eligible = match card {
                    Card::Major(v) => self.majors.can_promote(v),
                    Card::Minor(suit, v) => self.minors.can_promote(suit, v),
                };
                if eligible {
                    self.promote_card(card);
                    self.free_cell = None;
                    promoted = true;
                }
            }

            if !promoted {
                for index in 0..TOTAL_COLUMNS {
                    let Some(top) = self.columns[index].top() else {
                        continue;
                    };
                    let eligible = match top {
                        Card::Major(v) => self.majors.can_promote(v),
                        Card::Minor(suit, v) => {
                            self.free_cell.is_none() && self.minors.can_promote(suit, v)
                        }
                    };
                    if eligible {
                        let run = self.columns[index]
                            .take_run()
                            .expect("column with a top card has a run");
                        for card in run {
                            self.promote_card(card);
                        }
                        promoted = true;
                        break;
                    }
                }
            }

            if !promoted {
                break;
            }
        }
    }

    fn promote_card(&mut self, card: Card) {
        // A run whose top card is promotable is monotonic, so every card in
        // it promotes in turn.
        match card {
            Card::Major(v) => self
                .majors
                .promote(v)
                .expect("run promotion follows from adjacency"),
            Card::Minor(suit, v) => self
                .minors
                .promote(suit, v)
                .expect("run promotion follows from adjacency"),
        }
    }

    /// A board is complete when no card remains in play. For a legal full
    /// deal this coincides with a merged major foundation and all minor
    /// stacks at 13.
    pub fn is_complete(&self) -> bool {
        self.free_cell.is_none() && self.columns.iter().all(|c| c.is_empty())
    }

    /// Checks that all 74 cards are accounted for exactly once across the
    /// columns, the free cell and the cards the foundations imply promoted.
    pub fn is_valid(&self) -> bool {
        let mut seen = [false; TOTAL_CARDS];
        let mut mark = |card: &Card| -> bool {
            let id = match *card {
                Card::Major(v) => v as usize,
                Card::Minor(suit, v) => 22 + suit.index() * 13 + (v as usize - 1),
            };
            !std::mem::replace(&mut seen[id], true)
        };

        if self.majors.is_merged() {
            for v in 0..=21 {
                if !mark(&Card::Major(v)) {
                    return false;
                }
            }
        } else {
            if let Some(left) = self.majors.left {
                for v in 0..=left {
                    if !mark(&Card::Major(v)) {
                        return false;
                    }
                }
            }
            if let Some(right) = self.majors.right {
                for v in right..=21 {
                    if !mark(&Card::Major(v)) {
                        return false;
                    }
                }
            }
        }
        for suit in crate::card::Suit::ALL {
            for v in 1..=self.minors.top(suit) {
                if !mark(&Card::Minor(suit, v)) {
                    return false;
                }
            }
        }
        if let Some(card) = &self.free_cell {
            if !mark(card) {
                return false;
            }
        }
        for column in &self.columns {
            for card in column.cards() {
                if !mark(card) {
                    return false;
                }
            }
        }
        seen.iter().all(|&s| s)
    }

    /// Yields every legal move: transfers between every ordered pair of
    /// distinct columns, stores while the free cell is empty, retrieves
    /// while it is occupied.
    pub fn legal_moves(&self) -> ActionList {
        let mut moves = ActionList::new();
        for from in 0..TOTAL_COLUMNS {
            let Some(source_top) = self.columns[from].top() else {
                continue;
            };
            for to in 0..TOTAL_COLUMNS {
                if from == to {
                    continue;
                }
                if self.columns[to].can_place(&source_top) {
                    moves.push(Action::Transfer { from, to });
                }
            }
        }
        match self.free_cell {
            None => {
                for from in 0..TOTAL_COLUMNS {
                    if !self.columns[from].is_empty() {
                        moves.push(Action::Store { from });
                    }
                }
            }
            Some(held) => {
                for to in 0..TOTAL_COLUMNS {
                    if self.columns[to].can_place(&held) {
                        moves.push(Action::Retrieve { to });
                    }
                }
            }
        }
        moves
    }

    /// Applies a move and returns the freshly normalized successor board.
    /// `single_card` restricts transfers to the top card instead of the
    /// whole top run.
    pub fn apply(&self, action: Action, single_card: bool) -> Result<Board, GameError> {
        let mut next = self.clone();
        match action {
            Action::Transfer { from, to } => {
                check_index(from)?;
                check_index(to)?;
                let source_top = next.columns[from]
                    .top()
                    .ok_or(GameError::IllegalState("cannot move cards from an empty column"))?;
                if let Some(dest_top) = next.columns[to].top() {
                    if !dest_top.is_adjacent_to(&source_top) {
                        return Err(GameError::IllegalState(
                            "card cannot rest on the top of the destination column",
                        ));
                    }
                }
                if single_card {
                    let card = next.columns[from].take_card()?;
                    next.columns[to].place(card)?;
                } else {
                    let run = next.columns[from].take_run()?;
                    next.columns[to].place_run(&run)?;
                }
            }
            Action::Store { from } => {
                check_index(from)?;
                if next.free_cell.is_some() {
                    return Err(GameError::IllegalState(
                        "cannot store a card while the free cell is occupied",
                    ));
                }
                let card = next.columns[from].take_card()?;
                next.free_cell = Some(card);
            }
            Action::Retrieve { to } => {
                check_index(to)?;
                let card = next
                    .free_cell
                    .take()
                    .ok_or(GameError::IllegalState("cannot retrieve from an empty free cell"))?;
                next.columns[to].place(card)?;
            }
        }
        Ok(Board::with_parts(
            next.majors,
            next.minors,
            next.free_cell,
            next.columns,
        ))
    }

    /// Renders the board as a fixed-width text grid.
    pub fn render(&self) -> String {
        let mut output = String::new();

        let end = |value: Option<u8>| match value {
            None => "-".to_string(),
            Some(v) => v.to_string(),
        };
        if self.majors.is_merged() {
            output.push_str(&format!(
                "Major: merged at {}\n",
                end(self.majors.left)
            ));
        } else {
            output.push_str(&format!(
                "Major: {} .. {}\n",
                end(self.majors.left),
                end(self.majors.right)
            ));
        }
        output.push_str("Minor:");
        for suit in crate::card::Suit::ALL {
            output.push_str(&format!(" {}{}", suit.letter(), self.minors.top(suit)));
        }
        output.push('\n');
        if let Some(card) = &self.free_cell {
            output.push_str(&format!("Free: {card}\n"));
        }

        let max_height = self.columns.iter().map(|c| c.len()).max().unwrap_or(0);
        for height in 0..max_height {
            for column in &self.columns {
                match column.cards().get(height) {
                    Some(card) => output.push_str(&format!("{:<4}", card.to_string())),
                    None => output.push_str("    "),
                }
            }
            while output.ends_with(' ') {
                output.pop();
            }
            output.push('\n');
        }
        output
    }
}
