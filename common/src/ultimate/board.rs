use crate::ultimate::player::Player;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 9;

// Rows, then columns, then diagonals. The scan order is fixed so evaluation is deterministic.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Cell {
    X,
    O,
    #[default]
    Empty,
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::X => write!(f, "X"),
            Cell::O => write!(f, "O"),
            Cell::Empty => write!(f, "."),
        }
    }
}

// Outcome of a single sub-board or of the whole game
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Outcome {
    X,
    O,
    Draw,
    #[default]
    Undecided,
}

impl Outcome {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::Undecided)
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::X => Some(Player::X),
            Outcome::O => Some(Player::O),
            Outcome::Draw | Outcome::Undecided => None,
        }
    }
}

impl From<Player> for Outcome {
    fn from(player: Player) -> Self {
        match player {
            Player::X => Outcome::X,
            Player::O => Outcome::O,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::X => write!(f, "X"),
            Outcome::O => write!(f, "O"),
            Outcome::Draw => write!(f, "D"),
            Outcome::Undecided => write!(f, " "),
        }
    }
}

// A position that can take part in a three-in-a-row line. Cells are evaluated inside a
// sub-board and sub-board outcomes are evaluated on the meta-board.
pub trait Mark: Copy {
    // The player holding this position. Empty, drawn and undecided positions hold nothing.
    fn owner(self) -> Option<Player>;
    fn is_filled(self) -> bool;
}

impl Mark for Cell {
    fn owner(self) -> Option<Player> {
        match self {
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
            Cell::Empty => None,
        }
    }

    fn is_filled(self) -> bool {
        self != Cell::Empty
    }
}

impl Mark for Outcome {
    fn owner(self) -> Option<Player> {
        self.winner()
    }

    fn is_filled(self) -> bool {
        self.is_decided()
    }
}

pub fn evaluate<M: Mark>(values: &[M; BOARD_SIZE]) -> Outcome {
    for [a, b, c] in LINES {
        if let Some(player) = values[a].owner() {
            if values[b].owner() == Some(player) && values[c].owner() == Some(player) {
                return player.into();
            }
        }
    }
    if values.iter().all(|v| v.is_filled()) {
        Outcome::Draw
    } else {
        Outcome::Undecided
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct SubBoard([Cell; BOARD_SIZE]);

impl SubBoard {
    pub fn new(cells: [Cell; BOARD_SIZE]) -> Self {
        SubBoard(cells)
    }

    pub fn get(&self, cell: usize) -> Option<Cell> {
        self.0.get(cell).copied()
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.0
    }

    pub fn outcome(&self) -> Outcome {
        evaluate(&self.0)
    }

    // Callers must have checked that the cell is empty and the board undecided
    pub(crate) fn set(&mut self, cell: usize, value: Cell) {
        self.0[cell] = value;
    }
}
