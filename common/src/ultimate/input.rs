use crate::ultimate::board::{Cell, Outcome, BOARD_SIZE};
use crate::ultimate::game_state::GameState;
use crate::ultimate::player::Player;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Sub-board {sub_board} or cell {cell} is outside the range 0-8")]
    OutOfRange { sub_board: usize, cell: usize },
    #[error("The game is already over: {0:?}")]
    GameOver(Outcome),
    #[error("It is {turn}'s turn, not {player}'s")]
    WrongTurn { turn: Player, player: Player },
    #[error("Move must be played in sub-board {active}, not {sub_board}")]
    WrongSubBoard { active: usize, sub_board: usize },
    #[error("Sub-board {0} is already decided")]
    SubBoardDecided(usize),
    #[error("Cell {cell} of sub-board {sub_board} is already taken")]
    CellOccupied { sub_board: usize, cell: usize },
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub sub_board: usize,
    pub cell: usize,
}

impl Move {
    pub fn new(sub_board: usize, cell: usize) -> Self {
        Move { sub_board, cell }
    }
}

// A move that has been checked against a state. It can only be built through validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValidMove {
    mv: Move,
    player: Player,
}

impl ValidMove {
    // Checks run in a fixed order so the reported reason is stable:
    // - indices are in range
    // - the game is still undecided
    // - the player has the turn
    // - the move respects the active sub-board
    // - the target sub-board is undecided
    // - the target cell is empty
    pub fn new(mv: Move, state: &GameState, player: Player) -> Result<Self, MoveError> {
        let Move { sub_board, cell } = mv;
        if sub_board >= BOARD_SIZE || cell >= BOARD_SIZE {
            return Err(MoveError::OutOfRange { sub_board, cell });
        }
        if state.result().is_decided() {
            return Err(MoveError::GameOver(state.result()));
        }
        if player != state.turn() {
            return Err(MoveError::WrongTurn {
                turn: state.turn(),
                player,
            });
        }
        if let Some(active) = state.active_sub_board() {
            if active != sub_board {
                return Err(MoveError::WrongSubBoard { active, sub_board });
            }
        }
        if state.sub_outcomes()[sub_board].is_decided() {
            return Err(MoveError::SubBoardDecided(sub_board));
        }
        if state.boards()[sub_board].get(cell) != Some(Cell::Empty) {
            return Err(MoveError::CellOccupied { sub_board, cell });
        }
        Ok(ValidMove { mv, player })
    }

    pub fn get(&self) -> Move {
        self.mv
    }

    pub fn player(&self) -> Player {
        self.player
    }
}
