mod board;
mod game_state;
mod input;
mod player;

pub use board::{evaluate, Cell, Mark, Outcome, SubBoard, BOARD_SIZE, LINES};
pub use game_state::{GameState, StateError};
pub use input::{Move, MoveError, ValidMove};
pub use player::Player;
