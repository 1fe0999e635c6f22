use crate::ultimate::board::{evaluate, Outcome, SubBoard, BOARD_SIZE};
use crate::ultimate::input::{Move, MoveError, ValidMove};
use crate::ultimate::player::Player;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Active sub-board {0} is outside the range 0-8")]
    ActiveSubBoardOutOfRange(usize),
}

// The replicated unit of truth. `sub_outcomes` and `result` are derived from `boards` and are
// recomputed on every transition and on decode, so they can never drift from the cells.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "Snapshot")]
pub struct GameState {
    boards: [SubBoard; BOARD_SIZE],
    sub_outcomes: [Outcome; BOARD_SIZE],
    turn: Player,
    active_sub_board: Option<usize>,
    result: Outcome,
}

// Decoded form of a received state. Derived fields sent by the peer are ignored, and an
// active sub-board that does not exist makes the whole state undecodable.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    boards: [SubBoard; BOARD_SIZE],
    turn: Player,
    active_sub_board: Option<usize>,
}

impl TryFrom<Snapshot> for GameState {
    type Error = StateError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        if let Some(active) = snapshot.active_sub_board {
            if active >= BOARD_SIZE {
                return Err(StateError::ActiveSubBoardOutOfRange(active));
            }
        }
        let mut state = GameState {
            boards: snapshot.boards,
            sub_outcomes: [Outcome::Undecided; BOARD_SIZE],
            turn: snapshot.turn,
            active_sub_board: snapshot.active_sub_board,
            result: Outcome::Undecided,
        };
        state.settle();
        Ok(state)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            boards: [SubBoard::default(); BOARD_SIZE],
            sub_outcomes: [Outcome::Undecided; BOARD_SIZE],
            turn: Player::X,
            active_sub_board: None,
            result: Outcome::Undecided,
        }
    }
}

impl GameState {
    pub fn boards(&self) -> &[SubBoard; BOARD_SIZE] {
        &self.boards
    }

    pub fn sub_outcomes(&self) -> &[Outcome; BOARD_SIZE] {
        &self.sub_outcomes
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn active_sub_board(&self) -> Option<usize> {
        self.active_sub_board
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_decided()
    }

    pub fn apply(&mut self, valid_move: ValidMove) {
        let Move { sub_board, cell } = valid_move.get();
        self.boards[sub_board].set(cell, valid_move.player().into());
        self.settle();
        if !self.result.is_decided() {
            self.turn = self.turn.opponent();
        }
        // Being sent to a decided sub-board means the next player may choose freely
        self.active_sub_board = if self.sub_outcomes[cell].is_decided() {
            None
        } else {
            Some(cell)
        };
    }

    // Validates and applies in one step. A rejected move leaves the state untouched.
    pub fn play(&mut self, player: Player, mv: Move) -> Result<(), MoveError> {
        let valid_move = ValidMove::new(mv, self, player)?;
        self.apply(valid_move);
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = GameState::default();
    }

    // Every move the player holding the turn could make right now
    pub fn legal_moves(&self) -> Vec<Move> {
        (0..BOARD_SIZE)
            .flat_map(|sub_board| (0..BOARD_SIZE).map(move |cell| Move::new(sub_board, cell)))
            .filter(|mv| ValidMove::new(*mv, self, self.turn).is_ok())
            .collect()
    }

    fn settle(&mut self) {
        self.sub_outcomes = self.boards.map(|board| board.outcome());
        self.result = evaluate(&self.sub_outcomes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ultimate::board::Cell;

    const E: Cell = Cell::Empty;
    const X: Cell = Cell::X;
    const O: Cell = Cell::O;
    const X_WON: [Cell; 9] = [X, X, X, O, O, E, E, E, E];
    const O_WON: [Cell; 9] = [O, O, O, X, X, E, X, E, E];
    const DRAWN: [Cell; 9] = [X, O, X, X, O, O, O, X, X];
    // One X in cell 8 away from a draw
    const ALMOST_DRAWN: [Cell; 9] = [X, O, X, X, O, O, O, X, E];

    fn snapshot(boards: [[Cell; 9]; 9], turn: Player, active_sub_board: Option<usize>) -> GameState {
        GameState::try_from(Snapshot {
            boards: boards.map(SubBoard::new),
            turn,
            active_sub_board,
        })
        .unwrap()
    }

    fn play_all(state: &mut GameState, moves: &[(usize, usize)]) {
        for &(sub_board, cell) in moves {
            let player = state.turn();
            state.play(player, Move::new(sub_board, cell)).unwrap();
        }
    }

    fn assert_consistent(state: &GameState) {
        for (board, outcome) in state.boards().iter().zip(state.sub_outcomes()) {
            assert_eq!(evaluate(board.cells()), *outcome);
        }
        assert_eq!(evaluate(state.sub_outcomes()), state.result());
    }

    #[test]
    fn test_default_state() {
        let state = GameState::default();
        assert_eq!(state.turn(), Player::X);
        assert_eq!(state.active_sub_board(), None);
        assert_eq!(state.result(), Outcome::Undecided);
        assert!(state
            .boards()
            .iter()
            .all(|b| b.cells().iter().all(|c| *c == Cell::Empty)));
        assert_eq!(state.legal_moves().len(), 81);
    }

    #[test]
    fn test_apply_sets_cell_turn_and_active_board() {
        let mut state = GameState::default();
        state.play(Player::X, Move::new(4, 4)).unwrap();
        assert_eq!(state.boards()[4].get(4), Some(Cell::X));
        assert_eq!(state.turn(), Player::O);
        assert_eq!(state.active_sub_board(), Some(4));

        state.play(Player::O, Move::new(4, 2)).unwrap();
        assert_eq!(state.boards()[4].get(2), Some(Cell::O));
        assert_eq!(state.turn(), Player::X);
        assert_eq!(state.active_sub_board(), Some(2));
        assert_eq!(state.legal_moves().len(), 9);
    }

    #[test]
    fn test_rejected_move_is_noop() {
        let mut state = GameState::default();
        play_all(&mut state, &[(0, 8)]);
        let before = state.clone();
        let before_json = serde_json::to_string(&state).unwrap();

        assert!(state.play(Player::O, Move::new(0, 0)).is_err());
        assert!(state.play(Player::X, Move::new(8, 0)).is_err());
        assert!(state.play(Player::O, Move::new(8, 9)).is_err());
        assert_eq!(state, before);
        assert_eq!(serde_json::to_string(&state).unwrap(), before_json);
    }

    #[test]
    fn test_winning_diagonal_fixes_sub_board() {
        let mut state = GameState::default();
        play_all(&mut state, &[(4, 0), (0, 4), (4, 8), (8, 4), (4, 4)]);
        assert_eq!(state.sub_outcomes()[4], Outcome::X);
        // The winning cell points at the board that was just won
        assert_eq!(state.active_sub_board(), None);

        let board = state.boards()[4];
        for cell in [1, 2, 3, 5, 6, 7] {
            assert_eq!(
                state.play(Player::O, Move::new(4, cell)),
                Err(MoveError::SubBoardDecided(4))
            );
        }
        assert_eq!(state.boards()[4], board);
        assert!(state.legal_moves().iter().all(|mv| mv.sub_board != 4));
    }

    #[test]
    fn test_sent_to_decided_board_gives_free_choice() {
        let mut state = GameState::default();
        play_all(&mut state, &[(0, 8)]);
        assert_eq!(state.active_sub_board(), Some(8));

        // X takes the middle row of sub-board 8
        play_all(
            &mut state,
            &[(8, 0), (0, 1), (1, 8), (8, 3), (3, 8), (8, 4), (4, 8), (8, 5)],
        );
        assert_eq!(state.sub_outcomes()[8], Outcome::X);
        assert_eq!(state.active_sub_board(), Some(5));

        // O sends X to sub-board 8, which is already decided
        play_all(&mut state, &[(5, 8)]);
        assert_eq!(state.active_sub_board(), None);
        assert_eq!(state.turn(), Player::X);
        assert!(state.legal_moves().iter().any(|mv| mv.sub_board == 2));
        assert!(state.legal_moves().iter().any(|mv| mv.sub_board == 6));
        assert_eq!(
            state.play(Player::X, Move::new(8, 1)),
            Err(MoveError::SubBoardDecided(8))
        );
        assert!(state.play(Player::X, Move::new(2, 2)).is_ok());
    }

    #[test]
    fn test_full_sub_board_without_line_is_draw() {
        let mut boards = [[E; 9]; 9];
        boards[0] = ALMOST_DRAWN;
        let mut state = snapshot(boards, Player::X, Some(0));
        assert_eq!(state.sub_outcomes()[0], Outcome::Undecided);

        state.play(Player::X, Move::new(0, 8)).unwrap();
        assert_eq!(state.sub_outcomes()[0], Outcome::Draw);
        assert_eq!(state.result(), Outcome::Undecided);
        assert_eq!(state.active_sub_board(), Some(8));
        assert_eq!(state.turn(), Player::O);
    }

    #[test]
    fn test_full_meta_board_without_line_is_draw() {
        // Meta-board after the last move: X O X / X O O / O X D
        let boards = [
            X_WON,
            O_WON,
            X_WON,
            X_WON,
            O_WON,
            O_WON,
            O_WON,
            X_WON,
            ALMOST_DRAWN,
        ];
        let mut state = snapshot(boards, Player::X, Some(8));
        state.play(Player::X, Move::new(8, 8)).unwrap();
        assert_eq!(state.sub_outcomes()[8], Outcome::Draw);
        assert_eq!(state.result(), Outcome::Draw);
        assert!(state.is_over());
        assert!(state.legal_moves().is_empty());
    }

    #[test]
    fn test_meta_line_wins_game() {
        let mut boards = [[E; 9]; 9];
        boards[0] = X_WON;
        boards[1] = X_WON;
        boards[2] = [X, X, E, O, O, E, E, E, E];
        let mut state = snapshot(boards, Player::X, Some(2));
        assert_eq!(state.result(), Outcome::Undecided);

        state.play(Player::X, Move::new(2, 2)).unwrap();
        assert_eq!(state.result(), Outcome::X);
        // The turn does not pass once the game is decided
        assert_eq!(state.turn(), Player::X);
        assert_eq!(
            state.play(Player::X, Move::new(5, 0)),
            Err(MoveError::GameOver(Outcome::X))
        );
        assert_eq!(
            state.play(Player::O, Move::new(5, 0)),
            Err(MoveError::GameOver(Outcome::X))
        );
    }

    #[test]
    fn test_reachable_states_stay_consistent() {
        for stride in [1, 5, 7, 11, 13] {
            let mut state = GameState::default();
            let mut step = 0;
            while !state.is_over() {
                let moves = state.legal_moves();
                assert!(!moves.is_empty());
                let mv = moves[(step * stride) % moves.len()];
                let turn = state.turn();
                state.play(turn, mv).unwrap();
                assert_consistent(&state);
                if !state.is_over() {
                    assert_eq!(state.turn(), turn.opponent());
                }
                step += 1;
            }
            assert!(step <= 81);
        }
    }

    #[test]
    fn test_reset() {
        let mut state = GameState::default();
        play_all(&mut state, &[(3, 3), (3, 4)]);
        state.reset();
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut state = GameState::default();
        play_all(&mut state, &[(4, 0), (0, 4), (4, 8), (8, 4), (4, 4), (2, 2)]);
        let json = serde_json::to_string(&state).unwrap();
        let decoded: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, state);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["turn"], "X");
        assert_eq!(value["activeSubBoard"], 2);
        assert_eq!(value["subOutcomes"][4], "X");
        assert_eq!(value["result"], "Undecided");
        assert_eq!(value["boards"][4][0], "X");
    }

    #[test]
    fn test_decode_recomputes_derived_fields() {
        let mut boards = [[E; 9]; 9];
        boards[6] = O_WON;
        let sent = snapshot(boards, Player::X, None);
        let mut value = serde_json::to_value(&sent).unwrap();
        value["subOutcomes"][6] = "X".into();
        value["result"] = "Draw".into();

        let decoded: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.sub_outcomes()[6], Outcome::O);
        assert_eq!(decoded.result(), Outcome::Undecided);
        assert_eq!(decoded, sent);
    }

    #[test]
    fn test_decode_rejects_out_of_range_active_sub_board() {
        let mut value = serde_json::to_value(GameState::default()).unwrap();
        value["activeSubBoard"] = 9.into();
        assert!(serde_json::from_value::<GameState>(value.clone()).is_err());
        value["activeSubBoard"] = u64::MAX.into();
        assert!(serde_json::from_value::<GameState>(value.clone()).is_err());
        value["activeSubBoard"] = 8.into();
        let decoded: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.active_sub_board(), Some(8));

        let mut boards = [SubBoard::default(); BOARD_SIZE];
        boards[0] = SubBoard::new(X_WON);
        let snapshot = Snapshot {
            boards,
            turn: Player::O,
            active_sub_board: Some(12),
        };
        assert_eq!(
            GameState::try_from(snapshot),
            Err(StateError::ActiveSubBoardOutOfRange(12))
        );
    }
}
