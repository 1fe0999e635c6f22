use crate::client::SendError;
use crate::store::{SessionStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};
use uttt_common::{GameState, Move, MoveError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveError),
    #[error("Connection error: {0}")]
    Channel(#[from] SendError),
    #[error("Not connected to a peer yet")]
    NotConnected,
    #[error("The session has ended, start a new one to keep playing")]
    Ended,
    #[error("{0}")]
    Store(#[from] StoreError),
}

// What the front end sees of a game: a read-only state plus the two ways to change it.
pub trait GameSession {
    fn state(&self) -> &GameState;

    fn apply_local_move(&mut self, mv: Move) -> Result<(), SessionError>;

    fn reset_game(&mut self) -> Result<(), SessionError>;

    // Targets the local user may pick right now
    fn legal_moves(&self) -> Vec<Move> {
        self.state().legal_moves()
    }

    fn status(&self) -> String;
}

// Hot-seat play on one machine. Both players move through the same session and every
// transition is written to the store.
#[derive(Debug)]
pub struct LocalSession<S: SessionStore> {
    game_state: GameState,
    store: S,
}

impl<S: SessionStore> LocalSession<S> {
    pub fn new(store: S) -> Self {
        LocalSession {
            game_state: GameState::default(),
            store,
        }
    }

    // Replaces the current state with the saved one. Returns false when nothing was saved.
    pub fn restore(&mut self) -> Result<bool, StoreError> {
        match self.store.load()? {
            Some(state) => {
                self.game_state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<S: SessionStore> GameSession for LocalSession<S> {
    fn state(&self) -> &GameState {
        &self.game_state
    }

    fn apply_local_move(&mut self, mv: Move) -> Result<(), SessionError> {
        let player = self.game_state.turn();
        if let Err(err) = self.game_state.play(player, mv) {
            warn!("rejected local move {:?}: {}", mv, err);
            return Err(err.into());
        }
        info!("{} played {:?}", player, mv);
        self.store.save(&self.game_state)?;
        Ok(())
    }

    fn reset_game(&mut self) -> Result<(), SessionError> {
        self.game_state.reset();
        info!("local game reset");
        self.store.save(&self.game_state)?;
        Ok(())
    }

    fn status(&self) -> String {
        "Local game".to_string()
    }
}
