use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use uttt_common::GameState;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not access saved game {0}: {1}")]
    Io(PathBuf, io::Error),
    #[error("Saved game {0} is not a valid game state: {1}")]
    Corrupt(PathBuf, serde_json::Error),
    #[error("Could not encode game state: {0}")]
    Encode(serde_json::Error),
}

// Keeps the last state of a hot-seat game across restarts. Never shared with a peer.
pub trait SessionStore {
    fn save(&self, state: &GameState) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<GameState>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }
}

impl SessionStore for FileStore {
    fn save(&self, state: &GameState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(StoreError::Encode)?;
        fs::write(&self.path, json).map_err(|e| StoreError::Io(self.path.clone(), e))?;
        info!("saved game to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<GameState>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(self.path.clone(), e)),
        };
        let state =
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(self.path.clone(), e))?;
        info!("loaded game from {}", self.path.display());
        Ok(Some(state))
    }
}
