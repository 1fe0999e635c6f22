use crate::client::SendMsg;
use crate::session::{GameSession, SessionError};
use tracing::{error, info, warn};
use uttt_common::{messages::PeerMessage, GameState, Move, Player, ValidMove};

#[derive(Debug)]
pub enum Connection<S: SendMsg> {
    Disconnected,
    Connected { role: Player, sender: S },
    // Terminal. A new session has to be started from scratch.
    Ended,
}

// Owns this peer's copy of the game. The state changes in exactly two ways: a local
// transition that is applied here first and then pushed to the peer in full, or a state
// pushed by the peer, which replaces ours without any checks. If both peers move before
// either push arrives, whichever state is applied last wins.
#[derive(Debug)]
pub struct SyncCoordinator<S: SendMsg> {
    game_state: GameState,
    connection: Connection<S>,
}

impl<S: SendMsg> Default for SyncCoordinator<S> {
    fn default() -> Self {
        SyncCoordinator {
            game_state: GameState::default(),
            connection: Connection::Disconnected,
        }
    }
}

impl<S: SendMsg> SyncCoordinator<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Player> {
        match &self.connection {
            Connection::Connected { role, .. } => Some(*role),
            Connection::Disconnected | Connection::Ended => None,
        }
    }

    // This peer opened the channel, so it plays X
    pub fn open(&mut self, sender: S) {
        self.connect(Player::X, sender);
    }

    // The remote peer opened the channel, so this peer plays O
    pub fn accept(&mut self, sender: S) {
        self.connect(Player::O, sender);
    }

    fn connect(&mut self, role: Player, sender: S) {
        if !matches!(self.connection, Connection::Disconnected) {
            warn!("ignoring second connection as {}", role);
            return;
        }
        info!("connected to peer as {}", role);
        self.connection = Connection::Connected { role, sender };
    }

    // The channel closed or failed. The game state is kept for display.
    pub fn close(&mut self) {
        if !matches!(self.connection, Connection::Ended) {
            info!("session ended");
        }
        self.connection = Connection::Ended;
    }

    // Replaces the local state with one pushed by the peer. Returns whether anything was
    // applied; payloads that are not a game state are dropped.
    #[tracing::instrument(skip(self))]
    pub fn handle_message(&mut self, msg: &str) -> bool {
        if !matches!(self.connection, Connection::Connected { .. }) {
            warn!("message received outside a connected session");
            return false;
        }
        match serde_json::from_str::<PeerMessage>(msg) {
            Ok(PeerMessage::GameState { state }) => {
                self.game_state = state;
                true
            }
            Ok(PeerMessage::Unknown) => {
                warn!("ignoring message of unknown kind");
                false
            }
            Err(err) => {
                warn!("Failed to deserialize message into game state: {}", err);
                false
            }
        }
    }

    fn broadcast(&mut self) -> Result<(), SessionError> {
        let Connection::Connected { sender, .. } = &self.connection else {
            return Err(SessionError::NotConnected);
        };
        let message = PeerMessage::GameState {
            state: self.game_state.clone(),
        };
        // Serializing our own state can only fail on a bug
        let json = serde_json::to_string(&message).expect("game state serializes to JSON");
        if let Err(err) = sender.send(&json) {
            error!("failed to push state to peer: {}", err);
            self.close();
            return Err(err.into());
        }
        Ok(())
    }

    fn connected_role(&self) -> Result<Player, SessionError> {
        match &self.connection {
            Connection::Connected { role, .. } => Ok(*role),
            Connection::Disconnected => Err(SessionError::NotConnected),
            Connection::Ended => Err(SessionError::Ended),
        }
    }
}

impl<S: SendMsg> GameSession for SyncCoordinator<S> {
    fn state(&self) -> &GameState {
        &self.game_state
    }

    // Only the peer whose role holds the turn may move. This gating is advisory: the other
    // side trusts whatever state arrives.
    fn apply_local_move(&mut self, mv: Move) -> Result<(), SessionError> {
        let role = self.connected_role()?;
        let valid_move = match ValidMove::new(mv, &self.game_state, role) {
            Ok(valid_move) => valid_move,
            Err(err) => {
                warn!("rejected local move {:?}: {}", mv, err);
                return Err(err.into());
            }
        };
        self.game_state.apply(valid_move);
        info!("{} played {:?}", role, mv);
        self.broadcast()
    }

    fn reset_game(&mut self) -> Result<(), SessionError> {
        self.connected_role()?;
        self.game_state.reset();
        info!("game reset locally");
        self.broadcast()
    }

    fn legal_moves(&self) -> Vec<Move> {
        match self.role() {
            Some(role) if role == self.game_state.turn() => self.game_state.legal_moves(),
            _ => Vec::new(),
        }
    }

    fn status(&self) -> String {
        match &self.connection {
            Connection::Disconnected => "Waiting for a peer to connect".to_string(),
            Connection::Connected { role, .. } if *role == self.game_state.turn() => {
                format!("Connected, you are {}. Your turn", role)
            }
            Connection::Connected { role, .. } => {
                format!("Connected, you are {}. Waiting for the opponent", role)
            }
            Connection::Ended => "Disconnected from peer".to_string(),
        }
    }
}
