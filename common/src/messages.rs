use crate::ultimate::GameState;
use serde::{Deserialize, Serialize};

// Everything two peers say to each other. Tags this version does not know decode to
// `Unknown` so newer peers can add kinds without breaking older ones.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PeerMessage {
    GameState { state: GameState },
    #[serde(other)]
    Unknown,
}
