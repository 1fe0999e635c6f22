use crate::ws::{self, Lobby};
use serde::Deserialize;
use tracing::{info, warn};
use uttt_common::Player;
use warp::{http::StatusCode, reply::Response, Rejection, Reply};

type Result<T> = std::result::Result<T, Rejection>;

#[derive(Deserialize, Debug)]
pub struct JoinQuery {
    peer: String,
}

// Upgrades the one connection that presents this peer's id. The connecting side opened
// the channel, so this side plays O. The lobby is only marked taken once an upgrade has
// completed, so a handshake that fails halfway leaves the link usable.
pub async fn ws_handler(ws: warp::ws::Ws, query: JoinQuery, lobby: Lobby) -> Result<Response> {
    let events = {
        let state = lobby.read().await;
        if query.peer != state.peer_id {
            warn!("rejected connection for unknown peer id {}", query.peer);
            return Err(warp::reject::not_found());
        }
        if state.taken {
            warn!("rejected second connection for peer id {}", query.peer);
            return Ok(StatusCode::CONFLICT.into_response());
        }
        state.events.clone()
    };
    info!("accepting connection for peer id {}", query.peer);
    Ok(ws
        .on_upgrade(move |socket| async move {
            {
                let mut state = lobby.write().await;
                if state.taken {
                    warn!("dropping connection upgraded after the peer joined");
                    return;
                }
                state.taken = true;
            }
            ws::peer_connection(socket, Player::O, events).await
        })
        .into_response())
}

pub async fn health_handler() -> Result<impl Reply> {
    Ok(StatusCode::OK)
}
