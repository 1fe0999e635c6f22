use crate::app::Event;
use crate::client::Sender;
use crate::handler;
use futures::{FutureExt, Sink, Stream, StreamExt};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::tungstenite::{self, Message as TungsteniteMessage};
use tracing::{error, info};
use uttt_common::Player;
use uuid::Uuid;
use warp::{ws::Message as WarpMessage, Filter, Rejection, Reply};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not listen on {0}: {1}")]
    Bind(SocketAddr, warp::Error),
    #[error("Could not connect to {0}: {1}")]
    Connect(String, tungstenite::Error),
}

// The hosting side waits for exactly one peer, identified by the id in the shared link
#[derive(Debug)]
pub struct LobbyState {
    pub peer_id: String,
    pub taken: bool,
    pub events: mpsc::UnboundedSender<Event>,
}

pub type Lobby = Arc<RwLock<LobbyState>>;

// The parts of a WebSocket frame the session cares about. Both ends of the connection
// use a different WebSocket implementation, so the pump below is written once for both.
pub trait Frame: Sized {
    fn text(text: String) -> Self;
    fn into_payload(self) -> Option<String>;
    fn is_close(&self) -> bool;
}

impl Frame for WarpMessage {
    fn text(text: String) -> Self {
        WarpMessage::text(text)
    }

    fn into_payload(self) -> Option<String> {
        self.to_str().ok().map(str::to_string)
    }

    fn is_close(&self) -> bool {
        WarpMessage::is_close(self)
    }
}

impl Frame for TungsteniteMessage {
    fn text(text: String) -> Self {
        TungsteniteMessage::Text(text)
    }

    fn into_payload(self) -> Option<String> {
        match self {
            TungsteniteMessage::Text(text) => Some(text),
            _ => None,
        }
    }

    fn is_close(&self) -> bool {
        TungsteniteMessage::is_close(self)
    }
}

// Starts listening for the peer and returns the link to share with them
pub fn host(
    addr: SocketAddr,
    events: mpsc::UnboundedSender<Event>,
) -> Result<String, TransportError> {
    let peer_id = Uuid::new_v4().as_simple().to_string();
    let lobby: Lobby = Arc::new(RwLock::new(LobbyState {
        peer_id: peer_id.clone(),
        taken: false,
        events,
    }));

    let (bound, server) = warp::serve(routes(lobby))
        .try_bind_ephemeral(addr)
        .map_err(|e| TransportError::Bind(addr, e))?;
    tokio::task::spawn(server);
    info!("listening for a peer on {}", bound);

    Ok(format!("ws://{}/ws?peer={}", bound, peer_id))
}

pub fn routes(lobby: Lobby) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let health_route = warp::path!("health").and_then(handler::health_handler);

    let ws_route = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(warp::query::<handler::JoinQuery>())
        .and(with_lobby(lobby))
        .and_then(handler::ws_handler);

    health_route.or(ws_route)
}

fn with_lobby(lobby: Lobby) -> impl Filter<Extract = (Lobby,), Error = Infallible> + Clone {
    warp::any().map(move || lobby.clone())
}

// Opens the channel to a hosting peer. The opening side plays X.
pub async fn connect(
    link: &str,
    events: mpsc::UnboundedSender<Event>,
) -> Result<(), TransportError> {
    let (socket, _) = tokio_tungstenite::connect_async(link)
        .await
        .map_err(|e| TransportError::Connect(link.to_string(), e))?;
    info!("connected to {}", link);
    tokio::task::spawn(peer_connection(socket, Player::X, events));
    Ok(())
}

// Pumps one WebSocket until it closes. Outgoing text is queued by the session and written
// by a separate task; incoming text frames become events on the session queue.
pub async fn peer_connection<W, M, E>(socket: W, role: Player, events: mpsc::UnboundedSender<Event>)
where
    W: Stream<Item = Result<M, E>> + Sink<M, Error = E> + Send + 'static,
    M: Frame + Send + 'static,
    E: Display + Send + 'static,
{
    let (peer_ws_sender, mut peer_ws_rcv) = socket.split::<M>();
    let (peer_sender, peer_rcv) = mpsc::unbounded_channel::<String>();

    let peer_rcv = UnboundedReceiverStream::new(peer_rcv).map(|text| Ok::<M, E>(M::text(text)));
    tokio::task::spawn(peer_rcv.forward(peer_ws_sender).map(|result| {
        if let Err(e) = result {
            error!("error sending websocket msg: {}", e);
        }
    }));

    let opened = Event::Opened {
        role,
        sender: Sender(peer_sender),
    };
    if events.send(opened).is_err() {
        return;
    }

    while let Some(result) = peer_ws_rcv.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                error!("error receiving ws message: {}", e);
                let _ = events.send(Event::ChannelError(e.to_string()));
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if let Some(text) = msg.into_payload() {
            if events.send(Event::Received(text)).is_err() {
                break;
            }
        }
    }

    info!("peer disconnected");
    let _ = events.send(Event::Closed);
}
