use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error sending message: the channel to the peer is closed")]
pub struct SendError;

// Outgoing half of a peer connection. Sending only queues the text for the writer task,
// so it never waits on the network.
#[derive(Debug, Clone)]
pub struct Sender(pub mpsc::UnboundedSender<String>);

pub trait SendMsg {
    fn send(&self, msg: &str) -> Result<(), SendError>;
}

impl SendMsg for Sender {
    fn send(&self, msg: &str) -> Result<(), SendError> {
        self.0.send(msg.to_string()).map_err(|_| SendError)
    }
}
