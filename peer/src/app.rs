use crate::client::Sender;
use crate::coordinator::SyncCoordinator;
use crate::session::GameSession;
use crate::terminal::{self, Command};
use tokio::sync::mpsc;
use tracing::{error, info};
use uttt_common::Player;

// Everything that can change a session. Terminal input and the peer connection feed the
// same queue, and a single task drains it, so transitions never interleave.
#[derive(Debug)]
pub enum Event {
    Input(Command),
    Opened { role: Player, sender: Sender },
    Received(String),
    ChannelError(String),
    Closed,
}

fn show<G: GameSession>(session: &G) {
    println!("\n{}\n{}", terminal::render(session.state()), session.status());
}

// Returns false once the user wants to stop
fn handle_command<G: GameSession>(session: &mut G, command: Command) -> bool {
    let result = match command {
        Command::Play(mv) => session.apply_local_move(mv),
        Command::Reset => session.reset_game(),
        Command::Moves => {
            println!("{}", terminal::render_moves(&session.legal_moves()));
            return true;
        }
        Command::Quit => return false,
    };
    match result {
        Ok(()) => show(session),
        Err(e) => println!("{}", e),
    }
    true
}

pub async fn run_local<G: GameSession>(mut session: G, mut events: mpsc::UnboundedReceiver<Event>) {
    show(&session);
    println!("{}", terminal::HELP);
    while let Some(event) = events.recv().await {
        match event {
            Event::Input(command) => {
                if !handle_command(&mut session, command) {
                    break;
                }
            }
            other => error!("unexpected network event in a local game: {:?}", other),
        }
    }
}

pub async fn run_networked(
    mut coordinator: SyncCoordinator<Sender>,
    mut events: mpsc::UnboundedReceiver<Event>,
) {
    println!("{}", coordinator.status());
    while let Some(event) = events.recv().await {
        match event {
            Event::Input(command) => {
                if !handle_command(&mut coordinator, command) {
                    break;
                }
            }
            Event::Opened { role, sender } => {
                match role {
                    Player::X => coordinator.open(sender),
                    Player::O => coordinator.accept(sender),
                }
                show(&coordinator);
                println!("{}", terminal::HELP);
            }
            Event::Received(msg) => {
                if coordinator.handle_message(&msg) {
                    show(&coordinator);
                }
            }
            Event::ChannelError(e) => {
                coordinator.close();
                println!("Connection error: {}. Start a new session to keep playing.", e);
            }
            Event::Closed => {
                coordinator.close();
                info!("peer connection closed");
                println!("{}", coordinator.status());
            }
        }
    }
}
