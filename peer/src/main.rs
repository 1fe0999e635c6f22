use crate::coordinator::SyncCoordinator;
use crate::session::LocalSession;
use crate::store::FileStore;
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod app;
mod client;
mod coordinator;
mod handler;
mod session;
mod store;
mod terminal;
mod ws;

/// Ultimate tic-tac-toe between two peers, or hot-seat on one machine
#[derive(Parser, Debug)]
#[command(name = "peer")]
#[command(version)]
struct Cli {
    /// Directory for the daily JSON log files
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Wait for an opponent to connect and play as O
    Host {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,

        /// Port to listen on (0 picks a free port)
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Connect to a hosting opponent with the link they shared and play as X
    Connect {
        /// Link printed by the hosting peer, e.g. ws://127.0.0.1:8000/ws?peer=<id>
        link: String,
    },

    /// Play both sides on this machine, saving the game after every move
    Local {
        /// File the game is saved to and restored from
        #[arg(long, default_value = "ultimate.json")]
        save_file: PathBuf,
    },
}

fn init_logging(log_dir: &Path) -> Result<WorkerGuard, String> {
    let file_appender = tracing_appender::rolling::daily(log_dir, "peer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())?;
    Ok(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match init_logging(&cli.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Could not set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    match cli.command {
        Mode::Host { bind, port } => {
            let addr = SocketAddr::new(bind, port);
            let link = match ws::host(addr, events_tx.clone()) {
                Ok(link) => link,
                Err(e) => {
                    error!("{}", e);
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            println!("Share this link with your opponent: {}", link);
            terminal::spawn_input(events_tx);
            app::run_networked(SyncCoordinator::new(), events_rx).await;
        }
        Mode::Connect { link } => {
            if let Err(e) = ws::connect(&link, events_tx.clone()).await {
                error!("{}", e);
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
            terminal::spawn_input(events_tx);
            app::run_networked(SyncCoordinator::new(), events_rx).await;
        }
        Mode::Local { save_file } => {
            let mut session = LocalSession::new(FileStore::new(save_file));
            match session.restore() {
                Ok(true) => println!("Restored the saved game"),
                Ok(false) => {}
                Err(e) => println!("{}. Starting a new game.", e),
            }
            terminal::spawn_input(events_tx);
            app::run_local(session, events_rx).await;
        }
    }
    info!("exiting");
    ExitCode::SUCCESS
}
