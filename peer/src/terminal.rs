use crate::app::Event;
use std::fmt::Write;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};
use uttt_common::{GameState, Move, Outcome, BOARD_SIZE};

pub const HELP: &str = "Commands: <sub-board> <cell> (both 0-8, row-major), moves, reset, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(Move),
    Moves,
    Reset,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unrecognised command '{0}'. {}", HELP)]
    Unknown(String),
    #[error("'{0}' is not a board index")]
    BadIndex(String),
}

impl std::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words[..] {
            ["moves"] => Ok(Command::Moves),
            ["reset"] => Ok(Command::Reset),
            ["quit"] | ["exit"] => Ok(Command::Quit),
            [sub_board, cell] => {
                let parse = |word: &str| {
                    word.parse::<usize>()
                        .map_err(|_| CommandError::BadIndex(word.to_string()))
                };
                Ok(Command::Play(Move::new(parse(sub_board)?, parse(cell)?)))
            }
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

// Reads commands from stdin on its own task and queues them behind any network events.
// End of input counts as quitting.
pub fn spawn_input(events: mpsc::UnboundedSender<Event>) {
    tokio::task::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("error reading stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    debug!("read command {:?}", command);
                    if events.send(Event::Input(command)).is_err() {
                        return;
                    }
                }
                Err(e) => println!("{}", e),
            }
        }
        let _ = events.send(Event::Input(Command::Quit));
    });
}

pub fn render(state: &GameState) -> String {
    let mut out = String::new();
    for row in 0..BOARD_SIZE {
        if row > 0 && row % 3 == 0 {
            out.push_str("------+-------+------\n");
        }
        let cells: Vec<String> = (0..BOARD_SIZE)
            .map(|col| {
                let sub_board = (row / 3) * 3 + col / 3;
                let cell = (row % 3) * 3 + col % 3;
                let value = state.boards()[sub_board].cells()[cell];
                if col > 0 && col % 3 == 0 {
                    format!("| {}", value)
                } else {
                    value.to_string()
                }
            })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Sub-boards: [{}]",
        state
            .sub_outcomes()
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<String>>()
            .join("|")
    );
    out.push_str(&outcome_line(state));
    out
}

fn outcome_line(state: &GameState) -> String {
    match state.result() {
        Outcome::Draw => "It's a draw!".to_string(),
        Outcome::X | Outcome::O => format!("{} wins!", state.result()),
        Outcome::Undecided => {
            // Sub-boards are numbered from 1 for people
            let next = match state.active_sub_board() {
                Some(sub_board) => format!("Sub-board {}", sub_board + 1),
                None => "Any available sub-board".to_string(),
            };
            format!("Current player: {}. Next move: {}", state.turn(), next)
        }
    }
}

pub fn render_moves(moves: &[Move]) -> String {
    if moves.is_empty() {
        return "No moves available".to_string();
    }
    moves
        .iter()
        .map(|mv| format!("{} {}", mv.sub_board, mv.cell))
        .collect::<Vec<String>>()
        .join(", ")
}
