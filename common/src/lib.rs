pub mod messages;
mod ultimate;

pub use ultimate::*;
