mod args;
mod commands;
mod context;
mod handlers;
mod output;
pub mod types;

pub use args::{Cli, Commands};
pub use commands::run;
