//! Terminal front end for the survey.

pub mod cli;
pub mod command;

pub use cli::{CliChannel, LineStream};
pub use command::{Command, CommandParser};
