//! Pickbot Bot — turns chat messages into roster operations.
//!
//! - **commands**: the tokenizing command parser
//! - **assign**: pull request assignee/reviewer requests for a picked member
//! - **bot**: the `Bot` that consumes the message bus and replies

pub mod assign;
pub mod bot;
pub mod commands;

#[cfg(test)]
mod testing;

pub use assign::{AssignError, Assigner, AssignmentReport};
pub use bot::Bot;
pub use commands::{addressed_to, parse, Command};
