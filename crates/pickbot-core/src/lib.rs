//! Pickbot Core — the roster model and everything the other crates share.
//!
//! This crate contains:
//! - **types**: members, overrides and directory user records
//! - **roster**: roster generations, the override ledger, team resolution and building
//! - **picker**: random member selection with an injected random source
//! - **flair**: per-user display flair
//! - **state**: the two lock domains shared by the bot and the refresh task
//! - **bus**: inbound/outbound message plumbing between channels and the bot
//! - **config**: config schema, loading and env var overrides
//! - **refresh**: periodic roster refresh service

pub mod bus;
pub mod config;
pub mod error;
pub mod flair;
pub mod picker;
pub mod refresh;
pub mod roster;
pub mod state;
pub mod types;
pub mod utils;

pub use error::PickError;
pub use flair::{display_mention, FlairRegistry};
pub use picker::{pick, RandomSource, StdRandom};
pub use roster::{Roster, RosterGeneration, TeamBook};
pub use state::{ResolvedTeam, TeamState};
pub use types::{BotProfile, Member, Override, ProfileOverride, UserRecord};
