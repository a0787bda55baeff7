//! Adapters module — user-facing channels.
//!
//! A channel wraps a session and turns transcript content into
//! something a person can see. The CLI channel renders to the terminal
//! and writes generated images to disk.

pub mod cli;

pub use cli::ChatChannel;
