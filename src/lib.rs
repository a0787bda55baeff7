//! Mural - terminal chat and image-generation client for the Gemini API
//!
//! This library provides the core request building, API client,
//! transcript state machine, and session orchestration, plus a small
//! static file server for hosting the app bundle.

pub mod adapters;
pub mod api;
pub mod error;
pub mod server;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod ui;

pub use error::{Error, Result};
