//! Persistence-and-sync protocol.
//!
//! Load: store → decode → validate → typed value.
//! Update: validate → encode → store → broadcast.
//! Remote update: broadcast → decode → validate → callback.
//!
//! Errors never cross these calls during steady state; they are handed to
//! the configured `on_error` callback instead.

pub mod controller;
pub mod handle;
mod payload;

pub use controller::{SyncController, Update};
pub use handle::{SyncState, SyncedKey};
