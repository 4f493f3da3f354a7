//! Terrapilot agent library — config resolution, keyword intent
//! matching, and query dispatch.
//!
//! `main.rs` wires these into the stdio loop; integration tests drive
//! the dispatcher directly.

pub mod config;
pub mod dispatch;
pub mod intent;
