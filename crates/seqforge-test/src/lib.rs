//! Shared test fixtures for SeqForge crates.
//!
//! This crate provides models for testing. It depends only on `seqforge-core`
//! so the solver crate can use it as a dev-dependency without a cycle.
//!
//! - [`penalty`] - independent per-variable penalties, no conflicts
//! - [`timetable`] - events in (period, room) slots with curriculum conflicts
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! seqforge-test = { workspace = true }
//! ```

pub mod penalty;
pub mod timetable;

pub use penalty::PenaltyModel;
pub use timetable::{Event, Placement, TimetableModel};
