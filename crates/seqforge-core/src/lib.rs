//! SeqForge Core - model and neighbour contracts for local search
//!
//! This crate provides the fundamental abstractions for SeqForge:
//! - [`Model`]: variables, domains and incremental penalty queries
//! - [`Neighbour`] and [`LazyNeighbour`]: proposed transitions
//! - [`SeqForgeError`]: the error type shared by all crates

pub mod error;
pub mod model;
pub mod neighbour;

#[cfg(test)]
mod tests;

pub use error::{Result, SeqForgeError};
pub use model::{Info, Model};
pub use neighbour::{
    Candidate, Commit, LazyChangeNeighbour, LazyNeighbour, Neighbour, SimpleNeighbour,
    SwapNeighbour,
};
