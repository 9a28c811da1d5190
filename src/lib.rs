//! tradelog — analytics backend for a personal trading journal.
//!
//! Hexagonal architecture: pure analytics in [`domain`], collaborator traits
//! in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
