//! Data layer for climb-log.
//!
//! Parses plain-text session logs into the canonical corpus, reads and
//! writes the corpus document, repairs missing measurements and aggregates
//! performance statistics over a selection of sessions.

pub mod aggregator;
pub mod analysis;
pub mod interpolate;
pub mod parser;
pub mod reader;

pub use climb_core as core;
