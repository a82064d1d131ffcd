//! Shared building blocks for climb-log.
//!
//! The session data model, grade and timestamp handling, the error type,
//! command-line settings and text formatting used by the data layer and the
//! `climb-log` binary.

pub mod error;
pub mod formatting;
pub mod grade;
pub mod models;
pub mod settings;
pub mod timestamps;
