//! Canvas data aggregation core.
//!
//! Everything here is a function of fetched Canvas snapshots plus an explicit
//! "now" — fetch, transform, return, discard. Nothing is persisted and nothing
//! reads the process environment; credential sourcing belongs to the caller.

pub mod canvas;
pub mod discussions;
pub mod error;
pub mod grades;
pub mod planner;
pub mod schedule;
