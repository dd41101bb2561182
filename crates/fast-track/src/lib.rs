//! Fast Track leaderboard: sprint scoring, dense ranking, and the service plumbing around them.

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod roster;
pub mod telemetry;
