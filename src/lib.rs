//! Battery energy storage dispatch simulator.
//!
//! Replays a half-hourly price series through a battery under a greedy or
//! bounded-lookahead policy and reports the per-period ledger and EBITDA.

/// Battery parameters and state of charge.
pub mod battery;
pub mod config;
pub mod error;
pub mod runner;
pub mod signal;
/// Simulation engine, dispatch policies, and economic aggregation.
pub mod sim;
