#![forbid(unsafe_code)]

//! Support code for the `replay-pacer` binary.
//!
//! Config file loading and a seeded workload simulator that exercises the
//! pacer exactly as replay workers would, on a virtual clock.

/// Config file discovery, parsing and rendering.
pub mod config_file;

/// Synthetic workload simulation.
pub mod simulate;
