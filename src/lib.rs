//! Adaptive replay pacing for the Sombra storage server.
//!
//! A background process replays the write-ahead log so reads can be served
//! at a requested LSN. The [`pacer::ReplayPacer`] watches three pressure
//! signals (replay throughput, hot misses, WAL ingest) and publishes a replay
//! budget that replay workers consult once per invocation.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod pacer;
pub mod types;
