//! # Batch Fan-out / Fan-in
//!
//! The three stages that turn one large identifier list into many bounded
//! remote queries and back into one ordered result:
//!
//! - [`planner`] splits identifiers into index-tagged chunks
//! - [`executor`] runs one concurrent task per chunk and drains them all
//! - [`assembler`] restores input order and applies the all-or-nothing policy

pub mod assembler;
pub mod executor;
pub mod planner;

pub use assembler::{assemble, ChunkOutcome};
pub use executor::{ExecutionContext, ParallelExecutor};
pub use planner::{plan, Chunk};
