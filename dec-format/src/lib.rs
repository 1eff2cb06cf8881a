//! This crate contains abstractions for the file formats used to exchange decompositions of
//! constraint systems.
//!
//! A block assignment file (`.dec`) lists, per block, the names of the constraints in that block,
//! and optionally the constraints which are forced into the master. See [`BlockFile`] for reading
//! and writing them. A partition file assigns a block to every node of a graph built from the
//! constraint system; see [`PartitionFile`].

mod block_file;
mod partition_file;

pub mod reader;
pub mod writer;

pub use block_file::*;
pub use partition_file::*;
