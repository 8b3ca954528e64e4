//! # GCSA: prefix-sorted graph construction
//!
//! This crate builds the core artifact of a graph FM-index: a labelled,
//! reverse-deterministic automaton over a reference sequence and its known
//! variants, whose nodes have been assigned a total order by the infinite
//! paths leaving them. The construction has two stages:
//!
//! * [`graph::RefGraph`] turns the reference and the variants into an
//!   automaton and makes it reverse-deterministic by backward subset
//!   construction. Large references are built in shards by worker threads
//!   and stitched together through temporary spill files.
//! * [`path::PathGraph`] sorts the automaton by prefix doubling: path labels
//!   of length `2^k` are extended to `2^(k+1)` until every node is uniquely
//!   identified by its outgoing label sequence. The sorted graph then yields
//!   the BWT-ordered edge list and the `(bwt, F, M, position)` row stream
//!   that downstream index builders consume.
//!
//! # References
//!
//! Jouni Sirén, Niko Välimäki, and Veli Mäkinen:
//! **Indexing Graphs for Path Queries with Applications in Genome Research**.\
//! IEEE/ACM Transactions on Computational Biology and Bioinformatics 11(2):375-388, 2014.
//! DOI: [10.1109/TCBB.2013.2297101](https://doi.org/10.1109/TCBB.2013.2297101)
//!
//! # Notes
//!
//! * Node identifiers and genomic positions are `usize` in memory; the
//!   [`Config::large_index`] option only selects the integer width of the
//!   spill files written during a sharded build.
//! * Ambiguous bases are expected to be resolved by the input stage: the
//!   reference is a sequence of 2-bit base codes.

pub mod graph;
pub mod path;
pub mod sort;

// Shared internal code for the binaries.
#[cfg(feature = "binaries")]
#[doc(hidden)]
pub mod internal;

use std::path::PathBuf;
use std::io;

use thiserror::Error;

pub use crate::graph::{RefGraph, SequenceChunk, Variant, VariantKind};
pub use crate::path::{PathGraph, BwtRow};

//-----------------------------------------------------------------------------

/// Value of the `to` field marking a path node that is uniquely identified by
/// its path label and no longer needs extending.
pub const PATH_SORTED: usize = usize::MAX;

/// Value of [`graph::Node::value`] for bases introduced by insertions, which
/// have no position in the reference.
pub const UNKNOWN_POSITION: usize = usize::MAX;

/// Placeholder identifier for the head and tail nodes dropped while stitching
/// shards together.
pub const INVALID_NODE: usize = usize::MAX;

/// Reference length at which construction switches from a single in-memory
/// automaton to sharded construction through spill files.
pub const SHARDED_THRESHOLD: usize = 1 << 16;

//-----------------------------------------------------------------------------

/// Byte order of the integers in spill files.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Endianness {
    /// Little-endian byte order.
    #[default]
    Little,
    /// Big-endian byte order.
    Big,
}

/// Construction parameters shared by both graph stages.
///
/// # Examples
///
/// ```
/// use gcsa::Config;
///
/// let config = Config {
///     threads: 4,
///     verbose: true,
///     ..Config::default()
/// };
/// assert!(!config.large_index);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of worker threads for the parallel phases.
    pub threads: usize,
    /// Byte order of spill-file integers.
    pub endianness: Endianness,
    /// Print progress information to stderr.
    pub verbose: bool,
    /// Write 64-bit instead of 32-bit identifiers to spill files.
    pub large_index: bool,
    /// Skip invalid variants instead of failing.
    pub lenient: bool,
    /// Base name for spill files; shard `i` spills to `<spill_base>.<i>.rf`.
    pub spill_base: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: 1,
            endianness: Endianness::default(),
            verbose: false,
            large_index: false,
            lenient: false,
            spill_base: PathBuf::from("refgraph"),
        }
    }
}

//-----------------------------------------------------------------------------

/// Errors from graph construction.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// A variant is malformed: position out of range, zero length, or a
    /// substitution equal to the reference.
    #[error("invalid variant at position {pos}: {reason}")]
    InvalidVariant {
        /// Reference position of the variant.
        pos: usize,
        /// Reason for the rejection.
        reason: &'static str,
    },

    /// A worker failed during a sharded build.
    #[error("shard {shard} failed: {reason}")]
    ShardFailed {
        /// Identifier of the failed shard.
        shard: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A sanity check failed after a construction phase.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// A node array could not be allocated.
    #[error("cannot allocate {0} records")]
    OutOfMemory(usize),

    /// A spill-file read or write failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

// Reserves space for `len` records, surfacing allocation failure as
// `ConstructionError::OutOfMemory`.
pub(crate) fn try_alloc<T>(len: usize) -> Result<Vec<T>, ConstructionError> {
    let mut result: Vec<T> = Vec::new();
    result.try_reserve_exact(len).map_err(|_| ConstructionError::OutOfMemory(len))?;
    Ok(result)
}

//-----------------------------------------------------------------------------
