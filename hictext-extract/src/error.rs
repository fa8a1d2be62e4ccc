use std::io;
use std::num::ParseIntError;

use thiserror::Error;

use hictext_core::errors::HicError;

/// Error type for extraction runs.
///
/// Every variant maps to one step of a run. The driver logs them and moves on, only
/// `Open` and `Parse` end a run.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The Hi-C data source could not be opened.
    #[error("Failed to open Hi-C data source {locator}: {source}")]
    Open {
        locator: String,
        #[source]
        source: HicError,
    },

    /// A resolution in the input list is not an integer.
    #[error("Failed to parse inputs: invalid resolution '{value}': {source}")]
    Parse {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The chromosome identifier is not an index of the file's chromosome list.
    #[error("Chromosome {0} not found in the chromosome list")]
    ChromosomeLookup(String),

    /// A resolution parsed fine but no `.hic` zoom level can have that bin size.
    #[error("Failed to get matrix data: resolution {0} is out of range")]
    ResolutionOutOfRange(i64),

    /// The matrix could not be read from the data source.
    #[error("Failed to get matrix data: {0}")]
    Fetch(#[from] HicError),

    #[error("Failed to save short form text {path}: {source}")]
    SparseWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save HDF5 matrix {path}: {source}")]
    DenseWrite {
        path: String,
        #[source]
        source: hdf5::Error,
    },

    #[error("Failed to save combined short form text {path}: {source}")]
    CombinedWrite {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
