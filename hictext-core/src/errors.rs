use thiserror::Error;

#[derive(Error, Debug)]
pub enum HicError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Can't get file from path or url: {0}")]
    InvalidPathOrUrl(String),

    #[error("File not found and HTTP feature not enabled: {0}")]
    HttpFeatureDisabled(String),

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Not a .hic file (bad magic string): {0}")]
    BadMagic(String),

    #[error("Unsupported .hic version {0}, only versions 7 to 9 are supported")]
    UnsupportedVersion(i32),

    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Unknown matrix type: {0}")]
    UnknownMatrixType(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("No matrix found for chromosome pair {0}")]
    MissingMatrix(String),

    #[error("Resolution {resolution} ({unit}) not found for chromosome pair {pair}")]
    MissingResolution {
        pair: String,
        unit: String,
        resolution: i32,
    },

    #[error("File did not contain {normalization} normalization vectors for chromosome {chromosome} at {resolution} {unit}")]
    MissingNormalizationVector {
        normalization: String,
        chromosome: String,
        unit: String,
        resolution: i32,
    },

    #[error("File did not contain {normalization} expected values at {resolution} {unit}")]
    MissingExpectedVector {
        normalization: String,
        unit: String,
        resolution: i32,
    },

    #[error("Corrupted block {block}: {reason}")]
    CorruptedBlock { block: i32, reason: String },

    #[error("Invalid string in file: {0}")]
    InvalidString(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for hictext operations.
pub type Result<T> = std::result::Result<T, HicError>;
