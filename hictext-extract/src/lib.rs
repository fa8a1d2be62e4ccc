//! # Hi-C matrix extraction
//!
//! For every resolution, chromosome and data type, fetches the KR normalized
//! intra-chromosomal matrix of a `.hic` file and writes it twice: as sparse
//! `short score` text and as an HDF5 array. A combined text file per data type
//! collects every resolution and chromosome. Outputs that already exist are skipped.
//!
//! ```no_run
//! use hictext_extract::{ExtractConfig, extract_hic_data};
//!
//! let config = ExtractConfig {
//!     path: "/data/run1/".to_string(),
//!     hic_url: "https://example.org/sample.hic".to_string(),
//!     resolutions: "5000,10000".to_string(),
//!     chromosomes: "1,2".to_string(),
//!     data_types: "observed,oe".to_string(),
//! };
//! extract_hic_data(&config);
//! ```
//!
pub mod consts;
pub mod error;
pub mod extract;
pub mod inputs;
pub mod paths;
pub mod source;
pub mod writing;

// re-exports
pub use error::*;
pub use extract::*;
pub use inputs::*;
pub use paths::*;
pub use source::*;
