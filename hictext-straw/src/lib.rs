//! # Reader for `.hic` contact-matrix files.
//!
//! A `.hic` file stores, for every chromosome pair, a set of zoom levels (resolutions)
//! whose contacts are split into zlib compressed blocks. A footer indexes the matrices,
//! the expected contact counts by distance and the normalization vectors.
//!
//! ```no_run
//! use hictext_core::models::{MatrixType, Normalization, Unit};
//! use hictext_straw::HicFile;
//!
//! let hic = HicFile::open("sample.hic").unwrap();
//! let zoom = hic
//!     .matrix_zoom_data("1", "1", MatrixType::Observed, &Normalization::KR, Unit::BP, 5000)
//!     .unwrap();
//! let matrix = zoom.records_as_matrix(0, 1_000_000, 0, 1_000_000).unwrap();
//! ```
//!
pub mod binary;
pub mod footer;
pub mod header;
pub mod zoom;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use std::sync::{Arc, OnceLock};

use log::debug;

use hictext_core::errors::{HicError, Result};
use hictext_core::models::{Chromosome, MatrixType, Normalization, Unit};
use hictext_core::utils::{ByteSource, get_byte_source};

pub use self::footer::{HicFooter, IndexEntry, VectorKey};
pub use self::header::HicHeader;
pub use self::zoom::{MatrixZoomData, ZoomMeta};

pub mod consts {
    pub const HIC_MAGIC: &[u8; 4] = b"HIC\0";
    pub const MIN_VERSION: i32 = 7;
    pub const MAX_VERSION: i32 = 9;
    /// first read when looking for the end of the header
    pub const HEADER_CHUNK: usize = 64 * 1024;
    /// first read past the `nBytes` block of a footer before version 9
    pub const FOOTER_CHUNK: usize = 64 * 1024;
}

///
/// An open `.hic` file, local or remote.
///
pub struct HicFile {
    source: Arc<dyn ByteSource>,
    header: HicHeader,
    footer: OnceLock<HicFooter>,
}

impl HicFile {
    ///
    /// Open a `.hic` file from a local path or an http(s) URL and read its header.
    ///
    pub fn open(locator: &str) -> Result<Self> {
        let source = get_byte_source(locator)?;
        HicFile::from_source(source)
    }

    ///
    /// Read the header of a `.hic` file from any byte source.
    ///
    pub fn from_source(source: Arc<dyn ByteSource>) -> Result<Self> {
        let header = HicHeader::read(source.as_ref())?;
        debug!(
            "Opened {} (version {}, genome {}, {} chromosomes)",
            source.location(),
            header.version,
            header.genome_id,
            header.chromosomes.len()
        );
        Ok(HicFile {
            source,
            header,
            footer: OnceLock::new(),
        })
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn genome_id(&self) -> &str {
        &self.header.genome_id
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.header.attributes
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.header.chromosomes
    }

    pub fn bp_resolutions(&self) -> &[i32] {
        &self.header.bp_resolutions
    }

    pub fn frag_resolutions(&self) -> &[i32] {
        &self.header.frag_resolutions
    }

    /// Chromosome at a position of the header list (0 is usually `All`).
    pub fn chromosome_by_index(&self, index: usize) -> Option<&Chromosome> {
        self.header.chromosomes.get(index)
    }

    ///
    /// Chromosome by name. An exact match wins, otherwise `1` and `chr1` are treated as
    /// the same name.
    ///
    pub fn chromosome_by_name(&self, name: &str) -> Option<&Chromosome> {
        let chromosomes = &self.header.chromosomes;
        chromosomes
            .iter()
            .find(|c| c.name == name)
            .or_else(|| chromosomes.iter().find(|c| c.matches(name)))
    }

    ///
    /// The footer, read on first use.
    ///
    pub fn footer(&self) -> Result<&HicFooter> {
        if let Some(footer) = self.footer.get() {
            return Ok(footer);
        }
        let footer = HicFooter::read(self.source.as_ref(), &self.header)?;
        Ok(self.footer.get_or_init(|| footer))
    }

    fn norm_vector(
        &self,
        footer: &HicFooter,
        normalization: &Normalization,
        chromosome: &Chromosome,
        unit: Unit,
        bin_size: i32,
    ) -> Result<Vec<f64>> {
        let key = (VectorKey::new(normalization, unit, bin_size), chromosome.index);
        let entry = footer
            .norm_vectors
            .get(&key)
            .ok_or_else(|| HicError::MissingNormalizationVector {
                normalization: normalization.to_string(),
                chromosome: chromosome.name.clone(),
                unit: unit.to_string(),
                resolution: bin_size,
            })?;
        self::footer::read_norm_vector(self.source.as_ref(), entry, self.header.version)
    }

    ///
    /// Prepare a chromosome pair at one resolution for queries.
    ///
    /// # Arguments
    ///
    /// - chr1, chr2: chromosome names
    /// - matrix_type: observed, observed over expected, or expected values
    /// - normalization: normalization vector type, `NONE` for raw counts
    /// - unit: BP or FRAG
    /// - bin_size: resolution
    ///
    pub fn matrix_zoom_data(
        &self,
        chr1: &str,
        chr2: &str,
        matrix_type: MatrixType,
        normalization: &Normalization,
        unit: Unit,
        bin_size: i32,
    ) -> Result<MatrixZoomData> {
        let c1 = self
            .chromosome_by_name(chr1)
            .ok_or_else(|| HicError::UnknownChromosome(chr1.to_string()))?;
        let c2 = self
            .chromosome_by_name(chr2)
            .ok_or_else(|| HicError::UnknownChromosome(chr2.to_string()))?;

        let swapped = c1.index > c2.index;
        let (first, second) = if swapped { (c2, c1) } else { (c1, c2) };

        let footer = self.footer()?;
        let key = format!("{}_{}", first.index, second.index);
        let entry = footer
            .master_index
            .get(&key)
            .ok_or_else(|| HicError::MissingMatrix(format!("{}_{}", first.name, second.name)))?;

        let body = self
            .source
            .read_range(entry.position as u64, entry.size as usize)?;
        let meta = ZoomMeta::find(body, unit, bin_size)?.ok_or_else(|| HicError::MissingResolution {
            pair: format!("{}_{}", first.name, second.name),
            unit: unit.to_string(),
            resolution: bin_size,
        })?;

        let (norm1, norm2) = if *normalization == Normalization::NONE {
            (Vec::new(), Vec::new())
        } else {
            (
                self.norm_vector(footer, normalization, first, unit, bin_size)?,
                self.norm_vector(footer, normalization, second, unit, bin_size)?,
            )
        };

        let expected = if matrix_type != MatrixType::Observed && first.index == second.index {
            footer
                .expected
                .get(&VectorKey::new(normalization, unit, bin_size))
                .ok_or_else(|| HicError::MissingExpectedVector {
                    normalization: normalization.to_string(),
                    unit: unit.to_string(),
                    resolution: bin_size,
                })?
                .for_chromosome(first.index)
        } else {
            Vec::new()
        };

        Ok(MatrixZoomData {
            source: Arc::clone(&self.source),
            version: self.header.version,
            chrom1: first.clone(),
            chrom2: second.clone(),
            swapped,
            matrix_type,
            normalization: normalization.clone(),
            meta,
            norm1,
            norm2,
            expected,
        })
    }
}
