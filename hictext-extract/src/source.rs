use std::str::FromStr;

use log::debug;
use ndarray::Array2;

use hictext_core::models::{MatrixType, Normalization, Unit};
use hictext_straw::HicFile;

use crate::error::{ExtractError, Result};

///
/// What the extraction driver needs from a Hi-C data handle.
///
pub trait ContactSource {
    ///
    /// Length in base pairs of a chromosome, given its position in the chromosome list
    /// (`"1"` is the second entry of a `.hic` file, after `All`). Negative positions
    /// count from the end of the list.
    ///
    fn chromosome_length(&self, chromosome: &str) -> Result<i64>;

    ///
    /// Dense intra-chromosomal matrix covering `0..=end` on both axes.
    ///
    /// # Arguments
    ///
    /// - chromosome: chromosome name
    /// - data_type: matrix type, `observed`, `oe` or `expected`
    /// - normalization: normalization vector type
    /// - resolution: bin size in base pairs
    /// - end: last base pair of the region
    ///
    fn fetch_matrix(
        &self,
        chromosome: &str,
        data_type: &str,
        normalization: &str,
        resolution: i64,
        end: i64,
    ) -> Result<Array2<f32>>;
}

impl ContactSource for HicFile {
    fn chromosome_length(&self, chromosome: &str) -> Result<i64> {
        let count = self.chromosomes().len() as i64;
        chromosome
            .trim()
            .parse::<i64>()
            .ok()
            .map(|index| if index < 0 { count + index } else { index })
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.chromosome_by_index(index))
            .map(|c| c.length)
            .ok_or_else(|| ExtractError::ChromosomeLookup(chromosome.to_string()))
    }

    fn fetch_matrix(
        &self,
        chromosome: &str,
        data_type: &str,
        normalization: &str,
        resolution: i64,
        end: i64,
    ) -> Result<Array2<f32>> {
        let bin_size = i32::try_from(resolution).map_err(|_| ExtractError::ResolutionOutOfRange(resolution))?;
        let matrix_type = MatrixType::from_str(data_type)?;
        let normalization = Normalization::from_str(normalization)?;

        let zoom = self.matrix_zoom_data(
            chromosome,
            chromosome,
            matrix_type,
            &normalization,
            Unit::BP,
            bin_size,
        )?;
        let matrix = zoom.records_as_matrix(0, end, 0, end)?;
        debug!(
            "Fetched {} {} matrix of chromosome {} at {} ({} x {})",
            matrix_type,
            normalization,
            chromosome,
            resolution,
            matrix.nrows(),
            matrix.ncols()
        );

        Ok(matrix)
    }
}
