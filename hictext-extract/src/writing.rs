use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use crate::consts::{MATRIX_DATASET, VALUE_PRECISION};
use crate::error::{ExtractError, Result};

///
/// Write the nonzero upper triangular cells (`i <= j`) of a matrix as sparse lines.
///
/// Each line is `0 {chrom} {pos_i} 0 0 {chrom} {pos_j} 1 {value}` where positions are the
/// bin index times the resolution and the value has five decimals.
///
/// Returns the number of lines written.
///
pub fn write_upper_triangle<W: Write>(
    writer: &mut W,
    matrix: &Array2<f32>,
    chromosome: &str,
    resolution: i64,
) -> std::io::Result<usize> {
    let (n_rows, n_cols) = matrix.dim();
    let mut n_lines = 0;

    for i in 0..n_rows {
        for j in i..n_cols {
            let value = matrix[[i, j]];
            if value != 0.0 {
                writeln!(
                    writer,
                    "0 {} {} 0 0 {} {} 1 {:.*}",
                    chromosome,
                    resolution * i as i64,
                    chromosome,
                    resolution * j as i64,
                    VALUE_PRECISION,
                    value as f64
                )?;
                n_lines += 1;
            }
        }
    }

    Ok(n_lines)
}

///
/// Create the sparse text file of one triple.
///
pub fn write_sparse(path: &Path, matrix: &Array2<f32>, chromosome: &str, resolution: i64) -> Result<usize> {
    let sparse_error = |source: std::io::Error| ExtractError::SparseWrite {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(sparse_error)?;
    let mut writer = BufWriter::new(file);
    let n_lines = write_upper_triangle(&mut writer, matrix, chromosome, resolution).map_err(sparse_error)?;
    writer.flush().map_err(sparse_error)?;

    Ok(n_lines)
}

///
/// Create the HDF5 file of one triple with the full matrix under the `matrix` dataset.
///
pub fn write_dense(path: &Path, matrix: &Array2<f32>) -> Result<()> {
    let dense_error = |source: hdf5::Error| ExtractError::DenseWrite {
        path: path.display().to_string(),
        source,
    };

    let file = hdf5::File::create(path).map_err(dense_error)?;
    file.new_dataset_builder()
        .with_data(matrix)
        .create(MATRIX_DATASET)
        .map_err(dense_error)?;

    Ok(())
}

///
/// The combined text file of one data type. Contributions are appended in call order.
///
/// A failed append leaves the writer usable for the next contribution.
///
pub struct CombinedWriter<W: Write = BufWriter<File>> {
    path: String,
    writer: W,
    n_lines: usize,
}

impl CombinedWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| ExtractError::CombinedWrite {
            path: path.display().to_string(),
            source,
        })?;
        Ok(CombinedWriter::from_writer(path.display().to_string(), BufWriter::new(file)))
    }
}

impl<W: Write> CombinedWriter<W> {
    /// `path` only names the output in errors.
    pub fn from_writer(path: String, writer: W) -> Self {
        CombinedWriter {
            path,
            writer,
            n_lines: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn append(&mut self, matrix: &Array2<f32>, chromosome: &str, resolution: i64) -> Result<usize> {
        let n = write_upper_triangle(&mut self.writer, matrix, chromosome, resolution).map_err(|source| {
            ExtractError::CombinedWrite {
                path: self.path.clone(),
                source,
            }
        })?;
        self.n_lines += n;
        Ok(n)
    }

    /// Flush and close, returning the number of lines in the file.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|source| ExtractError::CombinedWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.n_lines)
    }
}
