use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read};
use std::str::FromStr;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use log::debug;
use ndarray::Array2;

use hictext_core::errors::{HicError, Result};
use hictext_core::models::{Chromosome, ContactRecord, MatrixType, Normalization, Unit};
use hictext_core::utils::ByteSource;

use crate::binary::{V9, read_cstring, read_short_or_int};
use crate::footer::IndexEntry;

/// Block encodings.
const LIST_OF_ROWS: u8 = 1;
const DENSE: u8 = 2;

/// Empty cell of a dense block with short counts.
const DENSE_SHORT_EMPTY: i16 = i16::MIN;

///
/// One resolution level of a chromosome-pair matrix: its block layout and where the
/// blocks live.
///
#[derive(Debug, Clone)]
pub struct ZoomMeta {
    pub unit: Unit,
    pub bin_size: i32,
    pub sum_counts: f32,
    pub block_bin_count: i32,
    pub block_column_count: i32,
    pub blocks: HashMap<i32, IndexEntry>,
}

impl ZoomMeta {
    ///
    /// Scan a serialized matrix body for the zoom level with the given unit and bin size.
    ///
    pub fn find(bytes: Vec<u8>, unit: Unit, bin_size: i32) -> Result<Option<ZoomMeta>> {
        let mut reader = Cursor::new(bytes);

        let _chr1 = reader.read_i32::<LittleEndian>()?;
        let _chr2 = reader.read_i32::<LittleEndian>()?;
        let n_resolutions = reader.read_i32::<LittleEndian>()?;

        for _ in 0..n_resolutions {
            let zoom_unit = Unit::from_str(&read_cstring(&mut reader)?)?;
            let _old_index = reader.read_i32::<LittleEndian>()?;
            let sum_counts = reader.read_f32::<LittleEndian>()?;
            let _occupied_cell_count = reader.read_f32::<LittleEndian>()?;
            let _std_dev = reader.read_f32::<LittleEndian>()?;
            let _percent95 = reader.read_f32::<LittleEndian>()?;
            let zoom_bin_size = reader.read_i32::<LittleEndian>()?;
            let block_bin_count = reader.read_i32::<LittleEndian>()?;
            let block_column_count = reader.read_i32::<LittleEndian>()?;

            let n_blocks = reader.read_i32::<LittleEndian>()?;
            let mut blocks = HashMap::with_capacity(n_blocks.max(0) as usize);
            for _ in 0..n_blocks {
                let number = reader.read_i32::<LittleEndian>()?;
                let position = reader.read_i64::<LittleEndian>()?;
                let size = reader.read_i32::<LittleEndian>()? as i64;
                blocks.insert(number, IndexEntry { position, size });
            }

            if zoom_unit == unit && zoom_bin_size == bin_size {
                return Ok(Some(ZoomMeta {
                    unit: zoom_unit,
                    bin_size: zoom_bin_size,
                    sum_counts,
                    block_bin_count,
                    block_column_count,
                    blocks,
                }));
            }
        }

        Ok(None)
    }

    ///
    /// Blocks covering a region given in bin coordinates `[x0, x1, y0, y1]`, for the grid
    /// layout of files before version 9 and of inter-chromosomal matrices.
    ///
    pub fn grid_block_numbers(&self, region: [i64; 4], intra: bool) -> BTreeSet<i32> {
        let bbc = self.block_bin_count.max(1) as i64;
        let bcc = self.block_column_count as i64;

        let col1 = region[0] / bbc;
        let col2 = (region[1] + 1) / bbc;
        let row1 = region[2] / bbc;
        let row2 = (region[3] + 1) / bbc;

        let mut numbers = BTreeSet::new();
        for row in row1..=row2 {
            for col in col1..=col2 {
                numbers.insert((row * bcc + col) as i32);
            }
        }

        // intra-chromosomal data is stored once, look at the transposed region too
        if intra {
            for row in col1..=col2 {
                for col in row1..=row2 {
                    numbers.insert((row * bcc + col) as i32);
                }
            }
        }

        numbers
    }

    ///
    /// Blocks covering a region for the version 9 intra-chromosomal layout, where blocks
    /// are laid out along the diagonal (position) and away from it (depth).
    ///
    pub fn diagonal_block_numbers(&self, region: [i64; 4]) -> BTreeSet<i32> {
        let [bin_x1, bin_x2, bin_y1, bin_y2] = region;
        let bbc = self.block_bin_count.max(1) as i64;
        let bcc = self.block_column_count as i64;

        let lower_pad = (bin_x1 + bin_y1) / 2 / bbc;
        let higher_pad = (bin_x2 + bin_y2) / 2 / bbc + 1;

        let depth = |a: i64, b: i64| -> i64 {
            (1.0 + (a - b).abs() as f64 / std::f64::consts::SQRT_2 / bbc as f64).log2() as i64
        };
        let nearer = depth(bin_x1, bin_y2);
        let further = depth(bin_x2, bin_y1);

        let crosses_diagonal = (bin_x1 > bin_y2 && bin_x2 < bin_y1) || (bin_x2 > bin_y1 && bin_x1 < bin_y2);
        let nearer_depth = if crosses_diagonal { 0 } else { nearer.min(further) };
        let further_depth = nearer.max(further) + 1;

        let mut numbers = BTreeSet::new();
        for depth in nearer_depth..=further_depth {
            for pad in lower_pad..=higher_pad {
                numbers.insert((depth * bcc + pad) as i32);
            }
        }
        numbers
    }
}

///
/// Decode an uncompressed block into `(bin_x, bin_y, counts)` triples.
///
pub fn decode_block(bytes: &[u8], version: i32, number: i32) -> Result<Vec<(i64, i64, f32)>> {
    let mut reader = Cursor::new(bytes);

    let n_records = reader.read_i32::<LittleEndian>()?;
    let mut records = Vec::with_capacity(n_records.max(0) as usize);

    let bin_x_offset = reader.read_i32::<LittleEndian>()? as i64;
    let bin_y_offset = reader.read_i32::<LittleEndian>()? as i64;
    let use_short = reader.read_u8()? == 0;

    let (use_short_bin_x, use_short_bin_y) = if version >= V9 {
        (reader.read_u8()? == 0, reader.read_u8()? == 0)
    } else {
        (true, true)
    };

    let read_counts = |reader: &mut Cursor<&[u8]>| -> Result<f32> {
        if use_short {
            Ok(reader.read_i16::<LittleEndian>()? as f32)
        } else {
            Ok(reader.read_f32::<LittleEndian>()?)
        }
    };

    match reader.read_u8()? {
        LIST_OF_ROWS => {
            let row_count = read_short_or_int(&mut reader, use_short_bin_y)?;
            for _ in 0..row_count {
                let bin_y = bin_y_offset + read_short_or_int(&mut reader, use_short_bin_y)? as i64;
                let col_count = read_short_or_int(&mut reader, use_short_bin_x)?;
                for _ in 0..col_count {
                    let bin_x = bin_x_offset + read_short_or_int(&mut reader, use_short_bin_x)? as i64;
                    let counts = read_counts(&mut reader)?;
                    records.push((bin_x, bin_y, counts));
                }
            }
        }
        DENSE => {
            let n_points = reader.read_i32::<LittleEndian>()?;
            let width = reader.read_i16::<LittleEndian>()? as i32;
            if width <= 0 && n_points > 0 {
                return Err(HicError::CorruptedBlock {
                    block: number,
                    reason: format!("dense block with width {}", width),
                });
            }
            for i in 0..n_points {
                let row = i / width;
                let col = i - row * width;
                let bin_x = bin_x_offset + col as i64;
                let bin_y = bin_y_offset + row as i64;
                if use_short {
                    let counts = reader.read_i16::<LittleEndian>()?;
                    if counts != DENSE_SHORT_EMPTY {
                        records.push((bin_x, bin_y, counts as f32));
                    }
                } else {
                    let counts = reader.read_f32::<LittleEndian>()?;
                    if !counts.is_nan() {
                        records.push((bin_x, bin_y, counts));
                    }
                }
            }
        }
        other => {
            return Err(HicError::CorruptedBlock {
                block: number,
                reason: format!("unknown block type {}", other),
            });
        }
    }

    Ok(records)
}

///
/// Contact data of one chromosome pair at one resolution, ready to be queried.
///
/// Created by [`crate::HicFile::matrix_zoom_data`], which resolves the zoom level and
/// loads the normalization and expected vectors the query needs.
///
pub struct MatrixZoomData {
    pub(crate) source: Arc<dyn ByteSource>,
    pub(crate) version: i32,
    pub(crate) chrom1: Chromosome,
    pub(crate) chrom2: Chromosome,
    /// the caller asked for the pair in the opposite order of the file's index order
    pub(crate) swapped: bool,
    pub(crate) matrix_type: MatrixType,
    pub(crate) normalization: Normalization,
    pub(crate) meta: ZoomMeta,
    pub(crate) norm1: Vec<f64>,
    pub(crate) norm2: Vec<f64>,
    pub(crate) expected: Vec<f64>,
}

impl MatrixZoomData {
    pub fn bin_size(&self) -> i32 {
        self.meta.bin_size
    }

    pub fn unit(&self) -> Unit {
        self.meta.unit
    }

    pub fn matrix_type(&self) -> MatrixType {
        self.matrix_type
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// The chromosome pair in file order (lower index first).
    pub fn chromosomes(&self) -> (&Chromosome, &Chromosome) {
        (&self.chrom1, &self.chrom2)
    }

    pub fn is_intra(&self) -> bool {
        self.chrom1.index == self.chrom2.index
    }

    /// Average count per cell, the expected value of inter-chromosomal matrices.
    fn average_count(&self) -> f64 {
        let bin_size = self.meta.bin_size;
        let bins1 = self.chrom1.bin_count(bin_size) as f64;
        let bins2 = self.chrom2.bin_count(bin_size) as f64;
        (self.meta.sum_counts as f64 / bins1) / bins2
    }

    fn block_numbers(&self, region: [i64; 4]) -> BTreeSet<i32> {
        if self.version >= V9 && self.is_intra() {
            self.meta.diagonal_block_numbers(region)
        } else {
            self.meta.grid_block_numbers(region, self.is_intra())
        }
    }

    fn read_block(&self, number: i32) -> Result<Vec<(i64, i64, f32)>> {
        let entry = match self.meta.blocks.get(&number) {
            Some(entry) => entry,
            // blocks without any contact are not stored
            None => return Ok(Vec::new()),
        };

        let compressed = self.source.read_range(entry.position as u64, entry.size as usize)?;
        let mut bytes = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut bytes)
            .map_err(|e| HicError::CorruptedBlock {
                block: number,
                reason: e.to_string(),
            })?;

        decode_block(&bytes, self.version, number)
    }

    fn normalized_value(&self, bin_x: i64, bin_y: i64, counts: f32) -> f32 {
        let mut value = counts as f64;

        if self.normalization != Normalization::NONE {
            let n1 = self.norm1.get(bin_x as usize).copied().unwrap_or(f64::NAN);
            let n2 = self.norm2.get(bin_y as usize).copied().unwrap_or(f64::NAN);
            value /= n1 * n2;
        }

        let expected = || -> f64 {
            if self.is_intra() {
                if self.expected.is_empty() {
                    return f64::NAN;
                }
                let distance = (bin_y - bin_x).unsigned_abs() as usize;
                self.expected[distance.min(self.expected.len() - 1)]
            } else {
                self.average_count()
            }
        };

        match self.matrix_type {
            MatrixType::Observed => value as f32,
            MatrixType::Oe => (value / expected()) as f32,
            MatrixType::Expected => expected() as f32,
        }
    }

    ///
    /// Contact records inside a region given in genomic coordinates (inclusive).
    ///
    /// `x` runs along the first chromosome passed to `matrix_zoom_data`, `y` along the
    /// second. Returned positions are genomic (bin index times bin size) in file order.
    ///
    pub fn records(&self, x0: i64, x1: i64, y0: i64, y1: i64) -> Result<Vec<ContactRecord>> {
        let region = if self.swapped {
            [y0, y1, x0, x1]
        } else {
            [x0, x1, y0, y1]
        };
        let bin_size = self.meta.bin_size as i64;
        let bin_region = [
            region[0] / bin_size,
            region[1] / bin_size,
            region[2] / bin_size,
            region[3] / bin_size,
        ];

        let inside = |x: i64, y: i64| -> bool {
            x >= region[0] && x <= region[1] && y >= region[2] && y <= region[3]
        };

        let blocks = self.block_numbers(bin_region);
        debug!(
            "Reading {} candidate blocks for {}_{} at {} {}",
            blocks.len(),
            self.chrom1.name,
            self.chrom2.name,
            self.meta.bin_size,
            self.meta.unit
        );

        let mut records = Vec::new();
        for number in blocks {
            for (bin_x, bin_y, counts) in self.read_block(number)? {
                let x = bin_x * bin_size;
                let y = bin_y * bin_size;
                if inside(x, y) || (self.is_intra() && inside(y, x)) {
                    let value = self.normalized_value(bin_x, bin_y, counts);
                    records.push(ContactRecord::new(x, y, value));
                }
            }
        }

        Ok(records)
    }

    ///
    /// Dense matrix of a region given in genomic coordinates (inclusive).
    ///
    /// Rows follow `x`, columns follow `y`. Intra-chromosomal cells are mirrored, NaN and
    /// infinite values stay zero. A region without any contact yields a 1x1 zero matrix.
    ///
    pub fn records_as_matrix(&self, x0: i64, x1: i64, y0: i64, y1: i64) -> Result<Array2<f32>> {
        let records = self.records(x0, x1, y0, y1)?;
        if records.is_empty() {
            return Ok(Array2::zeros((1, 1)));
        }

        // rows follow the file's first chromosome until the end, then flip if needed
        let (x0, x1, y0, y1) = if self.swapped {
            (y0, y1, x0, x1)
        } else {
            (x0, x1, y0, y1)
        };

        let bin_size = self.meta.bin_size as i64;
        let bin_x0 = x0 / bin_size;
        let bin_y0 = y0 / bin_size;
        let n_rows = (x1 / bin_size + 1 - bin_x0).max(0) as usize;
        let n_cols = (y1 / bin_size + 1 - bin_y0).max(0) as usize;

        let mut matrix = Array2::<f32>::zeros((n_rows, n_cols));
        let mut place = |row: i64, col: i64, value: f32| {
            if row >= 0 && col >= 0 && (row as usize) < n_rows && (col as usize) < n_cols {
                matrix[[row as usize, col as usize]] = value;
            }
        };

        for record in records.iter().filter(|r| r.counts.is_finite()) {
            let bin_x = record.bin_x / bin_size;
            let bin_y = record.bin_y / bin_size;
            place(bin_x - bin_x0, bin_y - bin_y0, record.counts);
            if self.is_intra() {
                place(bin_y - bin_x0, bin_x - bin_y0, record.counts);
            }
        }

        if self.swapped {
            Ok(matrix.reversed_axes())
        } else {
            Ok(matrix)
        }
    }
}
