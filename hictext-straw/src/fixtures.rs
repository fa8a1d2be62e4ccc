//! Synthetic `.hic` files for tests.
//!
//! Builds small but complete files (header, zlib blocks, matrix bodies, normalization
//! vectors, footer) for versions 8 and 9 so readers can be exercised against real byte
//! layouts without shipping binary test data.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::binary::V9;
use crate::consts::HIC_MAGIC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEncoding {
    ListOfRows,
    Dense,
}

#[derive(Debug, Clone)]
struct FixtureMatrix {
    chr1: i32,
    chr2: i32,
    bin_size: i32,
    contacts: Vec<(i64, i64, f32)>,
}

#[derive(Debug, Clone)]
struct FixtureVector {
    normalization: String,
    chromosome: i32,
    bin_size: i32,
    values: Vec<f64>,
}

#[derive(Debug, Clone)]
struct FixtureExpected {
    normalization: String,
    bin_size: i32,
    values: Vec<f64>,
    factors: Vec<(i32, f64)>,
}

///
/// Builder for an in-memory `.hic` file.
///
/// Chromosome indices follow the file convention: 0 is the `All` pseudo chromosome that
/// is added automatically, user chromosomes start at 1 in insertion order.
///
#[derive(Debug, Clone)]
pub struct HicFixture {
    version: i32,
    genome_id: String,
    chromosomes: Vec<(String, i64)>,
    resolutions: Vec<i32>,
    block_bin_count: i32,
    encoding: BlockEncoding,
    matrices: Vec<FixtureMatrix>,
    vectors: Vec<FixtureVector>,
    expected: Vec<FixtureExpected>,
}

impl HicFixture {
    pub fn new(version: i32) -> Self {
        HicFixture {
            version,
            genome_id: "test".to_string(),
            chromosomes: Vec::new(),
            resolutions: Vec::new(),
            block_bin_count: 100,
            encoding: BlockEncoding::ListOfRows,
            matrices: Vec::new(),
            vectors: Vec::new(),
            expected: Vec::new(),
        }
    }

    pub fn with_chromosome(mut self, name: &str, length: i64) -> Self {
        self.chromosomes.push((name.to_string(), length));
        self
    }

    pub fn with_resolution(mut self, bin_size: i32) -> Self {
        self.resolutions.push(bin_size);
        self
    }

    pub fn with_block_bin_count(mut self, block_bin_count: i32) -> Self {
        self.block_bin_count = block_bin_count;
        self
    }

    pub fn with_dense_blocks(mut self) -> Self {
        self.encoding = BlockEncoding::Dense;
        self
    }

    fn matrix_mut(&mut self, chr1: i32, chr2: i32, bin_size: i32) -> &mut FixtureMatrix {
        let position = self
            .matrices
            .iter()
            .position(|m| m.chr1 == chr1 && m.chr2 == chr2 && m.bin_size == bin_size);
        match position {
            Some(i) => &mut self.matrices[i],
            None => {
                self.matrices.push(FixtureMatrix {
                    chr1,
                    chr2,
                    bin_size,
                    contacts: Vec::new(),
                });
                let last = self.matrices.len() - 1;
                &mut self.matrices[last]
            }
        }
    }

    /// A stored zoom level without any contact.
    pub fn with_empty_matrix(mut self, chr1: i32, chr2: i32, bin_size: i32) -> Self {
        self.matrix_mut(chr1, chr2, bin_size);
        self
    }

    /// Raw count at bin `(bin_x, bin_y)`, `bin_x` along `chr1`.
    pub fn with_contact(mut self, chr1: i32, chr2: i32, bin_size: i32, bin_x: i64, bin_y: i64, counts: f32) -> Self {
        self.matrix_mut(chr1, chr2, bin_size)
            .contacts
            .push((bin_x, bin_y, counts));
        self
    }

    pub fn with_norm_vector(mut self, normalization: &str, chromosome: i32, bin_size: i32, values: Vec<f64>) -> Self {
        self.vectors.push(FixtureVector {
            normalization: normalization.to_string(),
            chromosome,
            bin_size,
            values,
        });
        self
    }

    /// Expected values by distance. `NONE` goes to the unnormalized section.
    pub fn with_expected(mut self, normalization: &str, bin_size: i32, values: Vec<f64>, factors: Vec<(i32, f64)>) -> Self {
        self.expected.push(FixtureExpected {
            normalization: normalization.to_string(),
            bin_size,
            values,
            factors,
        });
        self
    }

    fn chromosome_length(&self, index: i32) -> i64 {
        if index == 0 {
            self.chromosomes.iter().map(|(_, l)| l).sum::<i64>() / 1000
        } else {
            self.chromosomes
                .get(index as usize - 1)
                .map(|(_, l)| *l)
                .unwrap_or(0)
        }
    }

    fn block_column_count(&self, matrix: &FixtureMatrix) -> i64 {
        let bins = |index: i32| self.chromosome_length(index) / matrix.bin_size as i64 + 1;
        bins(matrix.chr1).max(bins(matrix.chr2)) / self.block_bin_count as i64 + 1
    }

    fn block_number(&self, matrix: &FixtureMatrix, bin_x: i64, bin_y: i64) -> i32 {
        let bbc = self.block_bin_count as i64;
        let bcc = self.block_column_count(matrix);
        if self.version >= V9 && matrix.chr1 == matrix.chr2 {
            let pad = (bin_x + bin_y) / 2 / bbc;
            let depth = (1.0 + (bin_x - bin_y).abs() as f64 / std::f64::consts::SQRT_2 / bbc as f64).log2() as i64;
            (depth * bcc + pad) as i32
        } else {
            ((bin_y / bbc) * bcc + bin_x / bbc) as i32
        }
    }

    fn put_len(&self, out: &mut Vec<u8>, value: usize) {
        if self.version >= V9 {
            put_i64(out, value as i64);
        } else {
            put_i32(out, value as i32);
        }
    }

    fn put_value(&self, out: &mut Vec<u8>, value: f64) {
        if self.version >= V9 {
            out.extend_from_slice(&(value as f32).to_le_bytes());
        } else {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    fn put_expected(&self, out: &mut Vec<u8>, expected: &FixtureExpected) {
        self.put_len(out, expected.values.len());
        for value in &expected.values {
            self.put_value(out, *value);
        }
        put_i32(out, expected.factors.len() as i32);
        for (chromosome, factor) in &expected.factors {
            put_i32(out, *chromosome);
            self.put_value(out, *factor);
        }
    }

    ///
    /// Serialize the whole file.
    ///
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        // header
        out.extend_from_slice(HIC_MAGIC);
        put_i32(&mut out, self.version);
        let master_index_at = out.len();
        put_i64(&mut out, 0);
        put_cstring(&mut out, &self.genome_id);
        let norm_index_at = out.len();
        if self.version >= V9 {
            put_i64(&mut out, 0);
            put_i64(&mut out, 0);
        }
        put_i32(&mut out, 1);
        put_cstring(&mut out, "software");
        put_cstring(&mut out, "hictext fixtures");

        put_i32(&mut out, self.chromosomes.len() as i32 + 1);
        for index in 0..=self.chromosomes.len() as i32 {
            let name = if index == 0 {
                "All"
            } else {
                self.chromosomes[index as usize - 1].0.as_str()
            };
            put_cstring(&mut out, name);
            let length = self.chromosome_length(index);
            if self.version >= V9 {
                put_i64(&mut out, length);
            } else {
                put_i32(&mut out, length as i32);
            }
        }
        put_i32(&mut out, self.resolutions.len() as i32);
        for resolution in &self.resolutions {
            put_i32(&mut out, *resolution);
        }
        put_i32(&mut out, 0);

        // blocks, then one body per chromosome pair
        let mut pairs: BTreeMap<(i32, i32), Vec<&FixtureMatrix>> = BTreeMap::new();
        for matrix in &self.matrices {
            pairs.entry((matrix.chr1, matrix.chr2)).or_default().push(matrix);
        }

        let mut master_index = Vec::new();
        for ((chr1, chr2), matrices) in &pairs {
            let mut zooms = Vec::new();
            for matrix in matrices {
                let mut blocks: BTreeMap<i32, Vec<(i64, i64, f32)>> = BTreeMap::new();
                for &(x, y, c) in &matrix.contacts {
                    blocks
                        .entry(self.block_number(matrix, x, y))
                        .or_default()
                        .push((x, y, c));
                }

                let mut entries = Vec::new();
                for (number, contacts) in &blocks {
                    let compressed = compress(&encode_block(contacts, self.version, self.encoding));
                    entries.push((*number, out.len() as i64, compressed.len() as i32));
                    out.extend_from_slice(&compressed);
                }
                zooms.push((matrix, entries));
            }

            let body_at = out.len();
            put_i32(&mut out, *chr1);
            put_i32(&mut out, *chr2);
            put_i32(&mut out, zooms.len() as i32);
            for (matrix, entries) in &zooms {
                let sum: f32 = matrix.contacts.iter().map(|c| c.2).sum();
                put_cstring(&mut out, "BP");
                put_i32(&mut out, 0);
                put_f32(&mut out, sum);
                put_f32(&mut out, matrix.contacts.len() as f32);
                put_f32(&mut out, 0.0);
                put_f32(&mut out, 0.0);
                put_i32(&mut out, matrix.bin_size);
                put_i32(&mut out, self.block_bin_count);
                put_i32(&mut out, self.block_column_count(matrix) as i32);
                put_i32(&mut out, entries.len() as i32);
                for (number, position, size) in entries {
                    put_i32(&mut out, *number);
                    put_i64(&mut out, *position);
                    put_i32(&mut out, *size);
                }
            }
            master_index.push((format!("{}_{}", chr1, chr2), body_at, out.len() - body_at));
        }

        let mut vector_index = Vec::new();
        for vector in &self.vectors {
            let at = out.len();
            self.put_len(&mut out, vector.values.len());
            for value in &vector.values {
                self.put_value(&mut out, *value);
            }
            vector_index.push((vector, at, out.len() - at));
        }

        // footer
        let mut main = Vec::new();
        put_i32(&mut main, master_index.len() as i32);
        for (key, position, size) in &master_index {
            put_cstring(&mut main, key);
            put_i64(&mut main, *position as i64);
            put_i32(&mut main, *size as i32);
        }
        let (raw, normalized): (Vec<&FixtureExpected>, Vec<&FixtureExpected>) =
            self.expected.iter().partition(|e| e.normalization == "NONE");
        put_i32(&mut main, raw.len() as i32);
        for expected in raw {
            put_cstring(&mut main, "BP");
            put_i32(&mut main, expected.bin_size);
            self.put_expected(&mut main, expected);
        }

        let mut extended = Vec::new();
        put_i32(&mut extended, normalized.len() as i32);
        for expected in normalized {
            put_cstring(&mut extended, &expected.normalization);
            put_cstring(&mut extended, "BP");
            put_i32(&mut extended, expected.bin_size);
            self.put_expected(&mut extended, expected);
        }
        put_i32(&mut extended, vector_index.len() as i32);
        for (vector, position, size) in &vector_index {
            put_cstring(&mut extended, &vector.normalization);
            put_i32(&mut extended, vector.chromosome);
            put_cstring(&mut extended, "BP");
            put_i32(&mut extended, vector.bin_size);
            put_i64(&mut extended, *position as i64);
            self.put_len(&mut extended, *size);
        }

        let master_index_position = out.len() as i64;
        if self.version >= V9 {
            put_i64(&mut out, main.len() as i64);
            out.extend_from_slice(&main);
            let norm_index_position = out.len() as i64;
            out.extend_from_slice(&extended);
            patch_i64(&mut out, norm_index_at, norm_index_position);
            patch_i64(&mut out, norm_index_at + 8, extended.len() as i64);
        } else {
            put_i32(&mut out, main.len() as i32);
            out.extend_from_slice(&main);
            out.extend_from_slice(&extended);
        }
        patch_i64(&mut out, master_index_at, master_index_position);

        out
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}

///
/// Serialize contacts as one uncompressed block.
///
pub fn encode_block(contacts: &[(i64, i64, f32)], version: i32, encoding: BlockEncoding) -> Vec<u8> {
    let x_offset = contacts.iter().map(|c| c.0).min().unwrap_or(0);
    let y_offset = contacts.iter().map(|c| c.1).min().unwrap_or(0);

    let mut out = Vec::new();
    put_i32(&mut out, contacts.len() as i32);
    put_i32(&mut out, x_offset as i32);
    put_i32(&mut out, y_offset as i32);
    // float counts
    out.push(1);
    if version >= V9 {
        // short bin offsets on both axes
        out.push(0);
        out.push(0);
    }

    match encoding {
        BlockEncoding::ListOfRows => {
            out.push(1);
            let mut rows: BTreeMap<i64, Vec<(i64, f32)>> = BTreeMap::new();
            for &(x, y, c) in contacts {
                rows.entry(y).or_default().push((x, c));
            }
            put_i16(&mut out, rows.len() as i16);
            for (y, cols) in &rows {
                put_i16(&mut out, (y - y_offset) as i16);
                put_i16(&mut out, cols.len() as i16);
                for (x, c) in cols {
                    put_i16(&mut out, (x - x_offset) as i16);
                    put_f32(&mut out, *c);
                }
            }
        }
        BlockEncoding::Dense => {
            out.push(2);
            let width = contacts.iter().map(|c| c.0).max().unwrap_or(0) - x_offset + 1;
            let height = contacts.iter().map(|c| c.1).max().unwrap_or(0) - y_offset + 1;
            let mut grid = vec![f32::NAN; (width * height) as usize];
            for &(x, y, c) in contacts {
                grid[((y - y_offset) * width + (x - x_offset)) as usize] = c;
            }
            put_i32(&mut out, grid.len() as i32);
            put_i16(&mut out, width as i16);
            for c in grid {
                put_f32(&mut out, c);
            }
        }
    }

    out
}

fn compress(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("in-memory zlib stream");
    encoder.finish().expect("in-memory zlib stream")
}

fn put_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_cstring(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(value.as_bytes());
    out.push(0);
}

fn patch_i64(out: &mut [u8], at: usize, value: i64) {
    out[at..at + 8].copy_from_slice(&value.to_le_bytes());
}
