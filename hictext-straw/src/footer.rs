use std::collections::HashMap;
use std::io::{Cursor, ErrorKind, Read};
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use hictext_core::errors::{HicError, Result};
use hictext_core::models::{Normalization, Unit};
use hictext_core::utils::ByteSource;

use crate::binary::{V9, read_cstring, read_value_vector, read_versioned_len, read_versioned_value};
use crate::consts::FOOTER_CHUNK;
use crate::header::HicHeader;

/// Location of a serialized structure inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub position: i64,
    pub size: i64,
}

/// Key of expected values and normalization vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorKey {
    pub normalization: String,
    pub unit: Unit,
    pub bin_size: i32,
}

impl VectorKey {
    pub fn new(normalization: &Normalization, unit: Unit, bin_size: i32) -> Self {
        VectorKey {
            normalization: normalization.as_str().to_string(),
            unit,
            bin_size,
        }
    }
}

///
/// Expected contact count by bin distance, with per chromosome scale factors.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedValues {
    pub values: Vec<f64>,
    pub normalization_factors: HashMap<i32, f64>,
}

impl ExpectedValues {
    ///
    /// Expected values for one chromosome: the genome wide values divided by the
    /// chromosome's scale factor when the file carries one.
    ///
    pub fn for_chromosome(&self, chromosome_index: i32) -> Vec<f64> {
        match self.normalization_factors.get(&chromosome_index) {
            Some(factor) => self.values.iter().map(|v| v / factor).collect(),
            None => self.values.clone(),
        }
    }
}

///
/// The footer: master index of matrices, expected value vectors and the
/// normalization vector index.
///
#[derive(Debug, Clone, Default)]
pub struct HicFooter {
    pub master_index: HashMap<String, IndexEntry>,
    pub expected: HashMap<VectorKey, ExpectedValues>,
    pub norm_vectors: HashMap<(VectorKey, i32), IndexEntry>,
}

impl HicFooter {
    ///
    /// Read the footer the header points at.
    ///
    pub fn read(source: &dyn ByteSource, header: &HicHeader) -> Result<Self> {
        let start = header.master_index_position as u64;
        let size_field = if header.version >= V9 { 8 } else { 4 };

        let prefix = source.read_range(start, size_field)?;
        let n_bytes = read_versioned_len(&mut Cursor::new(prefix), header.version)?;

        // version 9 points at the normalized expected values and the vector index
        if header.version >= V9 && header.norm_vector_index_position > 0 {
            let end = (header.norm_vector_index_position + header.norm_vector_index_length) as u64;
            debug!(
                "Reading footer of {} ({} bytes)",
                source.location(),
                end.saturating_sub(start)
            );
            let bytes = source.read_range(start, end.saturating_sub(start) as usize)?;
            return HicFooter::parse(bytes, header.version);
        }

        // nBytes only covers the master index and the raw expected values, the normalized
        // sections follow it up to the end of the file
        let mut len = size_field + n_bytes.max(0) as usize + FOOTER_CHUNK;
        loop {
            let bytes = source.read_range(start, len)?;
            let got = bytes.len();
            debug!("Reading footer of {} ({} bytes)", source.location(), got);

            match HicFooter::parse(bytes, header.version) {
                Ok(footer) => return Ok(footer),
                Err(HicError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof && got == len => {
                    len *= 4;
                }
                Err(e) => return Err(e),
            }
        }
    }

    ///
    /// Parse footer bytes starting at the `nBytes` field.
    ///
    pub fn parse(bytes: Vec<u8>, version: i32) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        let mut footer = HicFooter::default();

        read_versioned_len(&mut reader, version)?;

        let n_entries = reader.read_i32::<LittleEndian>()?;
        for _ in 0..n_entries {
            let key = read_cstring(&mut reader)?;
            let position = reader.read_i64::<LittleEndian>()?;
            let size = reader.read_i32::<LittleEndian>()? as i64;
            footer.master_index.insert(key, IndexEntry { position, size });
        }

        let n_expected = reader.read_i32::<LittleEndian>()?;
        for _ in 0..n_expected {
            let unit = Unit::from_str(&read_cstring(&mut reader)?)?;
            let bin_size = reader.read_i32::<LittleEndian>()?;
            let expected = read_expected(&mut reader, version)?;
            footer
                .expected
                .insert(VectorKey::new(&Normalization::NONE, unit, bin_size), expected);
        }

        // older files may stop after the unnormalized expected values
        if reader.position() as usize >= reader.get_ref().len() {
            return Ok(footer);
        }

        let n_normalized_expected = reader.read_i32::<LittleEndian>()?;
        for _ in 0..n_normalized_expected {
            let normalization = Normalization::from_str(&read_cstring(&mut reader)?)?;
            let unit = Unit::from_str(&read_cstring(&mut reader)?)?;
            let bin_size = reader.read_i32::<LittleEndian>()?;
            let expected = read_expected(&mut reader, version)?;
            footer
                .expected
                .insert(VectorKey::new(&normalization, unit, bin_size), expected);
        }

        let n_norm_vectors = reader.read_i32::<LittleEndian>()?;
        for _ in 0..n_norm_vectors {
            let normalization = Normalization::from_str(&read_cstring(&mut reader)?)?;
            let chromosome_index = reader.read_i32::<LittleEndian>()?;
            let unit = Unit::from_str(&read_cstring(&mut reader)?)?;
            let bin_size = reader.read_i32::<LittleEndian>()?;
            let position = reader.read_i64::<LittleEndian>()?;
            let size = read_versioned_len(&mut reader, version)?;
            footer.norm_vectors.insert(
                (VectorKey::new(&normalization, unit, bin_size), chromosome_index),
                IndexEntry { position, size },
            );
        }

        Ok(footer)
    }

    /// Chromosome pairs (`"{i}_{j}"`) with a stored matrix, sorted.
    pub fn matrix_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.master_index.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Normalization types the file carries vectors for.
    pub fn normalization_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .norm_vectors
            .keys()
            .map(|(key, _)| key.normalization.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

fn read_expected<R: Read>(reader: &mut R, version: i32) -> Result<ExpectedValues> {
    let values = read_value_vector(reader, version)?;

    let n_factors = reader.read_i32::<LittleEndian>()?;
    let mut normalization_factors = HashMap::with_capacity(n_factors.max(0) as usize);
    for _ in 0..n_factors {
        let chromosome_index = reader.read_i32::<LittleEndian>()?;
        let factor = read_versioned_value(reader, version)?;
        normalization_factors.insert(chromosome_index, factor);
    }

    Ok(ExpectedValues {
        values,
        normalization_factors,
    })
}

///
/// Read one normalization vector.
///
pub fn read_norm_vector(source: &dyn ByteSource, entry: &IndexEntry, version: i32) -> Result<Vec<f64>> {
    let bytes = source.read_range(entry.position as u64, entry.size as usize)?;
    read_value_vector(&mut Cursor::new(bytes), version)
}
