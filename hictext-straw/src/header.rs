use std::io::{Cursor, ErrorKind};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use hictext_core::errors::{HicError, Result};
use hictext_core::models::Chromosome;
use hictext_core::utils::ByteSource;

use crate::binary::{V9, read_cstring};
use crate::consts::{HEADER_CHUNK, HIC_MAGIC, MAX_VERSION, MIN_VERSION};

///
/// Everything in front of the matrix bodies of a `.hic` file.
///
#[derive(Debug, Clone)]
pub struct HicHeader {
    pub version: i32,
    pub master_index_position: i64,
    pub genome_id: String,
    /// version 9 only, zero otherwise
    pub norm_vector_index_position: i64,
    /// version 9 only, zero otherwise
    pub norm_vector_index_length: i64,
    pub attributes: Vec<(String, String)>,
    pub chromosomes: Vec<Chromosome>,
    pub bp_resolutions: Vec<i32>,
    pub frag_resolutions: Vec<i32>,
}

impl HicHeader {
    ///
    /// Read the header from a byte source.
    ///
    /// The header has no length field, so it is fetched in growing chunks until it parses.
    ///
    pub fn read(source: &dyn ByteSource) -> Result<Self> {
        let mut chunk = HEADER_CHUNK;
        loop {
            let bytes = source.read_range(0, chunk)?;
            let got = bytes.len();

            match HicHeader::parse(bytes, source.location()) {
                Ok(header) => return Ok(header),
                Err(HicError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof && got == chunk => {
                    debug!("Header of {} larger than {} bytes", source.location(), chunk);
                    chunk *= 4;
                }
                Err(e) => return Err(e),
            }
        }
    }

    ///
    /// Parse a header from bytes starting at offset zero of the file.
    ///
    pub fn parse(bytes: Vec<u8>, location: &str) -> Result<Self> {
        let mut reader = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut magic)?;
        if &magic != HIC_MAGIC {
            return Err(HicError::BadMagic(location.to_string()));
        }

        let version = reader.read_i32::<LittleEndian>()?;
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(HicError::UnsupportedVersion(version));
        }

        let master_index_position = reader.read_i64::<LittleEndian>()?;
        let genome_id = read_cstring(&mut reader)?;

        let (norm_vector_index_position, norm_vector_index_length) = if version >= V9 {
            (
                reader.read_i64::<LittleEndian>()?,
                reader.read_i64::<LittleEndian>()?,
            )
        } else {
            (0, 0)
        };

        let n_attributes = reader.read_i32::<LittleEndian>()?;
        let mut attributes = Vec::with_capacity(n_attributes.max(0) as usize);
        for _ in 0..n_attributes {
            let key = read_cstring(&mut reader)?;
            let value = read_cstring(&mut reader)?;
            attributes.push((key, value));
        }

        let n_chromosomes = reader.read_i32::<LittleEndian>()?;
        let mut chromosomes = Vec::with_capacity(n_chromosomes.max(0) as usize);
        for index in 0..n_chromosomes {
            let name = read_cstring(&mut reader)?;
            let length = if version >= V9 {
                reader.read_i64::<LittleEndian>()?
            } else {
                reader.read_i32::<LittleEndian>()? as i64
            };
            chromosomes.push(Chromosome::new(index, &name, length));
        }

        let bp_resolutions = read_resolutions(&mut reader)?;
        let frag_resolutions = read_resolutions(&mut reader)?;

        Ok(HicHeader {
            version,
            master_index_position,
            genome_id,
            norm_vector_index_position,
            norm_vector_index_length,
            attributes,
            chromosomes,
            bp_resolutions,
            frag_resolutions,
        })
    }
}

fn read_resolutions(reader: &mut Cursor<Vec<u8>>) -> Result<Vec<i32>> {
    let n = reader.read_i32::<LittleEndian>()?;
    let mut resolutions = Vec::with_capacity(n.max(0) as usize);
    for _ in 0..n {
        resolutions.push(reader.read_i32::<LittleEndian>()?);
    }
    Ok(resolutions)
}
