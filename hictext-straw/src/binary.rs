use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use hictext_core::errors::{HicError, Result};

/// First version whose counts, lengths and vector values use 64 bit / f32 widths.
pub const V9: i32 = 9;

///
/// Read a NUL terminated string.
///
pub fn read_cstring<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let byte = reader.read_u8()?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes).map_err(|e| HicError::InvalidString(e.to_string()))
}

///
/// Read a length field: `i32` before version 9, `i64` from version 9 on.
///
pub fn read_versioned_len<R: Read>(reader: &mut R, version: i32) -> Result<i64> {
    if version < V9 {
        Ok(reader.read_i32::<LittleEndian>()? as i64)
    } else {
        Ok(reader.read_i64::<LittleEndian>()?)
    }
}

///
/// Read a vector value: `f64` before version 9, `f32` from version 9 on.
///
pub fn read_versioned_value<R: Read>(reader: &mut R, version: i32) -> Result<f64> {
    if version < V9 {
        Ok(reader.read_f64::<LittleEndian>()?)
    } else {
        Ok(reader.read_f32::<LittleEndian>()? as f64)
    }
}

///
/// Read a `nValues` prefixed vector of versioned values.
///
pub fn read_value_vector<R: Read>(reader: &mut R, version: i32) -> Result<Vec<f64>> {
    let n_values = read_versioned_len(reader, version)?;
    let mut values = Vec::with_capacity(n_values.max(0) as usize);
    for _ in 0..n_values {
        values.push(read_versioned_value(reader, version)?);
    }
    Ok(values)
}

/// Read an `i16` or an `i32` depending on the short flag of a block.
pub fn read_short_or_int<R: Read>(reader: &mut R, use_short: bool) -> Result<i32> {
    if use_short {
        Ok(reader.read_i16::<LittleEndian>()? as i32)
    } else {
        Ok(reader.read_i32::<LittleEndian>()?)
    }
}
