use std::fs::File;
use std::io::prelude::*;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::errors::{HicError, Result};

///
/// Random access to the bytes of a `.hic` file, wherever it lives.
///
/// Readers ask for explicit byte ranges instead of streaming so the same parsing code
/// works for local files and for HTTP range requests.
///
pub trait ByteSource: Send + Sync {
    ///
    /// Read up to `len` bytes starting at `offset`. The result is only shorter than `len`
    /// when the end of the data is reached.
    ///
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Human readable location, used in error messages.
    fn location(&self) -> &str;
}

/// A `.hic` file on the local filesystem.
pub struct LocalSource {
    path: String,
    file: Mutex<File>,
}

impl LocalSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| HicError::FileReadError(format!("{}: {}", path.display(), e)))?;
        Ok(LocalSource {
            path: path.display().to_string(),
            file: Mutex::new(file),
        })
    }
}

impl ByteSource for LocalSource {
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| HicError::FileReadError(self.path.clone()))?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::with_capacity(len);
        (&mut *file).take(len as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn location(&self) -> &str {
        &self.path
    }
}

///
/// A remote `.hic` file read through HTTP range requests.
///
#[cfg(feature = "http")]
pub struct HttpSource {
    url: String,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(url: &str) -> Self {
        HttpSource {
            url: url.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl ByteSource for HttpSource {
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let range = format!("bytes={}-{}", offset, offset + len as u64 - 1);

        let response = match ureq::get(&self.url).set("Range", &range).call() {
            Ok(resp) => resp,
            // asking past the end of the file
            Err(ureq::Error::Status(416, _)) => return Ok(Vec::new()),
            Err(ureq::Error::Status(code, _)) => {
                return Err(HicError::HttpError(format!(
                    "HTTP status {} when fetching {}",
                    code, self.url
                )));
            }
            Err(e) => {
                return Err(HicError::HttpError(format!(
                    "Request error when fetching {}: {}",
                    self.url, e
                )));
            }
        };

        // servers without range support answer 200 with the whole body
        let full_body = response.status() == 200;

        let mut bytes = Vec::new();
        let mut reader = response.into_reader();
        if full_body {
            std::io::copy(&mut (&mut reader).take(offset), &mut std::io::sink())?;
        }
        reader
            .take(len as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| {
                HicError::HttpError(format!(
                    "Failed reading response body from {}: {}",
                    self.url, e
                ))
            })?;

        Ok(bytes)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

///
/// Bytes held in memory. Handy for data that was fetched in one piece.
///
pub struct InMemorySource {
    name: String,
    data: Vec<u8>,
}

impl InMemorySource {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        InMemorySource {
            name: name.to_string(),
            data,
        }
    }
}

impl ByteSource for InMemorySource {
    fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let start = (offset as usize).min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn location(&self) -> &str {
        &self.name
    }
}

///
/// Whether a locator should be fetched over the network.
///
pub fn is_url(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

///
/// Get a byte source for either a local path or an http(s) URL.
///
/// # Arguments
///
/// - locator: path to the file, or a URL
///
pub fn get_byte_source(locator: &str) -> Result<Arc<dyn ByteSource>> {
    if is_url(locator) {
        #[cfg(feature = "http")]
        {
            debug!("Reading {} through HTTP range requests", locator);
            return Ok(Arc::new(HttpSource::new(locator)));
        }

        #[cfg(not(feature = "http"))]
        {
            return Err(HicError::HttpFeatureDisabled(locator.to_string()));
        }
    }

    let path = PathBuf::from(locator);
    if !path.is_file() {
        return Err(HicError::InvalidPathOrUrl(locator.to_string()));
    }

    debug!("Reading local file {}", path.display());
    Ok(Arc::new(LocalSource::open(&path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[fixture]
    fn ten_bytes() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.flush().unwrap();
        file
    }

    #[rstest]
    fn test_local_source_reads_ranges(ten_bytes: NamedTempFile) {
        let source = LocalSource::open(ten_bytes.path()).unwrap();
        assert_eq!(source.read_range(2, 3).unwrap(), b"234".to_vec());
        assert_eq!(source.read_range(0, 1).unwrap(), b"0".to_vec());
    }

    #[rstest]
    fn test_local_source_short_read_at_end(ten_bytes: NamedTempFile) {
        let source = LocalSource::open(ten_bytes.path()).unwrap();
        assert_eq!(source.read_range(8, 100).unwrap(), b"89".to_vec());
        assert!(source.read_range(20, 4).unwrap().is_empty());
    }

    #[rstest]
    fn test_in_memory_source() {
        let source = InMemorySource::new("mem", b"abcdef".to_vec());
        assert_eq!(source.read_range(4, 10).unwrap(), b"ef".to_vec());
        assert!(source.read_range(10, 2).unwrap().is_empty());
        assert_eq!(source.location(), "mem");
    }

    #[rstest]
    #[case("https://example.org/a.hic", true)]
    #[case("http://example.org/a.hic", true)]
    #[case("/data/a.hic", false)]
    #[case("ftp://example.org/a.hic", false)]
    fn test_is_url(#[case] locator: &str, #[case] expected: bool) {
        assert_eq!(is_url(locator), expected);
    }

    #[rstest]
    fn test_missing_file_is_rejected() {
        let result = get_byte_source("/definitely/not/here.hic");
        assert!(matches!(result, Err(HicError::InvalidPathOrUrl(_))));
    }

    #[rstest]
    fn test_get_byte_source_local(ten_bytes: NamedTempFile) {
        let locator = ten_bytes.path().to_string_lossy().to_string();
        let source = get_byte_source(&locator).unwrap();
        assert_eq!(source.read_range(5, 2).unwrap(), b"56".to_vec());
    }
}
