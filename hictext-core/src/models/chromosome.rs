use std::fmt::{self, Display};

///
/// Chromosome entry of a `.hic` header.
///
/// `index` is the position of the chromosome in the header list. Matrices are keyed by
/// pairs of these indices.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Chromosome {
    pub index: i32,
    pub name: String,
    pub length: i64,
}

impl Chromosome {
    pub fn new(index: i32, name: &str, length: i64) -> Self {
        Chromosome {
            index,
            name: name.to_string(),
            length,
        }
    }

    ///
    /// Number of bins of `bin_size` needed to cover the chromosome.
    ///
    pub fn bin_count(&self, bin_size: i32) -> i64 {
        self.length / bin_size as i64 + 1
    }

    ///
    /// Whether `name` refers to this chromosome, allowing a missing or extra `chr` prefix
    /// and ignoring case.
    ///
    pub fn matches(&self, name: &str) -> bool {
        let own = strip_chr(&self.name);
        let other = strip_chr(name);
        own.eq_ignore_ascii_case(other)
    }
}

fn strip_chr(name: &str) -> &str {
    match name.get(..3) {
        Some(prefix) if name.len() > 3 && prefix.eq_ignore_ascii_case("chr") => &name[3..],
        _ => name,
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.length)
    }
}
