///
/// One cell of a contact matrix.
///
/// `bin_x` and `bin_y` are genomic start positions (bin index times bin size), the way the
/// reader hands them out after decoding a block.
///
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ContactRecord {
    pub bin_x: i64,
    pub bin_y: i64,
    pub counts: f32,
}

impl ContactRecord {
    pub fn new(bin_x: i64, bin_y: i64, counts: f32) -> Self {
        ContactRecord {
            bin_x,
            bin_y,
            counts,
        }
    }
}
