/// Sparse text outputs, relative to the path prefix.
pub const SHORT_SCORE_DIR: &str = "hicFiles/short_score_textform/";
/// HDF5 outputs, relative to the path prefix.
pub const WORKSPACE_DIR: &str = "Workspaces/individual/";

/// Normalization of the per-triple outputs.
pub const NORMALIZATION: &str = "KR";
/// Normalization of the combined outputs.
pub const COMBINED_NORMALIZATION: &str = "KR";

/// Dataset holding the dense matrix inside each HDF5 file.
pub const MATRIX_DATASET: &str = "matrix";

pub const LIST_SEPARATOR: char = ',';
pub const QUOTE: char = '\'';

/// Decimals of the contact value in sparse lines.
pub const VALUE_PRECISION: usize = 5;
