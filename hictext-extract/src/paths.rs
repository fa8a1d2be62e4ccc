use std::path::{Path, PathBuf};

use crate::consts::{COMBINED_NORMALIZATION, SHORT_SCORE_DIR, WORKSPACE_DIR};

///
/// Output files of one (resolution, chromosome, data type) triple.
///
/// The prefix is joined as a plain string, so callers pass it with a trailing separator.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub sparse: PathBuf,
    pub dense: PathBuf,
}

impl OutputPaths {
    pub fn for_triple(
        prefix: &str,
        chromosome: &str,
        resolution: i64,
        data_type: &str,
        normalization: &str,
    ) -> Self {
        OutputPaths {
            sparse: PathBuf::from(format!(
                "{}{}shortScore_res{}_ch{}_{}_{}.txt",
                prefix, SHORT_SCORE_DIR, resolution, chromosome, data_type, normalization
            )),
            dense: PathBuf::from(format!(
                "{}{}ch{}_res{}_{}_{}.h5",
                prefix, WORKSPACE_DIR, chromosome, resolution, data_type, normalization
            )),
        }
    }
}

/// Combined sparse file of one data type across all resolutions and chromosomes.
pub fn combined_path(prefix: &str, data_type: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}{}shortScore_all_{}_{}.txt",
        prefix, SHORT_SCORE_DIR, data_type, COMBINED_NORMALIZATION
    ))
}

///
/// What a triple still needs, decided from the filesystem before anything is fetched.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriplePlan {
    /// both files exist
    Skip,
    Extract { sparse: bool, dense: bool },
}

impl TriplePlan {
    pub fn for_paths(paths: &OutputPaths) -> Self {
        TriplePlan::from_existing(output_exists(&paths.sparse), output_exists(&paths.dense))
    }

    pub fn from_existing(sparse_exists: bool, dense_exists: bool) -> Self {
        if sparse_exists && dense_exists {
            TriplePlan::Skip
        } else {
            TriplePlan::Extract {
                sparse: !sparse_exists,
                dense: !dense_exists,
            }
        }
    }
}

/// Whether an output is already there.
pub fn output_exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    #[rstest]
    fn test_triple_paths() {
        let paths = OutputPaths::for_triple("/data/run1/", "1", 5000, "observed", "KR");

        assert_eq!(
            paths.sparse,
            PathBuf::from("/data/run1/hicFiles/short_score_textform/shortScore_res5000_ch1_observed_KR.txt")
        );
        assert_eq!(
            paths.dense,
            PathBuf::from("/data/run1/Workspaces/individual/ch1_res5000_observed_KR.h5")
        );
    }

    #[rstest]
    fn test_prefix_is_not_joined_with_a_separator() {
        let paths = OutputPaths::for_triple("run_", "X", 10000, "oe", "KR");
        assert_eq!(
            paths.sparse,
            PathBuf::from("run_hicFiles/short_score_textform/shortScore_res10000_chX_oe_KR.txt")
        );
    }

    #[rstest]
    fn test_combined_path() {
        assert_eq!(
            combined_path("/data/", "oe"),
            PathBuf::from("/data/hicFiles/short_score_textform/shortScore_all_oe_KR.txt")
        );
    }

    #[rstest]
    #[case(true, true, TriplePlan::Skip)]
    #[case(true, false, TriplePlan::Extract { sparse: false, dense: true })]
    #[case(false, true, TriplePlan::Extract { sparse: true, dense: false })]
    #[case(false, false, TriplePlan::Extract { sparse: true, dense: true })]
    fn test_plan_from_existing(#[case] sparse: bool, #[case] dense: bool, #[case] expected: TriplePlan) {
        assert_eq!(TriplePlan::from_existing(sparse, dense), expected);
    }

    #[rstest]
    fn test_plan_for_paths_on_disk() {
        let dir = tempdir().unwrap();
        let prefix = format!("{}/", dir.path().display());
        let paths = OutputPaths::for_triple(&prefix, "1", 5000, "observed", "KR");

        assert_eq!(
            TriplePlan::for_paths(&paths),
            TriplePlan::Extract { sparse: true, dense: true }
        );

        std::fs::create_dir_all(dir.path().join(SHORT_SCORE_DIR)).unwrap();
        std::fs::write(&paths.sparse, "").unwrap();
        assert_eq!(
            TriplePlan::for_paths(&paths),
            TriplePlan::Extract { sparse: false, dense: true }
        );

        std::fs::create_dir_all(dir.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(&paths.dense, "").unwrap();
        assert_eq!(TriplePlan::for_paths(&paths), TriplePlan::Skip);
    }
}
