//! End to end extraction runs against synthetic `.hic` files.

use std::path::Path;

use ndarray::Array2;
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{TempDir, tempdir};

use hictext_extract::consts::{MATRIX_DATASET, SHORT_SCORE_DIR, WORKSPACE_DIR};
use hictext_extract::{ExtractConfig, OutputPaths, combined_path, extract_hic_data};
use hictext_straw::fixtures::HicFixture;

struct Run {
    _dir: TempDir,
    prefix: String,
    hic_path: String,
}

fn setup(version: i32) -> Run {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir_all(dir.path().join(SHORT_SCORE_DIR)).unwrap();
    std::fs::create_dir_all(dir.path().join(WORKSPACE_DIR)).unwrap();

    let hic_path = dir.path().join("sample.hic");
    HicFixture::new(version)
        .with_chromosome("1", 10000)
        .with_chromosome("2", 5000)
        .with_resolution(5000)
        .with_contact(1, 1, 5000, 0, 0, 2.0)
        .with_contact(1, 1, 5000, 0, 1, 1.5)
        .with_contact(2, 2, 5000, 1, 1, 4.0)
        .with_norm_vector("KR", 1, 5000, vec![1.0, 1.0, 1.0])
        .with_norm_vector("KR", 2, 5000, vec![1.0, 2.0])
        .with_expected("KR", 5000, vec![1.0, 0.5, 0.5], vec![])
        .write_to(&hic_path)
        .expect("Failed to write fixture");

    Run {
        prefix: format!("{}/", dir.path().display()),
        hic_path: hic_path.display().to_string(),
        _dir: dir,
    }
}

fn config(run: &Run, resolutions: &str, chromosomes: &str, data_types: &str) -> ExtractConfig {
    ExtractConfig {
        path: run.prefix.clone(),
        hic_url: run.hic_path.clone(),
        resolutions: resolutions.to_string(),
        chromosomes: chromosomes.to_string(),
        data_types: data_types.to_string(),
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[rstest]
#[case(8)]
#[case(9)]
fn test_observed_extraction(#[case] version: i32) {
    let run = setup(version);

    let report = extract_hic_data(&config(&run, "5000", "1", "observed")).expect("run aborted");

    let paths = OutputPaths::for_triple(&run.prefix, "1", 5000, "observed", "KR");
    assert_eq!(
        read(&paths.sparse),
        "0 1 0 0 0 1 0 1 2.00000\n0 1 0 0 0 1 5000 1 1.50000\n"
    );

    let file = hdf5::File::open(&paths.dense).unwrap();
    let matrix: Array2<f32> = file.dataset(MATRIX_DATASET).unwrap().read_2d().unwrap();
    assert_eq!(matrix.dim(), (3, 3));
    assert_eq!(matrix[[0, 1]], 1.5);
    assert_eq!(matrix[[1, 0]], 1.5);

    assert_eq!(read(&combined_path(&run.prefix, "observed")), read(&paths.sparse));
    assert_eq!(report.failures, 0);
}

#[rstest]
fn test_oe_and_second_chromosome() {
    let run = setup(8);

    extract_hic_data(&config(&run, "'5000'", "'1', '2'", "oe")).expect("run aborted");

    let chr1 = OutputPaths::for_triple(&run.prefix, "1", 5000, "oe", "KR");
    assert_eq!(
        read(&chr1.sparse),
        "0 1 0 0 0 1 0 1 2.00000\n0 1 0 0 0 1 5000 1 3.00000\n"
    );

    // 4.0 / (2.0 * 2.0) / 1.0
    let chr2 = OutputPaths::for_triple(&run.prefix, "2", 5000, "oe", "KR");
    assert_eq!(read(&chr2.sparse), "0 2 5000 0 0 2 5000 1 1.00000\n");

    assert_eq!(
        read(&combined_path(&run.prefix, "oe")),
        format!("{}{}", read(&chr1.sparse), read(&chr2.sparse))
    );
}

#[rstest]
fn test_second_run_keeps_existing_files() {
    let run = setup(9);
    let cfg = config(&run, "5000", "1", "observed");

    extract_hic_data(&cfg).expect("first run aborted");
    let paths = OutputPaths::for_triple(&run.prefix, "1", 5000, "observed", "KR");
    std::fs::write(&paths.sparse, "edited").unwrap();

    let report = extract_hic_data(&cfg).expect("second run aborted");

    assert_eq!(report.skipped_triples, 1);
    assert_eq!(report.skipped_combined, 1);
    assert_eq!(read(&paths.sparse), "edited");
}

#[rstest]
fn test_invalid_resolution_list() {
    let run = setup(8);

    let report = extract_hic_data(&config(&run, "abc", "1", "observed"));

    assert!(report.is_none());
    assert_eq!(std::fs::read_dir(Path::new(&run.prefix).join(SHORT_SCORE_DIR)).unwrap().count(), 0);
}

#[rstest]
fn test_missing_hic_file() {
    let run = setup(8);
    let mut cfg = config(&run, "5000", "1", "observed");
    cfg.hic_url = format!("{}missing.hic", run.prefix);

    assert!(extract_hic_data(&cfg).is_none());
}

#[rstest]
fn test_resolution_beyond_file_range_is_skipped() {
    let run = setup(8);

    let report = extract_hic_data(&config(&run, "3000000000,5000", "1", "observed")).expect("run aborted");

    let wide = OutputPaths::for_triple(&run.prefix, "1", 3_000_000_000, "observed", "KR");
    assert!(!wide.sparse.exists());
    assert!(!wide.dense.exists());
    assert_eq!(report.sparse_written, 1);
    assert_eq!(report.dense_written, 1);
    // once per pass
    assert_eq!(report.failures, 2);
    assert_eq!(
        read(&combined_path(&run.prefix, "observed")),
        "0 1 0 0 0 1 0 1 2.00000\n0 1 0 0 0 1 5000 1 1.50000\n"
    );
}

#[rstest]
fn test_negative_chromosome_index_is_resolved_then_fetched_by_name() {
    let run = setup(8);

    let report = extract_hic_data(&config(&run, "5000", "-1", "observed")).expect("run aborted");

    // the length lookup succeeds, the matrix fetch by the name "-1" does not
    let paths = OutputPaths::for_triple(&run.prefix, "-1", 5000, "observed", "KR");
    assert!(!paths.sparse.exists());
    assert_eq!(report.sparse_written, 0);
    assert_eq!(report.failures, 2);
}
