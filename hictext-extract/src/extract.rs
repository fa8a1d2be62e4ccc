use std::io::Write;

use log::{debug, error, info};

use hictext_straw::HicFile;

use crate::consts::{COMBINED_NORMALIZATION, NORMALIZATION};
use crate::error::ExtractError;
use crate::inputs::ExtractInputs;
use crate::paths::{OutputPaths, TriplePlan, combined_path, output_exists};
use crate::source::ContactSource;
use crate::writing::{CombinedWriter, write_dense, write_sparse};

///
/// Parameters of one extraction run, as given on the command line.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// prefix of every output path, with its trailing separator
    pub path: String,
    /// local path or http(s) URL of the `.hic` file
    pub hic_url: String,
    pub resolutions: String,
    pub chromosomes: String,
    pub data_types: String,
}

///
/// What a run did. Errors are logged where they happen, this only counts them.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub skipped_triples: usize,
    pub sparse_written: usize,
    pub dense_written: usize,
    pub combined_written: usize,
    pub skipped_combined: usize,
    pub failures: usize,
}

///
/// Open the data source and run the extraction. Failures are logged, never returned.
///
pub fn extract_hic_data(config: &ExtractConfig) -> Option<ExtractReport> {
    let hic = match HicFile::open(&config.hic_url) {
        Ok(hic) => hic,
        Err(source) => {
            error!(
                "{}",
                ExtractError::Open {
                    locator: config.hic_url.clone(),
                    source,
                }
            );
            return None;
        }
    };

    extract_from_source(&hic, config)
}

///
/// Run the extraction against an already open data source.
///
/// Returns `None` when the input lists do not parse, in which case nothing is written.
///
pub fn extract_from_source<S: ContactSource + ?Sized>(source: &S, config: &ExtractConfig) -> Option<ExtractReport> {
    let inputs = match ExtractInputs::parse(&config.resolutions, &config.chromosomes, &config.data_types) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{}", e);
            return None;
        }
    };

    let mut report = ExtractReport::default();
    extract_triples(source, &config.path, &inputs, &mut report);
    extract_combined(source, &config.path, &inputs, &mut report);

    debug!("Extraction finished: {:?}", report);
    Some(report)
}

fn extract_triples<S: ContactSource + ?Sized>(
    source: &S,
    prefix: &str,
    inputs: &ExtractInputs,
    report: &mut ExtractReport,
) {
    for &resolution in &inputs.resolutions {
        for chromosome in &inputs.chromosomes {
            // unresolvable chromosomes are skipped without a message
            let end = match source.chromosome_length(chromosome) {
                Ok(length) => length,
                Err(_) => continue,
            };

            for data in &inputs.data_types {
                let paths = OutputPaths::for_triple(prefix, chromosome, resolution, data, NORMALIZATION);

                let (sparse, dense) = match TriplePlan::for_paths(&paths) {
                    TriplePlan::Skip => {
                        info!(
                            "Skipping extraction for Chromosome {}, Resolution {}, Data {}: Files already exist.",
                            chromosome, resolution, data
                        );
                        report.skipped_triples += 1;
                        continue;
                    }
                    TriplePlan::Extract { sparse, dense } => (sparse, dense),
                };

                let matrix = match source.fetch_matrix(chromosome, data, NORMALIZATION, resolution, end) {
                    Ok(matrix) => matrix,
                    Err(e) => {
                        error!("{}", e);
                        report.failures += 1;
                        continue;
                    }
                };

                if sparse {
                    match write_sparse(&paths.sparse, &matrix, chromosome, resolution) {
                        Ok(n) => {
                            debug!("Wrote {} lines to {}", n, paths.sparse.display());
                            report.sparse_written += 1;
                        }
                        Err(e) => {
                            error!("{}", e);
                            report.failures += 1;
                        }
                    }
                }

                if dense {
                    match write_dense(&paths.dense, &matrix) {
                        Ok(()) => {
                            debug!("Wrote {}", paths.dense.display());
                            report.dense_written += 1;
                        }
                        Err(e) => {
                            error!("{}", e);
                            report.failures += 1;
                        }
                    }
                }
            }
        }
    }
}

fn extract_combined<S: ContactSource + ?Sized>(
    source: &S,
    prefix: &str,
    inputs: &ExtractInputs,
    report: &mut ExtractReport,
) {
    for data in &inputs.data_types {
        let path = combined_path(prefix, data);
        if output_exists(&path) {
            info!(
                "Skipping combined extraction for Data {}: File already exists.",
                data
            );
            report.skipped_combined += 1;
            continue;
        }

        let mut combined = match CombinedWriter::create(&path) {
            Ok(writer) => writer,
            Err(e) => {
                error!("{}", e);
                report.failures += 1;
                continue;
            }
        };

        append_pairs(source, data, inputs, &mut combined, report);

        match combined.finish() {
            Ok(n) => {
                debug!("Wrote {} lines to {}", n, path.display());
                report.combined_written += 1;
            }
            Err(e) => {
                error!("{}", e);
                report.failures += 1;
            }
        }
    }
}

///
/// Append every (resolution, chromosome) pair of one data type in input order. A pair
/// that cannot be fetched or written is logged and left out.
///
fn append_pairs<S: ContactSource + ?Sized, W: Write>(
    source: &S,
    data: &str,
    inputs: &ExtractInputs,
    combined: &mut CombinedWriter<W>,
    report: &mut ExtractReport,
) {
    for &resolution in &inputs.resolutions {
        for chromosome in &inputs.chromosomes {
            let matrix = source.chromosome_length(chromosome).and_then(|end| {
                source.fetch_matrix(chromosome, data, COMBINED_NORMALIZATION, resolution, end)
            });
            let matrix = match matrix {
                Ok(matrix) => matrix,
                Err(e) => {
                    error!(
                        "Skipping Chromosome {}, Resolution {} in combined file for Data {}: {}",
                        chromosome, resolution, data, e
                    );
                    report.failures += 1;
                    continue;
                }
            };

            if let Err(e) = combined.append(&matrix, chromosome, resolution) {
                error!("{}", e);
                report.failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::path::Path;

    use ndarray::{Array2, array};
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::{TempDir, tempdir};

    use hictext_core::errors::HicError;

    use crate::consts::{SHORT_SCORE_DIR, WORKSPACE_DIR};
    use crate::error::Result;

    /// Matrices keyed by (chromosome, resolution), the same for every data type.
    #[derive(Default)]
    struct MockSource {
        lengths: HashMap<String, i64>,
        matrices: HashMap<(String, i64), Array2<f32>>,
        fetches: Cell<usize>,
        requests: RefCell<Vec<(String, String, String, i64, i64)>>,
    }

    impl MockSource {
        fn with_chromosome(mut self, chromosome: &str, length: i64) -> Self {
            self.lengths.insert(chromosome.to_string(), length);
            self
        }

        fn with_matrix(mut self, chromosome: &str, resolution: i64, matrix: Array2<f32>) -> Self {
            self.matrices.insert((chromosome.to_string(), resolution), matrix);
            self
        }
    }

    impl ContactSource for MockSource {
        fn chromosome_length(&self, chromosome: &str) -> Result<i64> {
            self.lengths
                .get(chromosome)
                .copied()
                .ok_or_else(|| ExtractError::ChromosomeLookup(chromosome.to_string()))
        }

        fn fetch_matrix(
            &self,
            chromosome: &str,
            data_type: &str,
            normalization: &str,
            resolution: i64,
            end: i64,
        ) -> Result<Array2<f32>> {
            self.fetches.set(self.fetches.get() + 1);
            self.requests.borrow_mut().push((
                chromosome.to_string(),
                data_type.to_string(),
                normalization.to_string(),
                resolution,
                end,
            ));
            self.matrices
                .get(&(chromosome.to_string(), resolution))
                .cloned()
                .ok_or_else(|| {
                    ExtractError::Fetch(HicError::MissingMatrix(format!("{}_{}", chromosome, chromosome)))
                })
        }
    }

    fn workspace() -> (TempDir, String) {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(SHORT_SCORE_DIR)).unwrap();
        std::fs::create_dir_all(dir.path().join(WORKSPACE_DIR)).unwrap();
        let prefix = format!("{}/", dir.path().display());
        (dir, prefix)
    }

    fn config(prefix: &str, resolutions: &str, chromosomes: &str, data_types: &str) -> ExtractConfig {
        ExtractConfig {
            path: prefix.to_string(),
            hic_url: "mock.hic".to_string(),
            resolutions: resolutions.to_string(),
            chromosomes: chromosomes.to_string(),
            data_types: data_types.to_string(),
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[fixture]
    fn source() -> MockSource {
        MockSource::default()
            .with_chromosome("1", 10000)
            .with_matrix("1", 5000, array![[2.0, 1.5, 0.0], [1.5, 0.0, 0.0], [0.0, 0.0, 0.0]])
    }

    #[rstest]
    fn test_single_triple(source: MockSource) {
        let (_dir, prefix) = workspace();

        let report = extract_from_source(&source, &config(&prefix, "5000", "1", "observed")).unwrap();

        let paths = OutputPaths::for_triple(&prefix, "1", 5000, "observed", "KR");
        assert_eq!(
            read(&paths.sparse),
            "0 1 0 0 0 1 0 1 2.00000\n0 1 0 0 0 1 5000 1 1.50000\n"
        );
        assert!(paths.dense.exists());
        assert_eq!(read(&combined_path(&prefix, "observed")), read(&paths.sparse));

        assert_eq!(report.sparse_written, 1);
        assert_eq!(report.dense_written, 1);
        assert_eq!(report.combined_written, 1);
        assert_eq!(report.failures, 0);

        let requests = source.requests.borrow();
        assert_eq!(requests[0], ("1".to_string(), "observed".to_string(), "KR".to_string(), 5000, 10000));
    }

    #[rstest]
    fn test_existing_outputs_are_not_fetched_again(source: MockSource) {
        let (_dir, prefix) = workspace();
        let paths = OutputPaths::for_triple(&prefix, "1", 5000, "observed", "KR");
        std::fs::write(&paths.sparse, "old sparse").unwrap();
        std::fs::write(&paths.dense, "old dense").unwrap();
        std::fs::write(combined_path(&prefix, "observed"), "old combined").unwrap();

        let report = extract_from_source(&source, &config(&prefix, "5000", "1", "observed")).unwrap();

        assert_eq!(source.fetches.get(), 0);
        assert_eq!(report.skipped_triples, 1);
        assert_eq!(report.skipped_combined, 1);
        assert_eq!(read(&paths.sparse), "old sparse");
        assert_eq!(read(&paths.dense), "old dense");
    }

    #[rstest]
    fn test_only_the_missing_file_is_written(source: MockSource) {
        let (_dir, prefix) = workspace();
        let paths = OutputPaths::for_triple(&prefix, "1", 5000, "observed", "KR");
        std::fs::write(&paths.sparse, "old sparse").unwrap();

        let report = extract_from_source(&source, &config(&prefix, "5000", "1", "observed")).unwrap();

        assert_eq!(read(&paths.sparse), "old sparse");
        assert!(paths.dense.exists());
        assert_eq!(report.sparse_written, 0);
        assert_eq!(report.dense_written, 1);
    }

    #[rstest]
    fn test_parse_failure_writes_nothing(source: MockSource) {
        let (dir, prefix) = workspace();

        let report = extract_from_source(&source, &config(&prefix, "abc", "1", "observed"));

        assert!(report.is_none());
        assert_eq!(source.fetches.get(), 0);
        assert_eq!(std::fs::read_dir(dir.path().join(SHORT_SCORE_DIR)).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(dir.path().join(WORKSPACE_DIR)).unwrap().count(), 0);
    }

    #[rstest]
    fn test_unknown_chromosome_is_skipped(source: MockSource) {
        let (_dir, prefix) = workspace();

        let report = extract_from_source(&source, &config(&prefix, "5000", "7,1", "observed")).unwrap();

        let unknown = OutputPaths::for_triple(&prefix, "7", 5000, "observed", "KR");
        assert!(!unknown.sparse.exists());
        assert!(!unknown.dense.exists());
        assert!(OutputPaths::for_triple(&prefix, "1", 5000, "observed", "KR").sparse.exists());
        assert_eq!(report.sparse_written, 1);
        // the combined pass reports the unknown chromosome
        assert_eq!(report.failures, 1);
        assert_eq!(
            read(&combined_path(&prefix, "observed")),
            "0 1 0 0 0 1 0 1 2.00000\n0 1 0 0 0 1 5000 1 1.50000\n"
        );
    }

    #[rstest]
    fn test_fetch_failure_skips_the_triple_only(source: MockSource) {
        let (_dir, prefix) = workspace();

        let report = extract_from_source(&source, &config(&prefix, "1000,5000", "1", "observed")).unwrap();

        let missing = OutputPaths::for_triple(&prefix, "1", 1000, "observed", "KR");
        assert!(!missing.sparse.exists());
        assert!(!missing.dense.exists());
        assert_eq!(report.sparse_written, 1);
        assert_eq!(report.dense_written, 1);
        // once per pass
        assert_eq!(report.failures, 2);
    }

    #[rstest]
    fn test_combined_file_follows_input_order() {
        let (_dir, prefix) = workspace();
        let source = MockSource::default()
            .with_chromosome("1", 10000)
            .with_chromosome("2", 5000)
            .with_matrix("1", 5000, array![[1.0, 0.0], [0.0, 2.0]])
            .with_matrix("2", 5000, array![[3.0]])
            .with_matrix("1", 10000, array![[4.0]])
            .with_matrix("2", 10000, array![[5.0]]);

        extract_from_source(&source, &config(&prefix, "10000,5000", "2,1", "oe")).unwrap();

        assert_eq!(
            read(&combined_path(&prefix, "oe")),
            "0 2 0 0 0 2 0 1 5.00000\n\
             0 1 0 0 0 1 0 1 4.00000\n\
             0 2 0 0 0 2 0 1 3.00000\n\
             0 1 0 0 0 1 0 1 1.00000\n\
             0 1 5000 0 0 1 5000 1 2.00000\n"
        );

        let requests = source.requests.borrow();
        assert!(requests.iter().all(|r| r.2 == COMBINED_NORMALIZATION));
    }

    /// Fails its first write, then accepts everything.
    #[derive(Default)]
    struct FailOnceWriter {
        failed: bool,
        written: Vec<u8>,
    }

    impl Write for FailOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(std::io::Error::other("no space left on device"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn test_combined_write_failure_skips_that_pair_only() {
        let source = MockSource::default()
            .with_chromosome("1", 5000)
            .with_chromosome("2", 5000)
            .with_matrix("1", 5000, array![[1.0]])
            .with_matrix("2", 5000, array![[3.0]]);
        let inputs = ExtractInputs::parse("5000", "1,2", "observed").unwrap();
        let mut combined = CombinedWriter::from_writer("combined.txt".to_string(), FailOnceWriter::default());
        let mut report = ExtractReport::default();

        append_pairs(&source, "observed", &inputs, &mut combined, &mut report);

        assert_eq!(report.failures, 1);
        assert_eq!(
            String::from_utf8(combined.get_ref().written.clone()).unwrap(),
            "0 2 0 0 0 2 0 1 3.00000\n"
        );
        assert_eq!(combined.finish().unwrap(), 1);
    }

    #[rstest]
    fn test_missing_output_directories_are_logged_not_fatal(source: MockSource) {
        let dir = tempdir().unwrap();
        let prefix = format!("{}/", dir.path().display());

        let report = extract_from_source(&source, &config(&prefix, "5000", "1", "observed,oe")).unwrap();

        assert_eq!(report.sparse_written, 0);
        assert_eq!(report.dense_written, 0);
        assert_eq!(report.combined_written, 0);
        // sparse and dense for two data types, then two combined files
        assert_eq!(report.failures, 6);
    }

    #[rstest]
    fn test_unopenable_source() {
        let dir = tempdir().unwrap();
        let prefix = format!("{}/", dir.path().display());
        let mut cfg = config(&prefix, "5000", "1", "observed");
        cfg.hic_url = dir.path().join("missing.hic").display().to_string();

        assert!(extract_hic_data(&cfg).is_none());
    }
}
