use anyhow::{Context, Result};
use clap::ArgMatches;
use log::debug;

use hictext_extract::{ExtractConfig, ExtractReport, extract_hic_data};

use super::cli::*;

fn positional(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("Missing argument: {}", name))
}

pub fn config_from_matches(matches: &ArgMatches) -> Result<ExtractConfig> {
    Ok(ExtractConfig {
        path: positional(matches, PATH_ARG)?,
        hic_url: positional(matches, HIC_URL_ARG)?,
        resolutions: positional(matches, RESOLUTIONS_ARG)?,
        chromosomes: positional(matches, CHROMOSOMES_ARG)?,
        data_types: positional(matches, DATA_TYPES_ARG)?,
    })
}

///
/// Run an extraction. Problems during the run are logged by the extractor and never
/// turn into a failing exit status; `None` means the run stopped before writing anything.
///
pub fn run_extract(matches: &ArgMatches) -> Result<Option<ExtractReport>> {
    let config = config_from_matches(matches)?;
    let report = extract_hic_data(&config);
    match &report {
        Some(report) => debug!(
            "{} sparse, {} dense and {} combined files written, {} skipped, {} failures",
            report.sparse_written,
            report.dense_written,
            report.combined_written,
            report.skipped_triples + report.skipped_combined,
            report.failures
        ),
        None => debug!("Extraction stopped before writing"),
    }
    Ok(report)
}
