use crate::consts::{LIST_SEPARATOR, QUOTE};
use crate::error::{ExtractError, Result};

///
/// The three comma separated lists of a run, parsed.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractInputs {
    pub resolutions: Vec<i64>,
    pub chromosomes: Vec<String>,
    pub data_types: Vec<String>,
}

impl ExtractInputs {
    ///
    /// Parse the raw lists. Elements are trimmed and stray `'` quotes removed.
    ///
    /// # Arguments
    ///
    /// - resolutions: bin sizes, e.g. `"5000,10000"`
    /// - chromosomes: chromosome identifiers, e.g. `"1,2,'X'"`
    /// - data_types: matrix types, e.g. `"observed,oe"`
    ///
    pub fn parse(resolutions: &str, chromosomes: &str, data_types: &str) -> Result<Self> {
        let resolutions = split_list(resolutions)
            .into_iter()
            .map(|r| {
                r.trim().parse::<i64>().map_err(|source| ExtractError::Parse {
                    value: r.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        Ok(ExtractInputs {
            resolutions,
            chromosomes: split_list(chromosomes),
            data_types: split_list(data_types),
        })
    }
}

/// Split on commas, then strip whitespace and surrounding quotes from each element.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_SEPARATOR)
        .map(|item| item.trim().trim_matches(QUOTE).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("1,2,3", vec!["1", "2", "3"])]
    #[case(" 1 , 2 ", vec!["1", "2"])]
    #[case("'1','X'", vec!["1", "X"])]
    #[case("observed, 'oe'", vec!["observed", "oe"])]
    #[case("1,,2", vec!["1", "", "2"])]
    fn test_split_list(#[case] raw: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_list(raw), expected);
    }

    #[rstest]
    fn test_parse_inputs() {
        let inputs = ExtractInputs::parse("5000, '10000'", "1,'2'", "observed,oe").unwrap();

        assert_eq!(inputs.resolutions, vec![5000, 10000]);
        assert_eq!(inputs.chromosomes, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(inputs.data_types, vec!["observed".to_string(), "oe".to_string()]);
    }

    #[rstest]
    fn test_quoted_resolution_with_inner_space() {
        let inputs = ExtractInputs::parse("' 5000'", "1", "observed").unwrap();
        assert_eq!(inputs.resolutions, vec![5000]);
    }

    #[rstest]
    fn test_resolution_wider_than_i32() {
        let inputs = ExtractInputs::parse("3000000000,5000", "1", "observed").unwrap();
        assert_eq!(inputs.resolutions, vec![3_000_000_000, 5000]);
    }

    #[rstest]
    #[case("abc")]
    #[case("5000,abc")]
    #[case("")]
    #[case("5000.5")]
    fn test_invalid_resolution(#[case] resolutions: &str) {
        let result = ExtractInputs::parse(resolutions, "1", "observed");
        assert!(matches!(result, Err(ExtractError::Parse { .. })));
    }
}
