use clap::{Arg, Command};

pub const PATH_ARG: &str = "path";
pub const HIC_URL_ARG: &str = "hic_url";
pub const RESOLUTIONS_ARG: &str = "resolutions";
pub const CHROMOSOMES_ARG: &str = "chromosomes";
pub const DATA_TYPES_ARG: &str = "data_types";

/// The five positional arguments of an extraction run.
pub fn add_extract_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(PATH_ARG)
                .required(true)
                .help("Prefix of the output paths, including the trailing separator"),
        )
        .arg(
            Arg::new(HIC_URL_ARG)
                .required(true)
                .help("Path or http(s) URL of the .hic file"),
        )
        .arg(
            Arg::new(RESOLUTIONS_ARG)
                .required(true)
                .help("Comma separated bin sizes, e.g. 5000,10000"),
        )
        .arg(
            Arg::new(CHROMOSOMES_ARG)
                .required(true)
                .help("Comma separated chromosome indices, e.g. 1,2,3"),
        )
        .arg(
            Arg::new(DATA_TYPES_ARG)
                .required(true)
                .help("Comma separated matrix types: observed, oe, expected"),
        )
}
