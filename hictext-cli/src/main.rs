mod extract;

use std::io::Write;

use anyhow::Result;
use clap::Command;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "hictext";
    pub const LOG_ENV: &str = "RUST_LOG";
}

fn build_parser() -> Command {
    let command = Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Extract Hi-C contact matrices into sparse text and HDF5 files, for every resolution, chromosome and data type.");
    extract::cli::add_extract_args(command)
}

/// Info messages go out bare, everything else is tagged with its level.
fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "[{}] {}", level, record.args()),
        })
        .filter(None, LevelFilter::Info)
        .parse_env(consts::LOG_ENV)
        .init();
}

fn main() -> Result<()> {
    init_logger();

    let app = build_parser();
    let matches = app.get_matches();

    extract::handlers::run_extract(&matches)?;

    Ok(())
}
