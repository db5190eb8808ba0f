//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use download_water_data::Revision;

/// Full Download Script for Global Surface Water Data.
#[derive(Parser, Debug)]
#[command(name = "download-water-data")]
#[command(version, about, disable_version_flag = true)]
pub struct Args {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// One or more datasets names to download (occurrence, change, seasonality,
    /// recurrence, transitions, extent), use the "-a" option to download all the datasets
    #[arg(value_name = "DS")]
    pub datasets: Vec<String>,

    /// Destination directory where to download the data (by default the current
    /// working directory is used)
    #[arg(short, long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Data revision
    #[arg(short, long, value_enum, default_value_t = RevisionArg::V1_1_2019)]
    pub revision: RevisionArg,

    /// Download all datasets
    #[arg(short, long)]
    pub all: bool,

    /// Rewrite existing files
    #[arg(short, long)]
    pub force: bool,

    /// Base URL of the file server (overrides WATER_DATA_URL and .waterdatarc)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevisionArg {
    #[value(name = "1_0")]
    V1_0,
    #[value(name = "1_1")]
    V1_1,
    #[value(name = "1_1_2019")]
    V1_1_2019,
}

impl From<RevisionArg> for Revision {
    fn from(arg: RevisionArg) -> Self {
        match arg {
            RevisionArg::V1_0 => Revision::V1_0,
            RevisionArg::V1_1 => Revision::V1_1,
            RevisionArg::V1_1_2019 => Revision::V1_1_2019,
        }
    }
}
