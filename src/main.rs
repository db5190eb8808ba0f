//! CLI entry point for the Global Surface Water downloader.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use download_water_data::{CancelToken, Client, Dataset, Downloader};
use tracing::debug;

mod cli;

use cli::Args;

const EXIT_UNKNOWN_DATASET: u8 = 1;
const EXIT_NOTHING_TO_DOWNLOAD: u8 = 2;

fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    // Not locked for the whole run: the interrupt handler writes to stdout too.
    let mut stdout = io::stdout();

    let datasets = match select_datasets(&args, &mut stdout)? {
        Ok(datasets) => datasets,
        Err(code) => return Ok(ExitCode::from(code)),
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        on_interrupt(&handler_token, &mut io::stdout());
        std::process::exit(0);
    })
    .context("failed to install interrupt handler")?;

    let directory = match args.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let directory = normalize(directory);

    let client = Client::new(args.url.clone(), None)?.with_progress(io::stderr().is_terminal());
    let downloader = Downloader::new(client, directory)
        .with_revision(args.revision.into())
        .with_force(args.force)
        .with_cancel_token(cancel);

    let summary = downloader.run(&datasets, &mut stdout)?;
    debug!(?summary, "download loop returned");

    Ok(ExitCode::SUCCESS)
}

/// Reports the interrupt, then removes the temp file of the tile in flight.
///
/// The message goes first so it is out before the loop can observe the
/// cancellation and return. Returns the removed path.
fn on_interrupt<W: Write>(token: &CancelToken, out: &mut W) -> Option<PathBuf> {
    let _ = writeln!(out, "\ninterrupted by user");
    let _ = out.flush();
    token.interrupt()
}

/// Resolves the datasets to download, or the exit status of a usage error.
fn select_datasets<W: Write>(
    args: &Args,
    out: &mut W,
) -> Result<std::result::Result<Vec<Dataset>, u8>> {
    if args.all {
        if args.datasets.is_empty() {
            writeln!(out, "downloading all datasets")?;
        } else {
            writeln!(
                out,
                "warning: both dataset names and the option \"-a\" were provided - \
                 ignoring datasets names and downloading all"
            )?;
        }
        return Ok(Ok(Dataset::ALL.to_vec()));
    }

    if args.datasets.is_empty() {
        eprintln!(
            "error: nothing to download - provide datasets names or use the \"-a\" option \
             to download all the datasets, for more information run with the \"-h\" option"
        );
        return Ok(Err(EXIT_NOTHING_TO_DOWNLOAD));
    }

    let mut datasets = Vec::with_capacity(args.datasets.len());
    for name in &args.datasets {
        match name.parse::<Dataset>() {
            Ok(ds) => datasets.push(ds),
            Err(e) => {
                eprintln!("error: {}", e);
                return Ok(Err(EXIT_UNKNOWN_DATASET));
            }
        }
    }
    Ok(Ok(datasets))
}

/// Lexically drops `.` components and trailing separators.
fn normalize(path: PathBuf) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use download_water_data::PartFile;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["download-water-data"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn all_flag_wins_over_names() {
        let mut out = Vec::new();
        let selected = select_datasets(&parse(&["occurrence", "bogus", "-a"]), &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(selected, Dataset::ALL.to_vec());
        assert!(String::from_utf8(out).unwrap().starts_with("warning:"));
    }

    #[test]
    fn all_flag_alone() {
        let mut out = Vec::new();
        let selected = select_datasets(&parse(&["--all"]), &mut out).unwrap().unwrap();
        assert_eq!(selected.len(), 6);
        assert_eq!(String::from_utf8(out).unwrap(), "downloading all datasets\n");
    }

    #[test]
    fn names_keep_their_order() {
        let mut out = Vec::new();
        let selected = select_datasets(&parse(&["extent", "change"]), &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(selected, vec![Dataset::Extent, Dataset::Change]);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_name_is_exit_one() {
        let mut out = Vec::new();
        let code = select_datasets(&parse(&["occurrence", "rivers"]), &mut out)
            .unwrap()
            .unwrap_err();
        assert_eq!(code, EXIT_UNKNOWN_DATASET);
    }

    #[test]
    fn nothing_requested_is_exit_two() {
        let mut out = Vec::new();
        let code = select_datasets(&parse(&[]), &mut out).unwrap().unwrap_err();
        assert_eq!(code, EXIT_NOTHING_TO_DOWNLOAD);
    }

    #[test]
    fn interrupt_removes_in_flight_part_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let done = dir.path().join("done.tif");
        std::fs::write(&done, b"complete").unwrap();

        let token = CancelToken::new();
        let (part, file) = PartFile::create(&dir.path().join("tile.tif"), &token).unwrap();
        drop(file);
        let temp = part.path().to_path_buf();

        let mut out = Vec::new();
        let removed = on_interrupt(&token, &mut out);

        assert_eq!(removed, Some(temp.clone()));
        assert!(!temp.exists());
        assert!(token.is_cancelled());
        assert_eq!(String::from_utf8(out).unwrap(), "\ninterrupted by user\n");
        assert_eq!(std::fs::read(&done).unwrap(), b"complete");
        drop(part);
    }

    #[test]
    fn interrupt_between_tiles_only_reports() {
        let token = CancelToken::new();
        let mut out = Vec::new();
        assert_eq!(on_interrupt(&token, &mut out), None);
        assert!(token.is_cancelled());
        assert!(!out.is_empty());
    }

    #[test]
    fn normalize_strips_cur_dir() {
        assert_eq!(normalize(PathBuf::from("./data/./gsw/")), PathBuf::from("data/gsw"));
        assert_eq!(normalize(PathBuf::from(".")), PathBuf::from("."));
    }
}
