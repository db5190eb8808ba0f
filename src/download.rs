//! The per-dataset, per-tile download loop.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::client::Client;
use crate::error::FetchError;
use crate::grid::{self, TILE_COUNT, Tile};
use crate::revision::{Dataset, Revision, Templates};
use crate::util::digits;

/// One file to fetch, fully resolved from (dataset, revision, tile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 1-based position within the dataset.
    pub index: usize,
    pub tile: Tile,
    pub filename: String,
    pub url: String,
    pub path: PathBuf,
}

/// Terminal state of a single tile.
#[derive(Debug)]
pub enum TileOutcome {
    Skipped,
    Done,
    Failed(FetchError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The run stopped early because the cancel token was set.
    pub interrupted: bool,
}

impl Summary {
    fn record(&mut self, outcome: &TileOutcome) {
        match outcome {
            TileOutcome::Skipped => self.skipped += 1,
            TileOutcome::Done => self.done += 1,
            TileOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    directory: PathBuf,
    revision: Revision,
    force: bool,
    cancel: CancelToken,
}

impl Downloader {
    pub fn new(client: Client, directory: impl Into<PathBuf>) -> Self {
        Self {
            client,
            directory: directory.into(),
            revision: Revision::default(),
            force: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    /// Re-fetch and overwrite files that already exist.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn templates(&self) -> Templates {
        self.revision.templates()
    }

    /// Every file of `dataset`, in grid order.
    pub fn targets(&self, dataset: Dataset) -> Vec<Target> {
        let templates = self.templates();
        let dir = self.directory.join(dataset.as_str());
        grid::tiles()
            .into_iter()
            .enumerate()
            .map(|(i, tile)| {
                let filename = templates.filename(dataset, &tile);
                let url = self
                    .client
                    .url_for(&templates.url_path(dataset, &filename));
                let path = dir.join(&filename);
                Target {
                    index: i + 1,
                    tile,
                    filename,
                    url,
                    path,
                }
            })
            .collect()
    }

    /// Creates the destination root if needed and reports which one is used.
    pub fn prepare_directory<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.directory.is_dir() {
            writeln!(out, "Using destination directory \"{}\"", self.directory.display())?;
        } else {
            writeln!(
                out,
                "Creating destination directory \"{}\"",
                self.directory.display()
            )?;
            std::fs::create_dir_all(&self.directory).with_context(|| {
                format!("failed to create directory {}", self.directory.display())
            })?;
        }
        Ok(())
    }

    /// Downloads every tile of every dataset, writing one progress line per tile to `out`.
    ///
    /// Remote failures are reported and skipped over. Local filesystem errors end the run.
    pub fn run<W: Write>(&self, datasets: &[Dataset], out: &mut W) -> Result<Summary> {
        self.prepare_directory(out)?;

        let mut summary = Summary::default();
        let index_width = digits(TILE_COUNT);
        let templates = self.templates();

        for &dataset in datasets {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                return Ok(summary);
            }

            writeln!(out, "downloading {}", dataset)?;
            info!(%dataset, revision = %self.revision, "downloading dataset");

            let ds_dir = self.directory.join(dataset.as_str());
            std::fs::create_dir_all(&ds_dir)
                .with_context(|| format!("failed to create directory {}", ds_dir.display()))?;

            let name_width = templates.name_width(dataset);
            for target in self.targets(dataset) {
                if self.cancel.is_cancelled() {
                    summary.interrupted = true;
                    return Ok(summary);
                }

                let prefix = format!(
                    "{:>iw$}/{} {:<nw$}",
                    target.index,
                    TILE_COUNT,
                    target.filename,
                    iw = index_width,
                    nw = name_width
                );
                // Without a byte bar the line is written up front so the tile in flight shows.
                let early = !self.client.shows_progress();
                if early {
                    write!(out, "{}", prefix)?;
                    out.flush()?;
                }

                let outcome = match self.download_tile(&target) {
                    Ok(outcome) => outcome,
                    Err(FetchError::Cancelled) => {
                        summary.interrupted = true;
                        return Ok(summary);
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("failed to download {}", target.url));
                    }
                };

                if !early {
                    write!(out, "{}", prefix)?;
                }
                match &outcome {
                    TileOutcome::Skipped => writeln!(out, "already exists, skipping")?,
                    TileOutcome::Done => writeln!(out, "ok")?,
                    TileOutcome::Failed(e) => writeln!(out, "{} - {}", target.filename, e)?,
                }
                out.flush()?;
                summary.record(&outcome);
            }
        }

        info!(
            done = summary.done,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        writeln!(out, "finished")?;
        Ok(summary)
    }

    /// Fetches one tile unless it is already on disk.
    ///
    /// Only cancellation and local I/O failures come back as `Err`.
    pub fn download_tile(&self, target: &Target) -> Result<TileOutcome, FetchError> {
        if !self.force && target.path.exists() {
            debug!(tile = %target.tile, path = %target.path.display(), "already exists");
            return Ok(TileOutcome::Skipped);
        }

        debug!(tile = %target.tile, index = target.index, "fetching tile");
        match self.client.fetch(&target.url, &target.path, &self.cancel) {
            Ok(_) => Ok(TileOutcome::Done),
            Err(e) if e.is_remote() => {
                warn!(url = %target.url, error = %e, "tile failed");
                Ok(TileOutcome::Failed(e))
            }
            Err(e) => Err(e),
        }
    }
}
