//! Downloader for the Global Surface Water data of the Copernicus Programme.
//!
//! The data is published as a fixed grid of 504 GeoTIFF tiles (10x10 degrees)
//! per dataset and revision. This crate enumerates that grid, resolves the
//! file server URL and local filename of every tile, and fetches them one by
//! one into `<directory>/<dataset>/`, skipping files already on disk.
//!
//! ```no_run
//! use anyhow::Result;
//! use download_water_data::{Client, Dataset, Downloader, Revision};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let summary = Downloader::new(client, "gsw")
//!         .with_revision(Revision::V1_1_2019)
//!         .run(&[Dataset::Occurrence], &mut std::io::stdout())?;
//!     println!("{} new, {} failed", summary.done, summary.failed);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod cancel;
mod client;
mod config;
mod download;
mod error;
mod grid;
mod part;
mod revision;
mod util;

pub use cancel::CancelToken;
pub use client::{Client, ClientConfig};
pub use config::DEFAULT_BASE_URL;
pub use download::{Downloader, Summary, Target, TileOutcome};
pub use error::FetchError;
pub use grid::{LAT_COUNT, LON_COUNT, TILE_COUNT, Tile, latitudes, longitudes, tiles};
pub use part::PartFile;
pub use revision::{Dataset, DatasetError, EXTENSION, Revision, RevisionError, Templates};
