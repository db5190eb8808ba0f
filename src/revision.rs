//! Data revisions, dataset names and the URL/filename templates they select.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::grid::Tile;

/// Raster extension shared by every tile file.
pub const EXTENSION: &str = "tif";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionError {
    #[error("unknown data revision \"{0}\" (expected one of: 1_0, 1_1, 1_1_2019)")]
    Unknown(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("unknown dataset name \"{0}\"")]
    Unknown(String),
}

/// A release of the Global Surface Water product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    V1_0,
    V1_1,
    #[default]
    V1_1_2019,
}

impl Revision {
    pub const ALL: [Revision; 3] = [Revision::V1_0, Revision::V1_1, Revision::V1_1_2019];

    pub fn as_str(self) -> &'static str {
        match self {
            Revision::V1_0 => "1_0",
            Revision::V1_1 => "1_1",
            Revision::V1_1_2019 => "1_1_2019",
        }
    }

    /// Resolves the URL pattern, filename pattern and name padding for this revision.
    pub fn templates(self) -> Templates {
        match self {
            Revision::V1_0 => Templates {
                url_pattern: "downloads/{ds}/{file}",
                filename_pattern: "{ds}_{lon}_{lat}",
                padding: 15,
            },
            Revision::V1_1 => Templates {
                url_pattern: "downloads2/{ds}/{file}",
                filename_pattern: "{ds}_{lon}_{lat}_v1_1",
                padding: 20,
            },
            Revision::V1_1_2019 => Templates {
                url_pattern: "downloads2019v2/{ds}/{file}",
                filename_pattern: "{ds}_{lon}_{lat}v1_1_2019",
                padding: 24,
            },
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Revision::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| RevisionError::Unknown(s.to_string()))
    }
}

/// A category of surface water measurement, each covering the same tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Occurrence,
    Change,
    Seasonality,
    Recurrence,
    Transitions,
    Extent,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Occurrence,
        Dataset::Change,
        Dataset::Seasonality,
        Dataset::Recurrence,
        Dataset::Transitions,
        Dataset::Extent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::Occurrence => "occurrence",
            Dataset::Change => "change",
            Dataset::Seasonality => "seasonality",
            Dataset::Recurrence => "recurrence",
            Dataset::Transitions => "transitions",
            Dataset::Extent => "extent",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DatasetError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Templates {
    /// Path below the base URL; placeholders `{ds}` and `{file}`.
    pub url_pattern: &'static str,
    /// File stem with placeholders `{ds}`, `{lon}` and `{lat}`; [`EXTENSION`] is appended.
    pub filename_pattern: &'static str,
    /// Width of the filename column in progress output, on top of the dataset name.
    pub padding: usize,
}

impl Templates {
    pub fn filename(&self, dataset: Dataset, tile: &Tile) -> String {
        let stem = self
            .filename_pattern
            .replace("{ds}", dataset.as_str())
            .replace("{lon}", &tile.lon)
            .replace("{lat}", &tile.lat);
        format!("{stem}.{EXTENSION}")
    }

    /// URL path of `file` relative to the server base.
    pub fn url_path(&self, dataset: Dataset, file: &str) -> String {
        self.url_pattern
            .replace("{ds}", dataset.as_str())
            .replace("{file}", file)
    }

    /// Column width used to left-align filenames of `dataset`.
    pub fn name_width(&self, dataset: Dataset) -> usize {
        dataset.as_str().len() + self.padding
    }
}
