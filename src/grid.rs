use std::fmt;

/// Size of a tile edge in degrees.
pub const STEP: usize = 10;

/// Number of longitude labels (18 west + 18 east).
pub const LON_COUNT: usize = 36;

/// Number of latitude labels (5 south + 9 north).
pub const LAT_COUNT: usize = 14;

/// Total number of tiles per dataset.
pub const TILE_COUNT: usize = LON_COUNT * LAT_COUNT;

/// A 10x10 degree cell identified by the labels of its longitude and latitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    pub lon: String,
    pub lat: String,
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lon, self.lat)
    }
}

/// Longitude labels, `180W` down to `10W`, then `0E` up to `170E`.
pub fn longitudes() -> Vec<String> {
    let west = (STEP..=180).rev().step_by(STEP).map(|w| format!("{w}W"));
    let east = (0..180).step_by(STEP).map(|e| format!("{e}E"));
    west.chain(east).collect()
}

/// Latitude labels, `50S` down to `10S`, then `0N` up to `80N`.
pub fn latitudes() -> Vec<String> {
    let south = (STEP..=50).rev().step_by(STEP).map(|s| format!("{s}S"));
    let north = (0..90).step_by(STEP).map(|n| format!("{n}N"));
    south.chain(north).collect()
}

/// The full tile grid, longitude outer and latitude inner.
pub fn tiles() -> Vec<Tile> {
    let lats = latitudes();
    longitudes()
        .into_iter()
        .flat_map(|lon| {
            lats.iter().map(move |lat| Tile {
                lon: lon.clone(),
                lat: lat.clone(),
            })
        })
        .collect()
}
