//! Metric Zone Grid
//!
//! Square cells of fixed side length in Web-Mercator meters, laid over a
//! lat/lon bounding box. Cells are numbered column-major from the south-west
//! corner: `id = ix * n_rows + iy`.

use super::zones::ZoneAssigner;
use crate::app::config::GridConfig;
use crate::trajectory::ZoneId;

/// Spherical Web-Mercator radius (meters)
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web-Mercator projection (degrees)
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

fn to_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let x = MERCATOR_RADIUS_M * lon.to_radians();
    let y = MERCATOR_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Regular grid zone assigner
#[derive(Debug, Clone)]
pub struct GridZoneAssigner {
    cell_size_m: f64,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    origin: (f64, f64),
    n_cols: usize,
    n_rows: usize,
}

impl GridZoneAssigner {
    /// Build a grid over the given bounds
    pub fn new(
        cell_size_m: f64,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> crate::Result<Self> {
        if !(cell_size_m.is_finite() && cell_size_m > 0.0) {
            return Err(crate::Error::Config(format!(
                "grid cell size must be positive, got {}", cell_size_m
            )));
        }
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(crate::Error::Config("grid bounds must be ordered".to_string()));
        }
        if min_lat < -MERCATOR_MAX_LAT || max_lat > MERCATOR_MAX_LAT {
            return Err(crate::Error::Config(format!(
                "grid latitude bounds must lie within +/-{}", MERCATOR_MAX_LAT
            )));
        }

        let origin = to_mercator(min_lat, min_lon);
        let corner = to_mercator(max_lat, max_lon);
        let n_cols = ((corner.0 - origin.0) / cell_size_m).ceil().max(1.0) as usize;
        let n_rows = ((corner.1 - origin.1) / cell_size_m).ceil().max(1.0) as usize;

        if n_cols.saturating_mul(n_rows) > ZoneId::MAX as usize {
            return Err(crate::Error::Config(format!(
                "grid of {} x {} cells exceeds the zone id range", n_cols, n_rows
            )));
        }

        Ok(Self {
            cell_size_m,
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            origin,
            n_cols,
            n_rows,
        })
    }

    pub fn from_config(config: &GridConfig) -> crate::Result<Self> {
        Self::new(
            config.cell_size_m,
            config.min_lat,
            config.max_lat,
            config.min_lon,
            config.max_lon,
        )
    }

    /// Number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.n_cols * self.n_rows
    }

    /// Grid dimensions as `(columns, rows)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.n_cols, self.n_rows)
    }

    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }
}

impl ZoneAssigner for GridZoneAssigner {
    fn assign_zone(&self, lat: f64, lon: f64) -> Option<ZoneId> {
        if !(self.min_lat..=self.max_lat).contains(&lat) || !(self.min_lon..=self.max_lon).contains(&lon) {
            return None;
        }
        let (x, y) = to_mercator(lat, lon);
        let ix = (((x - self.origin.0) / self.cell_size_m).floor().max(0.0) as usize).min(self.n_cols - 1);
        let iy = (((y - self.origin.1) / self.cell_size_m).floor().max(0.0) as usize).min(self.n_rows - 1);
        Some((ix * self.n_rows + iy) as ZoneId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> GridZoneAssigner {
        // Roughly 0.1 degree box near the equator with 2 km cells
        GridZoneAssigner::new(2000.0, 0.0, 0.1, 0.0, 0.1).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let grid = small_grid();
        // 0.1 degree of longitude is ~11.13 km in Mercator meters -> 6 columns
        assert_eq!(grid.dimensions(), (6, 6));
        assert_eq!(grid.cell_count(), 36);
    }

    #[test]
    fn test_corner_cells() {
        let grid = small_grid();
        assert_eq!(grid.assign_zone(0.0, 0.0), Some(0));
        assert_eq!(grid.assign_zone(0.1, 0.1), Some(35));
        // One cell north of the origin is the next id in the same column
        assert_eq!(grid.assign_zone(0.025, 0.001), Some(1));
        // One cell east is a full column further on
        assert_eq!(grid.assign_zone(0.001, 0.025), Some(6));
    }

    #[test]
    fn test_outside_bounds() {
        let grid = small_grid();
        assert_eq!(grid.assign_zone(-0.01, 0.05), None);
        assert_eq!(grid.assign_zone(0.05, 0.2), None);
    }

    #[test]
    fn test_default_config_grid() {
        let grid = GridZoneAssigner::from_config(&GridConfig::default()).unwrap();
        assert!(grid.cell_count() > 1000);
        // Ljubljana
        assert!(grid.assign_zone(46.05, 14.50).is_some());
        // Vienna lies outside the box
        assert!(grid.assign_zone(48.2, 16.37).is_none());
    }

    #[test]
    fn test_invalid_grids() {
        assert!(GridZoneAssigner::new(0.0, 0.0, 1.0, 0.0, 1.0).is_err());
        assert!(GridZoneAssigner::new(100.0, 1.0, 0.0, 0.0, 1.0).is_err());
        assert!(GridZoneAssigner::new(100.0, 0.0, 89.0, 0.0, 1.0).is_err());
    }
}
