use serde::{Deserialize, Serialize};

/// Default half-width of the clip window around the requested point, in degrees.
pub const DEFAULT_MARGIN_DEGREES: f64 = 0.3;

/// Rectangular latitude/longitude window used to clip gridded data.
///
/// Bounds are inclusive on every side.
///
/// # Examples
///
/// ```
/// use gridcast::BoundingBox;
///
/// let bbox = BoundingBox::around(4.6, -74.0, 0.3);
/// assert!(bbox.contains(4.6, -74.0));
/// assert!(bbox.west < bbox.east && bbox.south < bbox.north);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Expands a center point by `margin` degrees in each direction.
    pub fn around(latitude: f64, longitude: f64, margin: f64) -> Self {
        Self {
            west: longitude - margin,
            south: latitude - margin,
            east: longitude + margin,
            north: latitude + margin,
        }
    }

    pub fn contains_latitude(&self, latitude: f64) -> bool {
        latitude >= self.south && latitude <= self.north
    }

    pub fn contains_longitude(&self, longitude: f64) -> bool {
        longitude >= self.west && longitude <= self.east
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.contains_latitude(latitude) && self.contains_longitude(longitude)
    }

    /// Indices of `latitudes` that fall inside the box.
    pub(crate) fn latitude_indices(&self, latitudes: &[f64]) -> Vec<usize> {
        latitudes
            .iter()
            .enumerate()
            .filter(|(_, lat)| self.contains_latitude(**lat))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indices of `longitudes` that fall inside the box.
    pub(crate) fn longitude_indices(&self, longitudes: &[f64]) -> Vec<usize> {
        longitudes
            .iter()
            .enumerate()
            .filter(|(_, lon)| self.contains_longitude(**lon))
            .map(|(idx, _)| idx)
            .collect()
    }
}
