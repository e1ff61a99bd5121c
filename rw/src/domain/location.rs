//! Geographic coordinates

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::OutOfRange {
                field: "latitude",
                value: latitude.to_string(),
                expected: "-90..90",
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::OutOfRange {
                field: "longitude",
                value: longitude.to_string(),
                expected: "-180..180",
            });
        }
        Ok(Self { latitude, longitude })
    }
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_location() {
        let loc = GeoLocation::new(52.52, 13.405).unwrap();
        assert_eq!(loc.to_string(), "52.5200°N, 13.4050°E");

        let south_west = GeoLocation::new(-33.8688, -70.0).unwrap();
        assert_eq!(south_west.to_string(), "33.8688°S, 70.0000°W");
    }

    #[test]
    fn test_out_of_range() {
        assert!(GeoLocation::new(91.0, 0.0).is_err());
        assert!(GeoLocation::new(0.0, -180.5).is_err());
        assert!(GeoLocation::new(f64::NAN, 0.0).is_err());
    }
}
