/// Bounding-box regions

use std::fmt;
use std::str::FromStr;

use h3o::Resolution;

use crate::antimeridian::Ring;
use crate::constants::{ANTIMERIDIAN_LNG, POLE_LAT};
use crate::error::SeeH3Error;

/// Axis-aligned box in degrees, written `min_lng,min_lat,max_lng,max_lat`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Box with longitudes clamped to ±180 and latitudes to ±90
    pub fn clipped(&self) -> Self {
        let lng = |v: f64| v.clamp(-ANTIMERIDIAN_LNG, ANTIMERIDIAN_LNG);
        let lat = |v: f64| v.clamp(-POLE_LAT, POLE_LAT);
        Self::new(lng(self.min_lng), lat(self.min_lat), lng(self.max_lng), lat(self.max_lat))
    }

    pub fn lng_span(&self) -> f64 {
        (self.max_lng - self.min_lng).abs()
    }

    /// Corner ring in `(lng, lat)` order: NW, SW, SE, NE
    pub fn ring(&self) -> Ring {
        vec![
            (self.min_lng, self.max_lat),
            (self.min_lng, self.min_lat),
            (self.max_lng, self.min_lat),
            (self.max_lng, self.max_lat),
        ]
    }

    /// Solr range filter on a lat,lng point field
    pub fn spatial_filter(&self, field: &str) -> String {
        format!(
            "{field}:[{},{} TO {},{}]",
            self.min_lat, self.min_lng, self.max_lat, self.max_lng
        )
    }
}

impl FromStr for BoundingBox {
    type Err = SeeH3Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| SeeH3Error::MalformedInput(format!("bad bounding box coordinate {part:?}")))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values[..] {
            [min_lng, min_lat, max_lng, max_lat] => Ok(Self::new(min_lng, min_lat, max_lng, max_lat)),
            _ => Err(SeeH3Error::MalformedInput(format!(
                "bounding box needs 4 values, got {}",
                values.len()
            ))),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_lng, self.min_lat, self.max_lng, self.max_lat)
    }
}

/// Resolution for record counts over a region, picked from its longitude span
pub fn estimate_resolution(bb: Option<&BoundingBox>) -> Resolution {
    let Some(bb) = bb else {
        return Resolution::One;
    };
    let dx = bb.lng_span();
    if dx > 90.0 {
        Resolution::Two
    } else if dx > 45.0 {
        Resolution::Three
    } else if dx > 22.0 {
        Resolution::Four
    } else if dx > 10.0 {
        Resolution::Five
    } else if dx > 5.0 {
        Resolution::Six
    } else if dx > 2.0 {
        Resolution::Seven
    } else if dx > 1.0 {
        Resolution::Eight
    } else if dx > 0.5 {
        Resolution::Nine
    } else {
        Resolution::Ten
    }
}
