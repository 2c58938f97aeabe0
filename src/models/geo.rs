use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_with::SerializeDisplay;
use thiserror::Error;

/// A WGS84 position.
///
/// Serialized as WKT `POINT(<lng> <lat>)`, which is what the trips table and
/// the proximity RPC accept. Deserialization also understands the GeoJSON
/// shape the backend returns when reading geometry columns.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT({} {})", self.lng, self.lat)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid point {0:?}")]
pub struct ParsePointError(String);

impl FromStr for GeoPoint {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePointError(s.to_string());

        // EWKT carries an SRID prefix, e.g. `SRID=4326;POINT(-3 40)`.
        let wkt = match s.split_once(';') {
            Some((srid, rest)) if srid.trim().to_ascii_uppercase().starts_with("SRID=") => rest,
            Some(_) => return Err(invalid()),
            None => s,
        };
        let wkt = wkt.trim();
        let body = match wkt.get(..5) {
            Some(tag) if tag.eq_ignore_ascii_case("POINT") => &wkt[5..],
            _ => return Err(invalid()),
        };
        let inner = body
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let mut parts = inner.split_whitespace();
        let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let lng = lng.parse::<f64>().map_err(|_| invalid())?;
        let lat = lat.parse::<f64>().map_err(|_| invalid())?;
        Ok(Self { lat, lng })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Text(String),
    GeoJson { coordinates: [f64; 2] },
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ParsePointError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        match raw {
            RawPoint::Text(text) => text.parse(),
            RawPoint::GeoJson {
                coordinates: [lng, lat],
            } => Ok(Self { lat, lng }),
        }
    }
}

/// A pickup or dropoff as entered by the passenger.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}
