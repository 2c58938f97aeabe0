use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geo::GeoPoint;

/// A row returned by the proximity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyDriver {
    pub id: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
