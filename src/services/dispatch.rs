use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{BackendError, DispatchError},
    models::{
        driver::NearbyDriver,
        geo::{GeoPoint, Location},
        trip::{NewTrip, Trip, TRIPS_TABLE},
    },
};

use super::backend::DataBackend;

pub const NEARBY_DRIVERS_RPC: &str = "find_nearby_drivers";
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Forwards trip requests and driver lookups to the data backend.
///
/// Holds no state of its own; every call is one backend round trip.
#[derive(Clone)]
pub struct TripDispatcher {
    data: Arc<dyn DataBackend>,
}

impl TripDispatcher {
    pub fn new(data: Arc<dyn DataBackend>) -> Self {
        Self { data }
    }

    /// Inserts a new trip in `requested` status. Not idempotent: every call
    /// creates a separate trip. Coordinates are forwarded as given.
    pub async fn request_trip(
        &self,
        passenger_id: &str,
        pickup: &Location,
        dropoff: &Location,
    ) -> Result<Trip, DispatchError> {
        if passenger_id.trim().is_empty() {
            return Err(DispatchError::MissingPassenger);
        }

        let record = serde_json::to_value(NewTrip::requested(passenger_id, pickup, dropoff))
            .map_err(BackendError::from)?;
        let stored = self.data.insert(TRIPS_TABLE, record).await.map_err(|err| {
            warn!(passenger_id, error = %err, "trip request failed");
            err
        })?;
        let trip: Trip = serde_json::from_value(stored).map_err(BackendError::from)?;

        info!(trip_id = %trip.id, passenger_id, "trip requested");
        Ok(trip)
    }

    /// Drivers within `radius_km` (default 5) of `location`.
    pub async fn nearby_drivers(
        &self,
        location: GeoPoint,
        radius_km: Option<f64>,
    ) -> Result<Vec<NearbyDriver>, DispatchError> {
        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(DispatchError::InvalidRadius(radius_km));
        }

        let args = json!({
            "passenger_location": location.to_string(),
            "radius_km": radius_km,
        });
        let rows = self
            .data
            .rpc(NEARBY_DRIVERS_RPC, args)
            .await
            .map_err(|err| {
                warn!(%location, radius_km, error = %err, "nearby driver lookup failed");
                err
            })?;

        // PostgREST answers an empty set-returning function with `null` on some versions.
        if rows.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(rows).map_err(BackendError::from)?)
    }
}
