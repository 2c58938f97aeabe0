use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedPassenger,
    error::AppError,
    models::geo::{GeoPoint, Location},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", post(request_trip))
        .route("/drivers/nearby", get(nearby_drivers))
}

#[derive(Deserialize)]
struct TripRequest {
    pickup: Location,
    dropoff: Location,
}

async fn request_trip(
    State(state): State<AppState>,
    passenger: AuthenticatedPassenger,
    Json(body): Json<TripRequest>,
) -> Result<impl IntoResponse, AppError> {
    let trip = state
        .dispatcher_for(&passenger.0)
        .request_trip(passenger.passenger_id(), &body.pickup, &body.dropoff)
        .await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[derive(Deserialize)]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
}

async fn nearby_drivers(
    State(state): State<AppState>,
    passenger: AuthenticatedPassenger,
    Query(query): Query<NearbyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let drivers = state
        .dispatcher_for(&passenger.0)
        .nearby_drivers(GeoPoint::new(query.lat, query.lng), query.radius_km)
        .await?;
    Ok(Json(drivers))
}
