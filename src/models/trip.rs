use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::geo::{GeoPoint, Location};

pub const TRIPS_TABLE: &str = "trips";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    #[default]
    Requested,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Requested => "requested",
            TripStatus::Accepted => "accepted",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Forward one step along requested → accepted → in_progress → completed,
    /// or to cancelled from any non-terminal status.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        use TripStatus::*;
        matches!(
            (*self, next),
            (Requested, Accepted)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Requested | Accepted | InProgress, Cancelled)
        )
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(TripStatus::Requested),
            "accepted" => Ok(TripStatus::Accepted),
            "in_progress" => Ok(TripStatus::InProgress),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown trip status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerSummary {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A row of the trips table.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    /// Assigned by the backend. Treated as opaque text.
    pub id: String,
    pub passenger_id: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    pub pickup_location: GeoPoint,
    #[serde(default)]
    pub dropoff_location: Option<GeoPoint>,
    pub pickup_address: String,
    #[serde(default)]
    pub dropoff_address: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_luggage: bool,
    #[serde(default)]
    pub luggage_count: Option<u32>,
    pub status: TripStatus,
    #[serde(default)]
    pub passenger: Option<PassengerSummary>,
    pub created_at: DateTime<Utc>,
}

/// The record inserted when a passenger requests a trip.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewTrip {
    pub passenger_id: String,
    pub pickup_location: GeoPoint,
    pub dropoff_location: GeoPoint,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub status: TripStatus,
}

impl NewTrip {
    pub fn requested(
        passenger_id: impl Into<String>,
        pickup: &Location,
        dropoff: &Location,
    ) -> Self {
        Self {
            passenger_id: passenger_id.into(),
            pickup_location: pickup.point(),
            dropoff_location: dropoff.point(),
            pickup_address: pickup.address.clone(),
            dropoff_address: dropoff.address.clone(),
            status: TripStatus::Requested,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// Realtime notification for a change on the trips table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripChange {
    pub event: ChangeEvent,
    pub new: Trip,
    /// Partial previous row; only the replicated columns are present.
    #[serde(default)]
    pub old: Option<Map<String, Value>>,
}

impl TripChange {
    pub fn previous_status(&self) -> Option<TripStatus> {
        self.old
            .as_ref()?
            .get("status")?
            .as_str()?
            .parse()
            .ok()
    }

    /// `(before, after)` when this update changed the status.
    pub fn status_change(&self) -> Option<(TripStatus, TripStatus)> {
        if self.event != ChangeEvent::Update {
            return None;
        }
        let before = self.previous_status()?;
        (before != self.new.status).then_some((before, self.new.status))
    }

    pub fn is_valid_transition(&self) -> bool {
        self.status_change()
            .map_or(true, |(before, after)| before.can_transition_to(after))
    }
}
