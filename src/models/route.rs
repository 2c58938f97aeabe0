use serde::{Deserialize, Serialize};

/// One leg of an optimized multi-stop route, written by the route optimizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStep {
    pub trip_id: String,
    pub sequence_order: i32,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptimizedRoute {
    pub trip_id: String,
    pub steps: Vec<RouteStep>,
}

impl OptimizedRoute {
    /// Collects the steps belonging to `trip_id` in sequence order. Steps for
    /// other trips are ignored, so a whole table scan can be passed in.
    pub fn for_trip(trip_id: &str, steps: impl IntoIterator<Item = RouteStep>) -> Self {
        let mut steps: Vec<RouteStep> = steps
            .into_iter()
            .filter(|step| step.trip_id == trip_id)
            .collect();
        steps.sort_by_key(|step| step.sequence_order);
        Self {
            trip_id: trip_id.to_string(),
            steps,
        }
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.steps.iter().map(|step| step.distance_meters).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
