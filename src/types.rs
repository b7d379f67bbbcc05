//! Typed models for Tessie vehicle data.
//!
//! The upstream payloads are large and evolve; required fields are limited
//! to identity, everything else is optional or kept as raw JSON so a new
//! upstream field never breaks decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One vehicle on the account roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vin: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Upstream activity status ("online", "asleep", ...).
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub last_state: Option<Value>,
}

/// Current rollup state for a vehicle. The nested Tesla state blobs are kept
/// as raw JSON; summarization lives in the consuming layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub charge_state: Option<Value>,
    #[serde(default)]
    pub climate_state: Option<Value>,
    #[serde(default)]
    pub drive_state: Option<Value>,
    #[serde(default)]
    pub vehicle_state: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryState {
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub usable_battery_level: Option<f64>,
    /// Rated range in miles.
    #[serde(default)]
    pub battery_range: Option<f64>,
    #[serde(default)]
    pub charging_state: Option<String>,
    #[serde(default)]
    pub charge_limit_soc: Option<i64>,
    #[serde(default)]
    pub time_to_full_charge: Option<f64>,
}

/// One historical state sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drive {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub starting_location: Option<String>,
    #[serde(default)]
    pub ending_location: Option<String>,
    #[serde(default)]
    pub odometer_distance: Option<f64>,
    #[serde(default)]
    pub duration_min: Option<f64>,
}

/// One point on a driving path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPoint {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Inclusive epoch-second window for historical queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl TimeRange {
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    pub(crate) fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = self.from {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to", to.to_string()));
        }
        params
    }
}

/// State-mutating command dispatched to a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Wake,
    Lock,
    Unlock,
    StartClimate,
    StopClimate,
    StartCharging,
    StopCharging,
    FlashLights,
    Honk,
}

impl Command {
    /// Path segment under `/{vin}/command/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Command::Wake => "wake",
            Command::Lock => "lock",
            Command::Unlock => "unlock",
            Command::StartClimate => "start_climate",
            Command::StopClimate => "stop_climate",
            Command::StartCharging => "start_charging",
            Command::StopCharging => "stop_charging",
            Command::FlashLights => "flash_lights",
            Command::Honk => "honk",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Upstream acknowledgement of a command dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vehicle_tolerates_unknown_fields() {
        let value = json!({
            "vin": "VIN123",
            "display_name": "Roadster",
            "brand_new_field": {"nested": true},
        });
        let vehicle: Vehicle = serde_json::from_value(value).unwrap();
        assert_eq!(vehicle.vin, "VIN123");
        assert_eq!(vehicle.display_name.as_deref(), Some("Roadster"));
    }

    #[test]
    fn snapshot_keeps_unmodeled_fields() {
        let value = json!({"timestamp": 1700000000, "odometer": 12345.6});
        let snapshot: StateSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.timestamp, Some(1700000000));
        assert_eq!(snapshot.fields["odometer"], 12345.6);
    }

    #[test]
    fn time_range_emits_only_present_bounds() {
        assert!(TimeRange::default().query_params().is_empty());
        let params = TimeRange::new(Some(100), None).query_params();
        assert_eq!(params, vec![("from", "100".to_string())]);
    }

    #[test]
    fn command_endpoints_are_stable() {
        assert_eq!(Command::Wake.endpoint(), "wake");
        assert_eq!(Command::StartClimate.endpoint(), "start_climate");
    }
}
