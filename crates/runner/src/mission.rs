//! QGroundControl mission plans.
//!
//! A `.plan` file is JSON; each simple mission item stores latitude and
//! longitude in `params[4]` and `params[5]`. Items without coordinates
//! (e.g. speed changes) carry `null` there and are skipped.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use obstacle_search::core::{FlightSegment, MissionSource, Point2D};

use crate::error::{Result, RunnerError};

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Converts a geographic position to local east/north meters around an origin.
///
/// Flat-earth approximation: longitude degrees are scaled by the cosine of the
/// origin latitude.
pub fn latlon_to_local(lat: f64, lon: f64, origin_lat: f64, origin_lon: f64) -> Point2D {
    let lon_scale = METERS_PER_DEGREE * origin_lat.to_radians().cos();
    Point2D::new(
        (lon - origin_lon) * lon_scale,
        (lat - origin_lat) * METERS_PER_DEGREE,
    )
}

/// A waypoint in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoWaypoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Altitude in meters, if the item declares one.
    pub altitude: Option<f64>,
    /// MAVLink command id.
    pub command: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(rename = "fileType", default)]
    file_type: String,
    mission: RawMission,
}

#[derive(Debug, Deserialize)]
struct RawMission {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    command: Option<u32>,
    #[serde(rename = "Altitude", default)]
    altitude: Option<f64>,
    #[serde(default)]
    params: Vec<Option<f64>>,
}

impl RawItem {
    fn waypoint(&self) -> Option<GeoWaypoint> {
        let lat = self.params.get(4).copied().flatten()?;
        let lon = self.params.get(5).copied().flatten()?;
        Some(GeoWaypoint {
            lat,
            lon,
            altitude: self.altitude,
            command: self.command,
        })
    }
}

/// Mission waypoints loaded from a QGroundControl plan.
#[derive(Debug, Clone)]
pub struct QgcMissionPlan {
    waypoints: Vec<GeoWaypoint>,
}

impl QgcMissionPlan {
    /// Loads a plan file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses plan JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPlan = serde_json::from_str(json)?;
        if !raw.file_type.is_empty() && raw.file_type != "Plan" {
            log::warn!("Unexpected plan fileType {:?}", raw.file_type);
        }

        let waypoints: Vec<GeoWaypoint> = raw
            .mission
            .items
            .iter()
            .filter_map(RawItem::waypoint)
            .collect();
        if waypoints.len() < 2 {
            return Err(RunnerError::InvalidPlan(format!(
                "need at least 2 waypoints with coordinates, found {}",
                waypoints.len()
            )));
        }

        log::debug!("Loaded mission with {} waypoints", waypoints.len());
        Ok(Self { waypoints })
    }

    /// Waypoints in mission order.
    pub fn waypoints(&self) -> &[GeoWaypoint] {
        &self.waypoints
    }

    /// Waypoints in local meters relative to the first waypoint.
    pub fn local_waypoints(&self) -> Vec<Point2D> {
        let origin = self.waypoints[0];
        self.waypoints
            .iter()
            .map(|w| latlon_to_local(w.lat, w.lon, origin.lat, origin.lon))
            .collect()
    }
}

impl MissionSource for QgcMissionPlan {
    fn trajectory_segments(&self) -> obstacle_search::Result<Vec<FlightSegment>> {
        Ok(self
            .local_waypoints()
            .windows(2)
            .map(|w| FlightSegment::new(w[0], w[1]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PLAN: &str = r#"{
        "fileType": "Plan",
        "groundStation": "QGroundControl",
        "mission": {
            "cruiseSpeed": 15,
            "hoverSpeed": 5,
            "items": [
                {"command": 22, "Altitude": 10, "type": "SimpleItem",
                 "params": [0, 0, 0, null, 47.3977, 8.5456, 10]},
                {"command": 178, "type": "SimpleItem",
                 "params": [1, 5, -1, 0, null, null, 0]},
                {"command": 16, "Altitude": 10, "type": "SimpleItem",
                 "params": [0, 0, 0, null, 47.3980, 8.5456, 10]},
                {"command": 16, "Altitude": 10, "type": "SimpleItem",
                 "params": [0, 0, 0, null, 47.3980, 8.5460, 10]}
            ]
        },
        "version": 1
    }"#;

    #[test]
    fn test_latlon_conversion() {
        let p = latlon_to_local(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 111_000.0);

        let q = latlon_to_local(60.0, 1.0, 60.0, 0.0);
        assert_relative_eq!(q.x, 55_500.0, epsilon = 1e-6);
        assert_relative_eq!(q.y, 0.0);
    }

    #[test]
    fn test_parse_skips_items_without_coordinates() {
        let plan = QgcMissionPlan::from_json(PLAN).unwrap();
        assert_eq!(plan.waypoints().len(), 3);
        assert_eq!(plan.waypoints()[0].command, Some(22));
        assert_eq!(plan.waypoints()[1].altitude, Some(10.0));
    }

    #[test]
    fn test_segments_are_local_meters() {
        let plan = QgcMissionPlan::from_json(PLAN).unwrap();
        let segments = plan.trajectory_segments().unwrap();
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].start, Point2D::new(0.0, 0.0));
        assert_relative_eq!(segments[0].end.x, 0.0);
        assert_relative_eq!(segments[0].end.y, 0.0003 * 111_000.0, epsilon = 1e-6);
        assert_eq!(segments[1].start, segments[0].end);
        assert!(segments[1].end.x > 0.0);
    }

    #[test]
    fn test_plan_without_enough_waypoints_is_rejected() {
        let json = r#"{"fileType": "Plan", "mission": {"items": [
            {"command": 16, "params": [0, 0, 0, null, 47.0, 8.0, 10]}
        ]}}"#;
        assert!(matches!(
            QgcMissionPlan::from_json(json),
            Err(RunnerError::InvalidPlan(_))
        ));
        assert!(matches!(
            QgcMissionPlan::from_json("not json"),
            Err(RunnerError::Json(_))
        ));
    }
}
