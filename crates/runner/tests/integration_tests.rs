//! Integration tests for the obstacle-search runner.

use std::fs;

use obstacle_search::SearchConfig;
use obstacle_search_runner::{run_generation, DirectoryStore, QgcMissionPlan, SyntheticGateway};
use tempfile::TempDir;

/// A mission whose second leg crosses the default generation area.
fn write_plan(dir: &TempDir) -> std::path::PathBuf {
    // Origin 47.0N 8.0E; one degree of latitude is 111 km.
    let lat = |north_m: f64| 47.0 + north_m / 111_000.0;
    let lon = |east_m: f64| 8.0 + east_m / (111_000.0 * 47.0_f64.to_radians().cos());
    let item = |east: f64, north: f64| {
        format!(
            r#"{{"command": 16, "Altitude": 20, "type": "SimpleItem",
                 "params": [0, 0, 0, null, {}, {}, 20]}}"#,
            lat(north),
            lon(east)
        )
    };
    let json = format!(
        r#"{{"fileType": "Plan", "mission": {{"items": [{}, {}, {}]}}, "version": 1}}"#,
        item(0.0, 0.0),
        item(-60.0, 25.0),
        item(60.0, 25.0)
    );
    let path = dir.path().join("mission.plan");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_generation_writes_cases_and_summary() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let mission = QgcMissionPlan::load(write_plan(&input)).unwrap();

    let config = SearchConfig::default().with_seed(21);
    let mut store = DirectoryStore::in_folder(output.path(), &config).unwrap();
    let gateway = SyntheticGateway::new(Some(5));
    let report = run_generation(config, &mission, gateway, &mut store, 20).unwrap();

    assert_eq!(report.evaluations, 20);
    assert!(report.has_measurement());

    // Synthetic distances stay below 40 m, so every evaluation is interesting.
    assert_eq!(report.interesting_cases, 20);
    assert_eq!(store.saved(), 20);
    for n in 1..=20 {
        assert!(output.path().join(format!("parameters_{n}.json")).is_file());
    }

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(summary["budget"], 20);
    assert_eq!(summary["evaluations"], 20);
    assert_eq!(summary["fitness_history"].as_array().map(Vec::len), Some(20));
    assert_eq!(
        summary["parent_fitness_history"].as_array().map(Vec::len),
        Some(20)
    );

    // The reference leg runs along y = 25 in local meters.
    let segment = &summary["segment"];
    let y = segment["start"]["y"].as_f64().unwrap();
    assert!((y - 25.0).abs() < 1e-3);
}

#[test]
fn test_interesting_threshold_limits_stored_cases() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let mission = QgcMissionPlan::load(write_plan(&input)).unwrap();

    let config = SearchConfig::default().with_interesting_distance(0.05);
    let mut store = DirectoryStore::in_folder(output.path(), &config).unwrap();
    let report = run_generation(config, &mission, SyntheticGateway::new(Some(6)), &mut store, 10)
        .unwrap();

    assert_eq!(report.interesting_cases, 0);
    assert_eq!(store.saved(), 0);
    assert!(output.path().join("report.json").is_file());
}
