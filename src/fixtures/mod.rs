//! Fixture utilities for the deterministic CLI harness.
//!
//! Fixtures are JSON session scripts (start, stop, reset and raw counter
//! readings) with optional expectation files. The runner replays a script
//! through a `TrackerHandle` fed by a `HostFeedBackend`, so every reading takes
//! the same subscription path a host event would.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::engine::{HostFeedBackend, TrackerHandle};
use crate::tracking::{SensorKind, SensorObservation, SessionSnapshot};

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";
const DISTANCE_TOLERANCE: f64 = 1e-6;

/// Largest counter value an `f32` reading carries exactly (2^24).
pub const MAX_EXACT_COUNTER: u64 = 1 << 24;

/// One scripted step of a fixture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FixtureOp {
    Start,
    Stop,
    Reset,
    /// Raw cumulative counter value as the platform reports it
    Reading {
        value: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp_ns: Option<u64>,
        /// Platform sensor type id; defaults to the step counter
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sensor: Option<i32>,
    },
}

impl FixtureOp {
    pub fn reading(value: f32) -> Self {
        FixtureOp::Reading {
            value,
            timestamp_ns: None,
            sensor: None,
        }
    }

    /// Observation for a reading op; `index` stands in for a missing timestamp.
    pub fn observation(&self, index: usize) -> Option<SensorObservation> {
        match self {
            FixtureOp::Reading {
                value,
                timestamp_ns,
                sensor,
            } => {
                let kind = sensor
                    .map(SensorKind::from_platform_type)
                    .unwrap_or(SensorKind::StepCounter);
                let timestamp_ns = timestamp_ns.unwrap_or(index as u64 * 1_000_000);
                Some(SensorObservation::from_raw_value(kind, timestamp_ns, *value))
            }
            _ => None,
        }
    }
}

/// Ordered session script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub ops: Vec<FixtureOp>,
}

impl FixtureScript {
    /// Observations of every reading op, in order.
    pub fn observations(&self) -> Vec<SensorObservation> {
        self.ops
            .iter()
            .enumerate()
            .filter_map(|(index, op)| op.observation(index))
            .collect()
    }
}

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub script_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture script plus expectations.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub script: FixtureScript,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureExpectations {
    #[serde(default)]
    pub fixture: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Step counts published while tracking, in order
    #[serde(default)]
    pub step_counts: Option<Vec<u64>>,
    #[serde(default)]
    pub final_step_count: Option<u64>,
    #[serde(default)]
    pub final_distance_meters: Option<f64>,
}

impl FixtureExpectations {
    pub fn verify(&self, report: &FixtureReport) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        if let Some(expected) = &self.step_counts {
            if expected != &report.step_counts {
                failures.push(ExpectationFailure::new(
                    "step_counts",
                    serde_json::json!(expected),
                    serde_json::json!(report.step_counts),
                ));
            }
        }

        if let Some(expected) = self.final_step_count {
            if expected != report.final_snapshot.step_count {
                failures.push(ExpectationFailure::new(
                    "final_step_count",
                    serde_json::json!(expected),
                    serde_json::json!(report.final_snapshot.step_count),
                ));
            }
        }

        if let Some(expected) = self.final_distance_meters {
            let actual = report.final_snapshot.distance_meters;
            if (expected - actual).abs() > DISTANCE_TOLERANCE {
                failures.push(ExpectationFailure::new(
                    "final_distance_meters",
                    serde_json::json!(expected),
                    serde_json::json!(actual),
                ));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: &'static str,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

impl ExpectationFailure {
    fn new(field: &'static str, expected: serde_json::Value, actual: serde_json::Value) -> Self {
        Self {
            field,
            expected,
            actual,
        }
    }
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let is_script = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(".json") && !name.ends_with(EXPECT_SUFFIX))
                .unwrap_or(false);
            if is_script {
                fixtures.push(self.metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture script + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let script_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&script_path)?;

        let json = fs::read_to_string(&script_path)
            .with_context(|| format!("reading fixture {}", script_path.display()))?;
        let script: FixtureScript = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", script_path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            script,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, script_path: &Path) -> Result<FixtureMetadata> {
        let name = script_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", script_path.display()))?
            .to_string();
        let expect_path = script_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            script_path: script_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Result of running one fixture script.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub fixture: String,
    pub op_count: usize,
    /// Step counts published while tracking, in order
    pub step_counts: Vec<u64>,
    /// Every published snapshot, tracking or not
    pub snapshots: Vec<SessionSnapshot>,
    pub final_snapshot: SessionSnapshot,
    pub distance_label: String,
}

/// Executes fixture scripts against a fresh tracker per run.
pub struct FixtureRunner {
    config: AppConfig,
}

impl FixtureRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, name: &str, script: &FixtureScript) -> Result<FixtureReport> {
        let mut config = self.config.clone();
        // Snapshots are drained after each op; one op publishes at most one.
        config.channels.snapshot_buffer = config.channels.snapshot_buffer.max(4);

        let backend = Arc::new(HostFeedBackend::granted());
        let tracker = TrackerHandle::with_config(config, backend.clone());
        let mut snapshots_rx = tracker.subscribe_snapshots()?;
        let mut snapshots = Vec::new();

        for (index, op) in script.ops.iter().enumerate() {
            match op {
                FixtureOp::Start => {
                    tracker.start_tracking()?;
                }
                FixtureOp::Stop => {
                    tracker.stop_tracking()?;
                }
                FixtureOp::Reset => {
                    tracker.reset_counters()?;
                }
                FixtureOp::Reading { .. } => {
                    if let Some(observation) = op.observation(index) {
                        let delivered = backend.push(observation);
                        log::trace!("[Fixtures] op {} delivered to {} listeners", index, delivered);
                    }
                }
            }
            drain_snapshots(&mut snapshots_rx, &mut snapshots);
        }

        let final_snapshot = tracker.snapshot()?;
        let step_counts = snapshots
            .iter()
            .filter(|snapshot| snapshot.is_tracking)
            .map(|snapshot| snapshot.step_count)
            .collect();

        Ok(FixtureReport {
            fixture: name.to_string(),
            op_count: script.ops.len(),
            step_counts,
            snapshots,
            distance_label: final_snapshot.distance_label(),
            final_snapshot,
        })
    }
}

impl Default for FixtureRunner {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

fn drain_snapshots(
    rx: &mut broadcast::Receiver<SessionSnapshot>,
    out: &mut Vec<SessionSnapshot>,
) {
    loop {
        match rx.try_recv() {
            Ok(snapshot) => out.push(snapshot),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                log::warn!("[Fixtures] Snapshot receiver lagged by {}", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Deterministic walking session: start, `readings` counter values, stop.
///
/// The counter starts at `start_count` and advances by `0..=max_burst` steps
/// between readings. Readings are `f32` like the platform value, so walks that
/// could pass [`MAX_EXACT_COUNTER`] are rejected.
pub fn synthetic_walk(
    seed: u64,
    start_count: u64,
    readings: usize,
    max_burst: u32,
) -> Result<FixtureScript> {
    let worst_case = (readings as u64)
        .saturating_sub(1)
        .saturating_mul(u64::from(max_burst))
        .saturating_add(start_count);
    if worst_case > MAX_EXACT_COUNTER {
        return Err(anyhow!(
            "synthetic walk may reach counter {worst_case}, above the f32-exact limit {MAX_EXACT_COUNTER}"
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut counter = start_count;
    let mut ops = Vec::with_capacity(readings + 2);
    ops.push(FixtureOp::Start);

    for index in 0..readings {
        if index > 0 {
            counter += u64::from(rng.gen_range(0..=max_burst));
        }
        ops.push(FixtureOp::Reading {
            value: counter as f32,
            timestamp_ns: Some(index as u64 * 500_000_000),
            sensor: None,
        });
    }

    ops.push(FixtureOp::Stop);
    Ok(FixtureScript {
        notes: Some(format!("synthetic walk seed={seed}")),
        ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_walk() -> FixtureScript {
        FixtureScript {
            notes: None,
            ops: vec![
                FixtureOp::Start,
                FixtureOp::reading(1000.0),
                FixtureOp::reading(1003.0),
                FixtureOp::reading(1007.0),
                FixtureOp::Stop,
            ],
        }
    }

    #[test]
    fn test_runner_reports_published_counts() {
        let report = FixtureRunner::default().run("basic", &basic_walk()).unwrap();
        assert_eq!(report.step_counts, vec![0, 3, 7]);
        assert_eq!(report.final_snapshot.step_count, 7);
        assert!(!report.final_snapshot.is_tracking);
        assert_eq!(report.distance_label, "5.32");
    }

    #[test]
    fn test_script_json_format() {
        let script: FixtureScript = serde_json::from_str(
            r#"{ "ops": [
                { "op": "start" },
                { "op": "reading", "value": 42.0, "timestamp_ns": 7 },
                { "op": "reading", "value": 1.0, "sensor": 1 },
                { "op": "reset" },
                { "op": "stop" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.ops.len(), 5);

        let observations = script.observations();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].timestamp_ns, 7);
        assert!(observations[0].is_step_counter());
        assert_eq!(observations[1].sensor, SensorKind::Other(1));
    }

    #[test]
    fn test_foreign_readings_do_not_count() {
        let script = FixtureScript {
            notes: None,
            ops: vec![
                FixtureOp::Start,
                FixtureOp::reading(500.0),
                FixtureOp::Reading {
                    value: 900.0,
                    timestamp_ns: None,
                    sensor: Some(1),
                },
                FixtureOp::reading(502.0),
            ],
        };
        let report = FixtureRunner::default().run("foreign", &script).unwrap();
        assert_eq!(report.step_counts, vec![0, 2]);
    }

    #[test]
    fn test_expectation_mismatch_produces_diff() {
        let report = FixtureRunner::default().run("basic", &basic_walk()).unwrap();
        let expectations = FixtureExpectations {
            step_counts: Some(vec![0, 3, 8]),
            final_step_count: Some(7),
            final_distance_meters: Some(5.0),
            ..Default::default()
        };

        let diff = expectations.verify(&report).unwrap_err();
        assert_eq!(diff.failures.len(), 2);
        let json = diff.to_json();
        assert_eq!(json["failures"][0]["field"], "step_counts");
        assert_eq!(json["failures"][1]["field"], "final_distance_meters");
    }

    #[test]
    fn test_expectation_distance_tolerance() {
        let report = FixtureRunner::default().run("basic", &basic_walk()).unwrap();
        let expectations = FixtureExpectations {
            final_distance_meters: Some(5.32),
            ..Default::default()
        };
        assert!(expectations.verify(&report).is_ok());
    }

    #[test]
    fn test_synthetic_walk_is_deterministic() {
        let a = synthetic_walk(7, 1000, 20, 4).unwrap();
        let b = synthetic_walk(7, 1000, 20, 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ops.len(), 22);
        assert_eq!(a.ops.first(), Some(&FixtureOp::Start));
        assert_eq!(a.ops.last(), Some(&FixtureOp::Stop));

        let values: Vec<u64> = a
            .observations()
            .iter()
            .map(|obs| obs.cumulative_steps)
            .collect();
        assert_eq!(values[0], 1000);
        assert!(values.windows(2).all(|w| w[1] >= w[0] && w[1] - w[0] <= 4));
    }

    #[test]
    fn test_synthetic_walk_final_count_matches_counter() {
        let script = synthetic_walk(99, 5000, 50, 6).unwrap();
        let values: Vec<u64> = script
            .observations()
            .iter()
            .map(|obs| obs.cumulative_steps)
            .collect();
        let report = FixtureRunner::default().run("synthetic", &script).unwrap();
        assert_eq!(
            report.final_snapshot.step_count,
            values[values.len() - 1] - values[0]
        );
    }

    #[test]
    fn test_synthetic_walk_rejects_inexact_counters() {
        assert!(synthetic_walk(1, MAX_EXACT_COUNTER + 1, 1, 0).is_err());
        assert!(synthetic_walk(1, MAX_EXACT_COUNTER - 10, 12, 1).is_err());

        let script = synthetic_walk(1, MAX_EXACT_COUNTER - 11, 12, 1).unwrap();
        let values: Vec<u64> = script
            .observations()
            .iter()
            .map(|obs| obs.cumulative_steps)
            .collect();
        assert_eq!(values[0], MAX_EXACT_COUNTER - 11);
        assert!(values.windows(2).all(|w| w[1] - w[0] <= 1));
    }

    #[test]
    fn test_catalog_discovers_repo_fixtures() {
        let fixtures = FixtureCatalog::default().discover().unwrap();
        let basic = fixtures
            .iter()
            .find(|meta| meta.name == "basic_walk")
            .expect("basic_walk fixture");
        assert!(basic.expect_path.is_some());
        assert!(fixtures.iter().all(|meta| !meta.name.ends_with(".expect")));
    }

    #[test]
    fn test_catalog_missing_fixture_errors() {
        let catalog = FixtureCatalog::default();
        assert!(catalog.load("no_such_fixture", None).is_err());
    }
}
