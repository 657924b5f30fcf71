//! Result assembly and the publishable report schema.
//!
//! One [`Run`] holds the reporting-phase scenario records; [`Report`] wraps
//! it with a one-shot [`Environment`] snapshot and the static display-unit
//! tables. The whole artifact round-trips through serde.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::measure::{Sample, ScenarioSeries};
use crate::params::Binding;

/// Report document layout version.
pub const SCHEMA_VERSION: u32 = 1;

/// One scenario's binding plus its three retained sample series.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub params: Binding,
    pub rate: Vec<Sample>,
    pub time: Vec<Sample>,
    pub size: Vec<Sample>,
}

/// Benchmark name, execution timestamp, and the scenario map of one
/// reporting-phase pass. Scenario order carries no guarantee; reproducibility
/// is established by the parameter-space generator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Run {
    pub benchmark: String,
    pub executed_utc: String,
    pub scenarios: Vec<ScenarioRecord>,
}

impl Run {
    pub fn new(benchmark: &str) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            executed_utc: now_utc_rfc3339(),
            scenarios: Vec::new(),
        }
    }

    /// Map semantics keyed by binding content: re-appending a content-equal
    /// binding replaces the prior record.
    pub fn append(&mut self, params: Binding, series: ScenarioSeries) {
        let record = ScenarioRecord {
            params,
            rate: series.rate,
            time: series.time,
            size: series.size,
        };
        match self
            .scenarios
            .iter_mut()
            .find(|existing| existing.params == record.params)
        {
            Some(existing) => *existing = record,
            None => self.scenarios.push(record),
        }
    }

    pub fn get(&self, params: &Binding) -> Option<&ScenarioRecord> {
        self.scenarios
            .iter()
            .find(|record| &record.params == params)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// One-shot host/platform snapshot, captured once per report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Environment {
    pub os: String,
    pub arch: String,
    pub family: String,
    pub cpu_count: usize,
    pub hostname: Option<String>,
}

impl Environment {
    pub fn snapshot() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            cpu_count: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            hostname: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("COMPUTERNAME"))
                .ok(),
        }
    }
}

/// Display-unit tables: label to magnitude divisor. Presentation-only state
/// owned by the report, serialized once at the artifact top level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitTables {
    pub rate: BTreeMap<String, u64>,
    pub time: BTreeMap<String, u64>,
    pub size: BTreeMap<String, u64>,
}

impl Default for UnitTables {
    fn default() -> Self {
        Self {
            rate: table(&[
                ("Rate B/s", 1),
                ("Rate KB/s", 1024),
                ("Rate MB/s", 1024 * 1024),
                ("Rate GB/s", 1024 * 1024 * 1024),
            ]),
            time: table(&[
                ("Time ns", 1),
                ("Time us", 1_000),
                ("Time ms", 1_000_000),
                ("Time s", 1_000_000_000),
            ]),
            size: table(&[
                ("Size B", 1),
                ("Size KB", 1024),
                ("Size MB", 1024 * 1024),
                ("Size GB", 1024 * 1024 * 1024),
            ]),
        }
    }
}

fn table(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
    entries
        .iter()
        .map(|&(label, magnitude)| (label.to_string(), magnitude))
        .collect()
}

/// Top-level publishable artifact: run + environment. The same object backs
/// the printed document and any submission payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub bench_version: String,
    pub run: Run,
    pub environment: Environment,
    pub units: UnitTables,
}

impl Report {
    /// Assemble the final artifact around a completed reporting-phase run,
    /// taking the environment snapshot here so it happens once per report.
    pub fn assemble(run: Run) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            run,
            environment: Environment::snapshot(),
            units: UnitTables::default(),
        }
    }
}

fn now_utc_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| format!("unix:{}", now.unix_timestamp()))
}
