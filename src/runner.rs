//! Two-phase scenario lifecycle execution.
//!
//! For each binding of the parameter space: construct the bound scenario
//! (setup), call its timed entry point, then tear it down. The full cycle
//! runs the binding list twice: a warm-up pass whose results are discarded,
//! then the reporting pass that feeds the final [`Report`]. Scenarios execute
//! strictly sequentially; timing validity assumes exclusive use of the host
//! during each measurement window.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::BenchError;
use crate::measure::Collector;
use crate::params::{Binding, ParamDomain};
use crate::report::{Report, Run};

/// Default governing-wait cadence between marks.
pub const MARK_STEP: Duration = Duration::from_secs(3);

/// Repetitions passed to the timed entry point; built-in benchmarks derive
/// their workload from the `duration` parameter instead.
const REPS: u64 = 1;

/// A benchmark description: declared parameter domains plus a per-binding
/// construction step. Constructing the scenario performs setup.
pub trait Benchmark {
    fn name(&self) -> &str;

    fn params(&self) -> ParamDomain;

    /// Build a runnable bound to `binding`, performing the setup hook. The
    /// collector is the scenario's only measurement sink; implementations
    /// keep a clone for any producer task they spawn.
    fn bind(&self, binding: &Binding, collector: Collector)
        -> Result<Box<dyn Scenario>, BenchError>;
}

/// One bound, set-up scenario instance.
pub trait Scenario {
    /// The timed operation. `reps` is advisory.
    fn run(&mut self, reps: u64) -> Result<(), BenchError>;

    /// Release scenario resources. Always invoked exactly once per scenario,
    /// whether or not the timed operation succeeded.
    fn teardown(&mut self) -> Result<(), BenchError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Warmup,
    Report,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Warmup => "warm-up",
            Phase::Report => "report",
        }
    }
}

/// Execute the full two-phase cycle and assemble the publishable report.
///
/// Warm-up results are discarded entirely; the pass exists to stabilize
/// cache and code-path effects before anything is recorded.
pub fn execute(bench: &dyn Benchmark) -> Result<Report, BenchError> {
    let bindings = bench.params().enumerate()?;

    run_phase(Phase::Warmup, bench, &bindings)?;
    let run = run_phase(Phase::Report, bench, &bindings)?;

    Ok(Report::assemble(run))
}

/// One phase pass over the ordered binding list.
///
/// Setup and execution failures abort the phase and propagate; no partial
/// results, no cross-scenario retry. Teardown always runs once per started
/// scenario; its own failure is logged and swallowed so it cannot mask a
/// primary failure.
fn run_phase(phase: Phase, bench: &dyn Benchmark, bindings: &[Binding]) -> Result<Run, BenchError> {
    let mut run = Run::new(bench.name());

    for (index, binding) in bindings.iter().enumerate() {
        let done = 100 * index / bindings.len();
        info!(phase = phase.as_str(), "{done}% {binding}");

        // fresh single-use collector per scenario per phase
        let collector = Collector::new();

        let mut scenario = bench.bind(binding, collector.clone())?;

        let primary = scenario.run(REPS);

        if let Err(teardown_err) = scenario.teardown() {
            warn!(phase = phase.as_str(), %binding, "teardown failed: {teardown_err}");
        }

        let series = collector.finish();

        primary?;

        run.append(binding.clone(), series);
    }

    Ok(run)
}

/// Governing wait: block the calling thread for `total`, marking the
/// collector every `step` until the target duration has elapsed. Returns
/// within roughly one step after `total` passes.
pub fn mark_wait(collector: &Collector, total: Duration, step: Duration) {
    let started = Instant::now();
    loop {
        std::thread::sleep(step);
        collector.mark();
        if started.elapsed() >= total {
            return;
        }
    }
}
