//! Synthetic demonstration benchmark: a background producer feeds the three
//! instruments while the governing thread marks on the default cadence,
//! optionally under injected loopback latency.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::error::BenchError;
use crate::measure::Collector;
use crate::net;
use crate::params::{value_list, Binding, ParamDomain};
use crate::runner::{mark_wait, Benchmark, Scenario, MARK_STEP};
use crate::task::BackgroundTask;

/// Pause between producer iterations.
const PRODUCER_STEP: Duration = Duration::from_secs(1);

pub struct DemoBench;

impl Benchmark for DemoBench {
    fn name(&self) -> &str {
        "demo"
    }

    fn params(&self) -> ParamDomain {
        let mut domain = ParamDomain::new();
        // inject latency only where the host can actually do it
        let latency = if net::is_available() { "0,10" } else { "0" };
        domain
            .insert("latency", value_list(latency))
            .insert("message", value_list("500,1500"))
            .insert("duration", value_list("6000"));
        domain
    }

    fn bind(
        &self,
        binding: &Binding,
        collector: Collector,
    ) -> Result<Box<dyn Scenario>, BenchError> {
        info!("init {binding}");
        let latency: u64 = binding.get_parsed("latency")?;
        let message: u64 = binding.get_parsed("message")?;
        let duration_ms: u64 = binding.get_parsed("duration")?;

        if latency > 0 {
            net::delay(latency).map_err(|e| BenchError::Setup(e.to_string()))?;
        }

        Ok(Box::new(DemoScenario {
            collector,
            message,
            duration: Duration::from_millis(duration_ms),
        }))
    }
}

struct DemoScenario {
    collector: Collector,
    message: u64,
    duration: Duration,
}

impl Scenario for DemoScenario {
    fn run(&mut self, _reps: u64) -> Result<(), BenchError> {
        let producer = self.collector.clone();
        let message = self.message;

        let task = BackgroundTask::spawn("demo-producer", move |token| {
            let mut index = 0u64;
            while !token.is_cancelled() {
                producer.mark_rate(message + index);
                let timer = producer.start_timer();
                thread::sleep(PRODUCER_STEP);
                timer.stop();
                producer.set_size((message + index) as f64);
                index += 1;
            }
        })
        .map_err(|e| BenchError::Execution(format!("cannot spawn producer: {e}")))?;

        mark_wait(&self.collector, self.duration, MARK_STEP);
        task.stop();
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), BenchError> {
        net::delay(0).map_err(|e| BenchError::Teardown(e.to_string()))?;
        info!("done");
        Ok(())
    }
}
