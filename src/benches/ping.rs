//! Localhost ping benchmark: times real external pings under injected
//! latency, so the recorded duration series tracks the latency parameter.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::BenchError;
use crate::measure::Collector;
use crate::net;
use crate::params::{value_list, Binding, ParamDomain};
use crate::runner::{mark_wait, Benchmark, Scenario, MARK_STEP};
use crate::task::BackgroundTask;

pub struct PingBench;

impl Benchmark for PingBench {
    fn name(&self) -> &str {
        "ping"
    }

    fn params(&self) -> ParamDomain {
        let mut domain = ParamDomain::new();
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

        Ok(Box::new(PingScenario {
            collector,
            message,
            duration: Duration::from_millis(duration_ms),
        }))
    }
}

struct PingScenario {
    collector: Collector,
    message: u64,
    duration: Duration,
}

impl Scenario for PingScenario {
    fn run(&mut self, _reps: u64) -> Result<(), BenchError> {
        let producer = self.collector.clone();
        let message = self.message;

        let task = BackgroundTask::spawn("ping-producer", move |token| {
            let mut index = 0u64;
            while !token.is_cancelled() {
                producer.mark_rate(message + index);
                let timer = producer.start_timer();
                if let Err(e) = net::ping("localhost") {
                    warn!("ping failed: {e}");
                }
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
