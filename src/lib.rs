//! Parametrized micro-benchmark engine.
//!
//! A benchmark declares named parameter domains; the engine expands the full
//! Cartesian product, drives every binding through a setup / timed-operation
//! / teardown lifecycle in two phases (warm-up, then report), aggregates
//! rate/time/size sample series per scenario, and assembles one publishable
//! JSON report.

pub mod benches;
pub mod error;
pub mod measure;
pub mod net;
pub mod params;
pub mod publish;
pub mod report;
pub mod runner;
pub mod task;

pub use error::BenchError;
pub use measure::Collector;
pub use params::{Binding, ParamDomain};
pub use report::Report;
pub use runner::{execute, Benchmark, Scenario};
