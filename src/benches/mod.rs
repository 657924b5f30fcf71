//! Built-in benchmarks exercising the engine end to end.

pub mod demo;
pub mod ping;
