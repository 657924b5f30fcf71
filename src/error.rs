use thiserror::Error;

/// Failure taxonomy for a benchmark run.
///
/// Setup and execution failures are fail-fast: they abort the current phase
/// and propagate to the caller. Teardown failures are caught by the runner,
/// logged, and never rethrown so they cannot mask a primary failure.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid parameter domain or unusable binding value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Benchmark setup hook failed; the scenario never started.
    #[error("scenario setup failed: {0}")]
    Setup(String),

    /// The timed operation failed mid-scenario.
    #[error("scenario execution failed: {0}")]
    Execution(String),

    /// Teardown hook failed. Recoverable: logged by the runner, not rethrown.
    #[error("scenario teardown failed: {0}")]
    Teardown(String),

    /// Report could not be delivered to its transport.
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
