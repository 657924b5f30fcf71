//! Report publication.
//!
//! A [`Publisher`] delivers one assembled [`Report`] to its destination. The
//! transport is selected by configuration; every transport serializes the
//! same report object, nothing is re-derived per destination.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::BenchError;
use crate::report::Report;

/// Versioned publication seam: one `submit` operation per transport. The
/// document layout is governed by [`crate::report::SCHEMA_VERSION`].
pub trait Publisher {
    fn submit(&self, report: &Report) -> Result<(), BenchError>;
}

/// Transport selection, typically from CLI flags.
#[derive(Clone, Debug)]
pub enum Transport {
    Console,
    File(PathBuf),
    Http(String),
}

impl Transport {
    pub fn publisher(self) -> Box<dyn Publisher> {
        match self {
            Transport::Console => Box::new(ConsolePublisher),
            Transport::File(path) => Box::new(FilePublisher { path }),
            Transport::Http(endpoint) => Box::new(HttpPublisher::new(endpoint)),
        }
    }
}

/// Pretty JSON to stdout.
pub struct ConsolePublisher;

impl Publisher for ConsolePublisher {
    fn submit(&self, report: &Report) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(report)?;
        println!("{json}");
        Ok(())
    }
}

/// Pretty JSON to a file.
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Publisher for FilePublisher {
    fn submit(&self, report: &Report) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}

/// POST to a collection endpoint.
pub struct HttpPublisher {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpPublisher {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Publisher for HttpPublisher {
    fn submit(&self, report: &Report) -> Result<(), BenchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .map_err(|e| BenchError::Publish(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BenchError::Publish(format!(
                "endpoint {} answered {status}",
                self.endpoint
            )));
        }
        info!(endpoint = %self.endpoint, "report submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::ScenarioSeries;
    use crate::params::Binding;
    use crate::report::Run;

    fn sample_report() -> Report {
        let mut run = Run::new("demo");
        run.append(Binding::default(), ScenarioSeries::default());
        Report::assemble(run)
    }

    #[test]
    fn file_publisher_writes_parseable_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        FilePublisher::new(path.clone())
            .submit(&sample_report())
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let restored: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.run.benchmark, "demo");
        assert_eq!(restored.run.scenarios.len(), 1);
    }

    #[test]
    fn console_publisher_serializes() {
        ConsolePublisher.submit(&sample_report()).unwrap();
    }

    #[test]
    fn http_publisher_reports_transport_failure() {
        // nothing listens here; submit must fail loudly, not hang
        let publisher = HttpPublisher::new("http://127.0.0.1:9/submit".to_string());
        let err = publisher.submit(&sample_report()).unwrap_err();
        assert!(matches!(err, BenchError::Publish(_)));
    }
}
