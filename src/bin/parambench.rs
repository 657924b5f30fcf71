use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use parambench::benches::{demo::DemoBench, ping::PingBench};
use parambench::publish::Transport;
use parambench::runner::{self, Benchmark};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BenchArg {
    /// Synthetic producer feeding the instruments on a fixed cadence.
    Demo,
    /// Times real localhost pings under injected latency.
    Ping,
}

#[derive(Parser, Debug)]
#[command(name = "parambench")]
#[command(about = "Parametrized micro-benchmark runner (JSON output)")]
struct Args {
    /// Benchmark to execute.
    #[arg(long, value_enum, default_value_t = BenchArg::Demo)]
    bench: BenchArg,

    /// Also write the JSON report to this file.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Also POST the JSON report to this collection endpoint.
    #[arg(long, value_name = "URL")]
    publish: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let bench: Box<dyn Benchmark> = match args.bench {
        BenchArg::Demo => Box::new(DemoBench),
        BenchArg::Ping => Box::new(PingBench),
    };

    let report = runner::execute(bench.as_ref()).context("benchmark run failed")?;

    // one report object backs every transport
    Transport::Console.publisher().submit(&report)?;
    if let Some(path) = args.out {
        Transport::File(path).publisher().submit(&report)?;
    }
    if let Some(url) = args.publish {
        Transport::Http(url).publisher().submit(&report)?;
    }

    Ok(())
}
