//! External collaborators used by benchmarks under test: localhost latency
//! injection through `tc`, a timed ping probe, and a free local socket
//! address allocator. The engine itself never calls these; benchmark setup
//! and teardown do.

use std::net::{SocketAddr, TcpListener};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::BenchError;

/// Round-trip delay probe length used by [`is_available`].
const PROBE_DELAY_MS: u64 = 100;

/// Probe tolerance for scheduler and ping jitter.
const PROBE_MARGIN_MS: u64 = 20;

/// Packet buffer limit handed to netem so added latency does not turn into
/// packet loss.
const NETEM_LIMIT: u64 = 1024 * 1024;

/// Introduce a round-trip delay on the loopback device. Idempotent; zero
/// clears any active delay. Requires passwordless sudo for `/sbin/tc`.
pub fn delay(millis: u64) -> Result<(), BenchError> {
    // netem delay is one-way, so halve the requested round trip
    let one_way = millis / 2;
    run_process(&["sudo", "tc", "qdisc", "del", "dev", "lo", "root"])?;
    if one_way > 0 {
        run_process(&[
            "sudo",
            "tc",
            "qdisc",
            "add",
            "dev",
            "lo",
            "root",
            "netem",
            "delay",
            &format!("{one_way}ms"),
            "limit",
            &NETEM_LIMIT.to_string(),
        ])?;
    }
    Ok(())
}

/// Verify that latency injection actually works on this host: compare ping
/// times with and without an injected delay. Any failure means "not
/// available", never an error.
pub fn is_available() -> bool {
    let probe = || -> Result<bool, BenchError> {
        delay(0)?;
        let base = ping("localhost")?.as_millis() as u64;
        delay(PROBE_DELAY_MS)?;
        let delayed = ping("localhost")?.as_millis() as u64;
        delay(0)?;
        let restored = ping("localhost")?.as_millis() as u64;
        Ok(delayed + PROBE_MARGIN_MS >= base + PROBE_DELAY_MS
            && delayed + PROBE_MARGIN_MS >= restored + PROBE_DELAY_MS)
    };
    match probe() {
        Ok(available) => available,
        Err(e) => {
            debug!("traffic control unavailable: {e}");
            false
        }
    }
}

/// Measure wall time of one external ping to `host`.
pub fn ping(host: &str) -> Result<Duration, BenchError> {
    let count_flag = if cfg!(windows) { "-n" } else { "-c" };
    let started = Instant::now();
    run_process(&["ping", count_flag, "1", host])?;
    Ok(started.elapsed())
}

/// Invoke an external process and wait for completion. Exit status is
/// deliberately ignored (`tc del` fails when no qdisc is installed); only a
/// spawn failure is an error.
fn run_process(argv: &[&str]) -> Result<(), BenchError> {
    let status = Command::new(argv[0]).args(&argv[1..]).status()?;
    if !status.success() {
        debug!(command = %argv.join(" "), %status, "process exited non-zero");
    }
    Ok(())
}

/// Allocate an unused local address/port, retrying for a bounded number of
/// attempts before giving up.
pub fn local_socket_addr() -> Result<SocketAddr, BenchError> {
    const ATTEMPTS: usize = 10;
    for attempt in 0..ATTEMPTS {
        match TcpListener::bind(("127.0.0.1", 0)).and_then(|listener| listener.local_addr()) {
            Ok(addr) => return Ok(addr),
            Err(e) => {
                debug!(attempt, "address allocation failed: {e}");
                thread::sleep(Duration::from_millis(500));
            }
        }
    }
    Err(BenchError::Setup(
        "failed to allocate a local socket address".to_string(),
    ))
}
