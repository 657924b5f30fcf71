//! Per-scenario measurement aggregation.
//!
//! A [`Collector`] owns three write-side instruments (trailing-window rate
//! meter, mean-duration stat, scalar size gauge) and one read-side operation,
//! [`Collector::mark`], which snapshots all three into timestamped sample
//! series. Writers may be on a background producer thread while a single
//! governing thread marks on a fixed cadence; no other concurrent readers.
//!
//! A collector is single-use: created fresh per scenario per phase, drained
//! once via [`Collector::finish`], never reused.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trailing window for the rate meter.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Floor substituted for non-positive readings so downstream renderers that
/// treat zero as "undefined" do not misbehave.
pub const SENTINEL: f64 = 1.0;

/// One timestamped scalar reading of one metric kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock capture time, nanoseconds since the Unix epoch.
    pub at_ns: u64,
    pub value: f64,
}

/// The three parallel sample series produced by one scenario execution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScenarioSeries {
    pub rate: Vec<Sample>,
    pub time: Vec<Sample>,
    pub size: Vec<Sample>,
}

fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now_epoch_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Event rate over a trailing window: events inside the window divided by
/// window-bounded elapsed time.
struct RateMeter {
    started: Instant,
    window: Duration,
    events: Mutex<VecDeque<(Instant, u64)>>,
}

impl RateMeter {
    fn new(window: Duration) -> Self {
        Self {
            started: Instant::now(),
            window,
            events: Mutex::new(VecDeque::new()),
        }
    }

    fn mark(&self, count: u64) {
        lock_recover(&self.events).push_back((Instant::now(), count));
    }

    fn per_second(&self) -> f64 {
        let now = Instant::now();
        let mut events = lock_recover(&self.events);
        while let Some(&(at, _)) = events.front() {
            if now.duration_since(at) > self.window {
                events.pop_front();
            } else {
                break;
            }
        }
        let total: u64 = events.iter().map(|&(_, count)| count).sum();
        if total == 0 {
            return 0.0;
        }
        let elapsed = now
            .duration_since(self.started)
            .min(self.window)
            .as_secs_f64()
            .max(1e-3);
        total as f64 / elapsed
    }
}

/// Mean elapsed nanoseconds across discrete timed sub-operations.
struct DurationStat {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl DurationStat {
    fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, elapsed: Duration) {
        self.total_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn mean_ns(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.total_ns.load(Ordering::Relaxed) as f64 / count as f64
    }
}

/// Last-written scalar value, stored as f64 bits for lock-free updates.
struct SizeGauge {
    bits: AtomicU64,
}

impl SizeGauge {
    fn new() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

struct Inner {
    rate: RateMeter,
    time: DurationStat,
    size: SizeGauge,
    drop_blank: bool,
    closed: AtomicBool,
    series: Mutex<Option<ScenarioSeries>>,
}

/// Single-use per-scenario aggregator. Cheap to clone; clones share the same
/// instruments, so a background producer can feed them while the governing
/// thread marks.
#[derive(Clone)]
pub struct Collector {
    inner: Arc<Inner>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self::with_blank_filter(true)
    }

    /// `drop_blank` controls the all-sentinel blank-drop heuristic. It is a
    /// lossy policy: once filtered, tiny-but-real readings at or below zero
    /// are indistinguishable from true idleness. Kept toggleable for callers
    /// that would rather record the blanks.
    pub fn with_blank_filter(drop_blank: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                rate: RateMeter::new(RATE_WINDOW),
                time: DurationStat::new(),
                size: SizeGauge::new(),
                drop_blank,
                closed: AtomicBool::new(false),
                series: Mutex::new(Some(ScenarioSeries::default())),
            }),
        }
    }

    fn closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Count `events` throughput events on the rate meter.
    pub fn mark_rate(&self, events: u64) {
        if !self.closed() {
            self.inner.rate.mark(events);
        }
    }

    /// Time one sub-operation; the returned guard records its elapsed time
    /// when stopped or dropped.
    pub fn start_timer(&self) -> TimerGuard {
        TimerGuard {
            collector: self.clone(),
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Record one already-measured sub-operation duration.
    pub fn observe_time(&self, elapsed: Duration) {
        if !self.closed() {
            self.inner.time.observe(elapsed);
        }
    }

    /// Update the size gauge.
    pub fn set_size(&self, value: f64) {
        if !self.closed() {
            self.inner.size.set(value);
        }
    }

    /// Snapshot all three instruments into the sample series.
    ///
    /// Readings at or below zero are floored to [`SENTINEL`]; a mark where
    /// all three filtered values equal the sentinel is treated as blank and
    /// appends nothing (unless the blank filter is disabled). Otherwise one
    /// sample lands in each of the three series.
    pub fn mark(&self) {
        if self.closed() {
            debug!("mark after finish ignored");
            return;
        }

        let rate = floor_filter(self.inner.rate.per_second());
        let time = floor_filter(self.inner.time.mean_ns());
        let size = floor_filter(self.inner.size.value());

        if self.inner.drop_blank && rate == SENTINEL && time == SENTINEL && size == SENTINEL {
            return;
        }

        let at_ns = now_epoch_ns();
        let mut series = lock_recover(&self.inner.series);
        if let Some(series) = series.as_mut() {
            series.rate.push(Sample { at_ns, value: rate });
            series.time.push(Sample { at_ns, value: time });
            series.size.push(Sample { at_ns, value: size });
        }
    }

    /// Stop the instruments and take the collected series. Single-use: a
    /// second call yields empty series, and all later writes and marks are
    /// ignored.
    pub fn finish(&self) -> ScenarioSeries {
        self.inner.closed.store(true, Ordering::Release);
        let taken = lock_recover(&self.inner.series).take();
        match taken {
            Some(series) => series,
            None => {
                debug!("collector finished twice");
                ScenarioSeries::default()
            }
        }
    }
}

fn floor_filter(value: f64) -> f64 {
    if value <= 0.0 {
        SENTINEL
    } else {
        value
    }
}

/// Records elapsed time into the owning collector on stop or drop.
pub struct TimerGuard {
    collector: Collector,
    started: Instant,
    recorded: bool,
}

impl TimerGuard {
    pub fn stop(mut self) {
        self.record();
    }

    fn record(&mut self) {
        if !self.recorded {
            self.recorded = true;
            self.collector.observe_time(self.started.elapsed());
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.record();
    }
}
