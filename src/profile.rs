//! Opt-in execution profiler. Disabled by default; enabled by setting the
//! `SCALARBAND_PROFILE` environment variable before the first profiled call.
//! Mirrors the reference engine's query profiler: atomic nanosecond/count
//! counters behind a `OnceLock`, snapshot-and-optionally-reset readout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// A point-in-time readout of the accumulated counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSnapshot {
    /// Total time spent resolving leaf rows via a prebuilt scalar index.
    pub index_lookup_ns: u64,
    /// Number of index lookups performed.
    pub index_lookup_count: u64,
    /// Total time spent resolving leaf rows via a direct chunk scan.
    pub scan_ns: u64,
    /// Number of chunk scans performed.
    pub scan_count: u64,
    /// Total time spent applying a chunkwise boolean combinator.
    pub bool_combine_ns: u64,
    /// Number of boolean-combinator applications performed.
    pub bool_combine_count: u64,
}

#[derive(Default)]
struct Counters {
    index_lookup_ns: AtomicU64,
    index_lookup_count: AtomicU64,
    scan_ns: AtomicU64,
    scan_count: AtomicU64,
    bool_combine_ns: AtomicU64,
    bool_combine_count: AtomicU64,
}

static PROFILE_ENABLED: OnceLock<bool> = OnceLock::new();
static COUNTERS: OnceLock<Counters> = OnceLock::new();

fn profiling_enabled() -> bool {
    *PROFILE_ENABLED.get_or_init(|| std::env::var_os("SCALARBAND_PROFILE").is_some())
}

fn counters() -> Option<&'static Counters> {
    profiling_enabled().then(|| COUNTERS.get_or_init(Counters::default))
}

/// The phase a timed span belongs to.
#[derive(Debug, Clone, Copy)]
pub enum Phase {
    /// A prebuilt scalar index was consulted.
    IndexLookup,
    /// Rows were read and compared directly from a chunk.
    Scan,
    /// A chunkwise boolean combinator (`and`/`or`/`xor`/`and_not`) ran.
    BoolCombine,
}

/// Starts a timer for `phase`, or returns `None` when profiling is disabled
/// (so callers pay no cost beyond one atomic load).
pub fn start(_phase: Phase) -> Option<Instant> {
    profiling_enabled().then(Instant::now)
}

/// Records the elapsed time since `start` against `phase`. A no-op if
/// `start` is `None` or profiling has since been found disabled.
pub fn record(phase: Phase, start: Option<Instant>) {
    let Some(start) = start else { return };
    let Some(counters) = counters() else { return };
    let nanos = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
    let (ns, count) = match phase {
        Phase::IndexLookup => (&counters.index_lookup_ns, &counters.index_lookup_count),
        Phase::Scan => (&counters.scan_ns, &counters.scan_count),
        Phase::BoolCombine => (&counters.bool_combine_ns, &counters.bool_combine_count),
    };
    ns.fetch_add(nanos, Ordering::Relaxed);
    count.fetch_add(1, Ordering::Relaxed);
}

/// Reads the accumulated counters, zeroing them when `reset` is true.
/// Returns `None` if profiling was never enabled (`SCALARBAND_PROFILE`
/// unset), so callers can distinguish "disabled" from "zero so far".
pub fn snapshot(reset: bool) -> Option<ProfileSnapshot> {
    let counters = counters()?;
    let load = |counter: &AtomicU64| {
        if reset {
            counter.swap(0, Ordering::Relaxed)
        } else {
            counter.load(Ordering::Relaxed)
        }
    };
    Some(ProfileSnapshot {
        index_lookup_ns: load(&counters.index_lookup_ns),
        index_lookup_count: load(&counters.index_lookup_count),
        scan_ns: load(&counters.scan_ns),
        scan_count: load(&counters.scan_count),
        bool_combine_ns: load(&counters.bool_combine_ns),
        bool_combine_count: load(&counters.bool_combine_count),
    })
}
