//! Minimal metrics registry for the server.
//!
//! Counters and histograms with dynamic labels backed by `DashMap`. Labels are
//! flattened into sorted key vectors to keep deterministic ordering. Values are
//! plain atomics, so rendering concurrently with updates can observe slightly
//! stale values but never loses an increment or invents one. Histogram buckets
//! are fixed in microseconds to avoid floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `name` or `name{labels}`.
fn series(name: &str, labels: &str) -> String {
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{labels}}}")
    }
}

pub struct CounterVec {
    help: &'static str,
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Labelled family; series appear on first increment.
    pub fn new(help: &'static str) -> Self {
        Self {
            help,
            map: DashMap::new(),
        }
    }

    /// Label-less counter, rendered as `name 0` before its first increment.
    pub fn single(help: &'static str) -> Self {
        let this = Self::new(help);
        this.map.insert(Vec::new(), AtomicU64::new(0));
        this
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 if never incremented).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, self.help);
        let _ = writeln!(out, "# TYPE {} counter", name);

        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (label_str(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (labels, val) in rows {
            let _ = writeln!(out, "{} {}", series(name, &labels), val);
        }
    }
}

// Fixed Buckets in Microseconds (µs)
// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [
    100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

pub struct HistogramVec {
    help: &'static str,
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    pub fn new(help: &'static str) -> Self {
        Self {
            help,
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for one series.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, self.help);
        let _ = writeln!(out, "# TYPE {} histogram", name);

        let mut keys: Vec<Vec<(String, String)>> = self.map.iter().map(|r| r.key().clone()).collect();
        keys.sort();

        for key in keys {
            let Some(hist) = self.map.get(&key) else {
                continue;
            };
            let labels = label_str(&key);
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{labels},")
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), &labels), sum);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_count"), &labels), count);
        }
    }
}

pub const REQUESTS_TOTAL: &str = "app_requests_total";
pub const ROUTE_REQUESTS_TOTAL: &str = "app_route_requests_total";
pub const STORE_ERRORS_TOTAL: &str = "app_store_errors_total";
pub const STORE_QUERY_DURATION: &str = "app_store_query_duration_micros";

pub struct ServiceMetrics {
    /// Every request except scrapes of `/metrics`.
    pub requests: CounterVec,
    pub route_requests: CounterVec,
    pub store_errors: CounterVec,
    pub store_duration: HistogramVec, // In Microseconds
    draining: AtomicBool,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self {
            requests: CounterVec::single("Total requests"),
            route_requests: CounterVec::new("Requests by route"),
            store_errors: CounterVec::new("Store failures by operation"),
            store_duration: HistogramVec::new("Store round-trip latency in microseconds"),
            draining: AtomicBool::new(false),
        }
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the label-less counter registered under `name`.
    /// Returns `false` for unknown or labelled families.
    pub fn increment(&self, name: &str) -> bool {
        match name {
            REQUESTS_TOTAL => {
                self.requests.inc(&[]);
                true
            }
            _ => false,
        }
    }

    /// Count one served request for `route`.
    pub fn record_request(&self, route: &str) {
        self.requests.inc(&[]);
        self.route_requests.inc(&[("route", route)]);
    }

    pub fn record_store(&self, op: &str, elapsed: Duration, ok: bool) {
        self.store_duration.observe(&[("op", op)], elapsed);
        if !ok {
            self.store_errors.inc(&[("op", op)]);
        }
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }
    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render(REQUESTS_TOTAL, &mut out);
        self.route_requests.render(ROUTE_REQUESTS_TOTAL, &mut out);
        self.store_errors.render(STORE_ERRORS_TOTAL, &mut out);
        self.store_duration.render(STORE_QUERY_DURATION, &mut out);

        let _ = writeln!(
            out,
            "# HELP app_draining 1 once shutdown has begun\n# TYPE app_draining gauge\napp_draining {}",
            u8::from(self.is_draining())
        );
        out
    }
}
