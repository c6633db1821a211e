//! Prometheus-compatible metrics exporter for supply-dash
//!
//! Endpoint: GET /metrics (on the web UI port, default 8000)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::dashboard::Dashboard;

/// Counters updated from request handling
pub struct MetricsCounters {
    /// Import attempts (upload or startup file)
    pub imports_total: AtomicU64,
    /// Imports rejected for malformed data or IO errors
    pub import_failures_total: AtomicU64,
    /// Rows accepted across all imports
    pub rows_imported_total: AtomicU64,
    /// New orders created across all imports
    pub orders_created_total: AtomicU64,
    /// Scoreboard requests served
    pub scoreboard_requests: AtomicU64,
    /// Scoreboard requests that failed on inconsistent store data
    pub scoreboard_failures: AtomicU64,
    /// Server start time
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            imports_total: AtomicU64::new(0),
            import_failures_total: AtomicU64::new(0),
            rows_imported_total: AtomicU64::new(0),
            orders_created_total: AtomicU64::new(0),
            scoreboard_requests: AtomicU64::new(0),
            scoreboard_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_import(&self, rows: usize, orders_created: usize) {
        self.imports_total.fetch_add(1, Ordering::Relaxed);
        self.rows_imported_total.fetch_add(rows as u64, Ordering::Relaxed);
        self.orders_created_total.fetch_add(orders_created as u64, Ordering::Relaxed);
    }

    pub fn record_import_failure(&self) {
        self.imports_total.fetch_add(1, Ordering::Relaxed);
        self.import_failures_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MetricsCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(dashboard: &Dashboard) -> String {
    let mut out = String::with_capacity(2048);
    let c = &dashboard.metrics;

    // ──────────────────────────────────────────────
    // Server info
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "supply_dash_up", "Whether the dashboard is up.", "gauge");
    writeln!(out, "supply_dash_up 1").ok();

    write_help_type(&mut out, "supply_dash_uptime_seconds_total", "Uptime since server boot in seconds.", "counter");
    writeln!(out, "supply_dash_uptime_seconds_total {:.3}", c.start_time.elapsed().as_secs_f64()).ok();

    // ──────────────────────────────────────────────
    // Store size
    // ──────────────────────────────────────────────
    let counts = dashboard.store.counts();
    write_help_type(&mut out, "supply_dash_records", "Number of stored records by table.", "gauge");
    writeln!(out, "supply_dash_records{{table=\"supplier\"}} {}", counts.suppliers).ok();
    writeln!(out, "supply_dash_records{{table=\"product\"}} {}", counts.products).ok();
    writeln!(out, "supply_dash_records{{table=\"order\"}} {}", counts.orders).ok();

    write_help_type(&mut out, "supply_dash_snapshot_version", "Current store snapshot version.", "gauge");
    writeln!(out, "supply_dash_snapshot_version {}", dashboard.store.version()).ok();

    // ──────────────────────────────────────────────
    // Imports
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "supply_dash_imports_total", "Total number of CSV imports attempted.", "counter");
    writeln!(out, "supply_dash_imports_total {}", c.imports_total.load(Ordering::Relaxed)).ok();
    write_help_type(&mut out, "supply_dash_import_failures_total", "Total number of rejected CSV imports.", "counter");
    writeln!(out, "supply_dash_import_failures_total {}", c.import_failures_total.load(Ordering::Relaxed)).ok();
    write_help_type(&mut out, "supply_dash_rows_imported_total", "Total number of CSV rows accepted.", "counter");
    writeln!(out, "supply_dash_rows_imported_total {}", c.rows_imported_total.load(Ordering::Relaxed)).ok();
    write_help_type(&mut out, "supply_dash_orders_created_total", "Total number of orders created by imports.", "counter");
    writeln!(out, "supply_dash_orders_created_total {}", c.orders_created_total.load(Ordering::Relaxed)).ok();

    // ──────────────────────────────────────────────
    // Scoreboard
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "supply_dash_scoreboard_requests_total", "Total number of supplier scoreboard requests.", "counter");
    writeln!(out, "supply_dash_scoreboard_requests_total {}", c.scoreboard_requests.load(Ordering::Relaxed)).ok();
    write_help_type(&mut out, "supply_dash_scoreboard_failures_total", "Total number of failed scoreboard computations.", "counter");
    writeln!(out, "supply_dash_scoreboard_failures_total {}", c.scoreboard_failures.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "supply_dash_cache_hits_total", "Snapshot cache hits by cache.", "counter");
    write_help_type(&mut out, "supply_dash_cache_misses_total", "Snapshot cache misses by cache.", "counter");
    for (name, hits, misses) in dashboard.cache_counters() {
        writeln!(out, "supply_dash_cache_hits_total{{cache=\"{}\"}} {}", name, hits).ok();
        writeln!(out, "supply_dash_cache_misses_total{{cache=\"{}\"}} {}", name, misses).ok();
    }

    out
}

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}
