use std::convert::Infallible;
use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::categories::{category_distribution, CategoryShare};
use crate::analytics::forecast::{forecast_demand, Forecast};
use crate::analytics::geo::{geo_distribution, GeoDistribution};
use crate::config::Config;
use crate::error::Result;
use crate::import::{CsvImporter, ImportReport};
use crate::metrics::MetricsCounters;
use crate::ranking::{build_scoreboard, ScoreBoard};
use crate::reliability::score_all;
use crate::snapshot_cache::SnapshotCache;
use crate::store::{Store, StoreCounts};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub supplier_count: usize,
    pub order_count: usize,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub id: u64,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub supplier: String,
}

/// Core engine - every page and API handler is a call into this
pub struct Dashboard {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub metrics: Arc<MetricsCounters>,
    importer: CsvImporter,
    scores: SnapshotCache<ScoreBoard>,
    forecasts: SnapshotCache<Forecast>,
}

impl Dashboard {
    pub fn new(config: Arc<Config>) -> Self {
        let cache_enabled = config.scoring.cache_enabled;
        Self {
            importer: CsvImporter::new(config.import.encoding),
            scores: SnapshotCache::new("scoreboard", cache_enabled),
            forecasts: SnapshotCache::new("forecast", cache_enabled),
            store: Arc::new(Store::new()),
            metrics: Arc::new(MetricsCounters::new()),
            config,
        }
    }

    /// Import CSV data; the store is untouched if any row is malformed
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<ImportReport> {
        match self.importer.import(reader, &self.store) {
            Ok(report) => {
                self.metrics.record_import(report.rows_read, report.orders_created);
                Ok(report)
            }
            Err(e) => {
                warn!("Import rejected: {}", e);
                self.metrics.record_import_failure();
                Err(e)
            }
        }
    }

    pub fn import_file(&self, path: &str) -> Result<ImportReport> {
        info!("Importing {}", path);
        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) => {
                self.metrics.record_import_failure();
                return Err(e.into());
            }
        };
        self.import_csv(std::io::BufReader::new(file))
    }

    /// Run the startup imports listed in config. Failures are logged, not fatal.
    pub fn import_startup_files(&self) {
        for path in &self.config.import.files {
            if let Err(e) = self.import_file(path) {
                warn!("Startup import of {} failed: {}", path, e);
            }
        }
    }

    pub fn summary(&self) -> DashboardSummary {
        let StoreCounts { suppliers, products, orders } = self.store.counts();
        DashboardSummary {
            product_count: products,
            supplier_count: suppliers,
            order_count: orders,
            version: self.store.version(),
        }
    }

    /// Product list, optionally narrowed to one category
    pub fn products(&self, category: Option<&str>, limit: Option<usize>) -> Vec<ProductRow> {
        let view = self.store.read();
        view.products()
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .take(limit.unwrap_or(usize::MAX))
            .map(|p| ProductRow {
                id: p.id,
                sku: p.sku.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                category: p.category.clone(),
                supplier: view
                    .supplier(p.supplier_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn categories(&self) -> Vec<CategoryShare> {
        category_distribution(self.store.read().products())
    }

    /// Supplier reliability scoreboard for the current snapshot
    pub fn supplier_scores(&self) -> Result<Arc<ScoreBoard>> {
        self.metrics
            .scoreboard_requests
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let view = self.store.read();
        let top_n = self.config.scoring.top_n;
        let result: Result<Arc<ScoreBoard>> = self.scores.get_or_try_insert(view.version(), || {
            let records = score_all(&view)?;
            debug!("Scored {} suppliers at version {}", records.len(), view.version());
            Ok(build_scoreboard(records, top_n))
        });

        if result.is_err() {
            self.metrics
                .scoreboard_failures
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        result
    }

    pub fn forecast(&self) -> Arc<Forecast> {
        let view = self.store.read();
        let cfg = &self.config.forecast;
        self.forecasts
            .get_or_try_insert::<Infallible, _>(view.version(), || {
                Ok(forecast_demand(view.orders(), cfg.horizon_days, cfg.min_history_days))
            })
            .unwrap_or_else(|never| match never {})
    }

    pub fn geo(&self) -> GeoDistribution {
        geo_distribution(self.store.read().orders())
    }

    /// (cache name, hits, misses) for the metrics exporter
    pub fn cache_counters(&self) -> Vec<(&'static str, u64, u64)> {
        vec![
            ("scoreboard", self.scores.hits(), self.scores.misses()),
            ("forecast", self.forecasts.hits(), self.forecasts.misses()),
        ]
    }

    /// Stats for the Web UI header
    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary(),
            "caches": [self.scores.get_stats(), self.forecasts.get_stats()],
            "uptime_secs": self.metrics.start_time.elapsed().as_secs(),
        })
    }
}
