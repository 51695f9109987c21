use crate::model::{CheckOutcome, Status};
use crate::report::{write_file, ReportError};
use crate::summary::Summary;
use prometheus::core::Collector;
use prometheus::{opts, Encoder, Gauge, GaugeVec, Registry, TextEncoder};
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Gauges describing one finished run, for a node-exporter textfile collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub infracheck_outcomes: GaugeVec,
    pub infracheck_checks_total: Gauge,
    pub infracheck_checks: GaugeVec,
    pub infracheck_last_run_timestamp_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let infracheck_outcomes = GaugeVec::new(
            opts!(
                "infracheck_outcomes",
                "Check outcomes of the last run by environment, category and status"
            ),
            &["environment", "category", "status"],
        )?;
        let infracheck_checks_total = Gauge::with_opts(opts!(
            "infracheck_checks_total",
            "Number of checks evaluated in the last run"
        ))?;
        let infracheck_checks = GaugeVec::new(
            opts!("infracheck_checks", "Checks of the last run by status"),
            &["status"],
        )?;
        let infracheck_last_run_timestamp_seconds = Gauge::with_opts(opts!(
            "infracheck_last_run_timestamp_seconds",
            "Unix time the last run finished"
        ))?;

        register(&registry, &infracheck_outcomes)?;
        register(&registry, &infracheck_checks_total)?;
        register(&registry, &infracheck_checks)?;
        register(&registry, &infracheck_last_run_timestamp_seconds)?;

        Ok(Self {
            registry,
            infracheck_outcomes,
            infracheck_checks_total,
            infracheck_checks,
            infracheck_last_run_timestamp_seconds,
        })
    }

    pub fn update_from_run(&self, outcomes: &[CheckOutcome], summary: &Summary) {
        self.infracheck_checks_total.set(summary.total as f64);

        let counts = summary.counts();
        for status in Status::ALL {
            self.infracheck_checks
                .with_label_values(&[status.as_str()])
                .set(counts.get(status) as f64);
        }

        let mut grouped: HashMap<(&str, &str, Status), usize> = HashMap::new();
        for outcome in outcomes {
            *grouped
                .entry((outcome.environment.as_str(), outcome.category.as_str(), outcome.status))
                .or_insert(0) += 1;
        }
        self.infracheck_outcomes.reset();
        for ((environment, category, status), count) in grouped {
            self.infracheck_outcomes
                .with_label_values(&[environment, category, status.as_str()])
                .set(count as f64);
        }

        self.infracheck_last_run_timestamp_seconds
            .set(now_unix() as f64);
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }

    pub fn write_textfile(&self, path: &Path) -> Result<(), ReportError> {
        let body = self.encode_metrics()?;
        write_file(path, &String::from_utf8_lossy(&body))
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use crate::summary::summarize;

    #[test]
    fn exports_run_gauges() {
        let outcomes = fixtures::outcomes();
        let metrics = Metrics::new().expect("metrics");
        metrics.update_from_run(&outcomes, &summarize(&outcomes));

        let text = String::from_utf8(metrics.encode_metrics().expect("encode")).expect("utf8");
        assert!(text.contains("infracheck_checks_total 4"));
        assert!(text.contains("infracheck_checks{status=\"critical\"} 1"));
        assert!(text.contains(
            "infracheck_outcomes{category=\"Kubernetes\",environment=\"PRD\",status=\"critical\"} 1"
        ));
        assert!(text.contains("infracheck_last_run_timestamp_seconds"));
    }

    #[test]
    fn write_textfile_creates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("infracheck.prom");
        let metrics = Metrics::new().expect("metrics");
        metrics.update_from_run(&[], &summarize(&[]));
        metrics.write_textfile(&path).expect("write");

        let body = std::fs::read_to_string(&path).expect("read");
        assert!(body.contains("infracheck_checks_total 0"));
    }
}
