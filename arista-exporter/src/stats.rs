//! Exporter self-metrics.
//!
//! Unlike the per-scrape [`MetricsCollection`](crate::collection::MetricsCollection),
//! this registry lives for the whole process and is served on the metrics
//! path.

use std::fmt::Write;
use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

use crate::collection::MetricsError;
use crate::prober::ModuleKind;

/// How a probe request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    ClientError,
    ConnectionError,
    ExecutionError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ClientError => "client_error",
            Outcome::ConnectionError => "connection_error",
            Outcome::ExecutionError => "execution_error",
        }
    }
}

impl EncodeLabelValue for Outcome {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}

impl EncodeLabelValue for ModuleKind {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct ModuleLabels {
    module: ModuleKind,
}

/// Counters and timings about the exporter's own probe traffic.
#[derive(Debug)]
pub struct ExporterMetrics {
    registry: Registry,
    scrapes: Family<OutcomeLabels, Counter>,
    module_scrapes: Family<ModuleLabels, Counter>,
    duration: Histogram,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("arista_exporter");

        let scrapes = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "scrapes",
            "Probe requests by outcome",
            scrapes.clone(),
        );

        let module_scrapes = Family::<ModuleLabels, Counter>::default();
        registry.register(
            "module_scrapes",
            "Modules successfully scraped",
            module_scrapes.clone(),
        );

        // 5ms .. ~20s
        let duration = Histogram::new(exponential_buckets(0.005, 2.0, 12));
        registry.register(
            "scrape_duration_seconds",
            "Duration of probe requests",
            duration.clone(),
        );

        Self {
            registry,
            scrapes,
            module_scrapes,
            duration,
        }
    }

    /// Record one finished probe request.
    pub fn observe(&self, outcome: Outcome, modules: &[ModuleKind], elapsed: Duration) {
        self.scrapes.get_or_create(&OutcomeLabels { outcome }).inc();
        self.duration.observe(elapsed.as_secs_f64());

        if outcome == Outcome::Success {
            for &module in modules {
                self.module_scrapes
                    .get_or_create(&ModuleLabels { module })
                    .inc();
            }
        }
    }

    /// Number of probe requests recorded with `outcome`.
    pub fn scrapes(&self, outcome: Outcome) -> u64 {
        self.scrapes.get_or_create(&OutcomeLabels { outcome }).get()
    }

    /// Render in the OpenMetrics text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut output = String::new();
        encode(&mut output, &self.registry)?;
        Ok(output)
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::sample_value;

    #[test]
    fn test_counts_by_outcome() {
        let stats = ExporterMetrics::new();
        stats.observe(Outcome::Success, &[ModuleKind::Power], Duration::from_millis(3));
        stats.observe(Outcome::Success, &[ModuleKind::Power], Duration::from_millis(3));
        stats.observe(Outcome::ClientError, &[], Duration::ZERO);

        assert_eq!(stats.scrapes(Outcome::Success), 2);
        assert_eq!(stats.scrapes(Outcome::ClientError), 1);
        assert_eq!(stats.scrapes(Outcome::ConnectionError), 0);
    }

    #[test]
    fn test_render() {
        let stats = ExporterMetrics::new();
        stats.observe(
            Outcome::Success,
            &[ModuleKind::Mlag, ModuleKind::PortChannel],
            Duration::from_millis(12),
        );
        stats.observe(
            Outcome::ExecutionError,
            &[ModuleKind::Mlag],
            Duration::from_millis(40),
        );

        let output = stats.render().unwrap();
        assert_eq!(
            sample_value(&output, "arista_exporter_scrapes_total{outcome=\"success\"}"),
            Some(1.0)
        );
        assert_eq!(
            sample_value(&output, "arista_exporter_scrapes_total{outcome=\"execution_error\"}"),
            Some(1.0)
        );
        assert_eq!(
            sample_value(&output, "arista_exporter_module_scrapes_total{module=\"mlag\"}"),
            Some(1.0)
        );
        assert_eq!(
            sample_value(
                &output,
                "arista_exporter_module_scrapes_total{module=\"portchannel\"}"
            ),
            Some(1.0)
        );
        assert_eq!(
            sample_value(&output, "arista_exporter_scrape_duration_seconds_count"),
            Some(2.0)
        );
    }

    #[test]
    fn test_failed_scrape_does_not_count_modules() {
        let stats = ExporterMetrics::new();
        stats.observe(
            Outcome::ConnectionError,
            &[ModuleKind::Power],
            Duration::from_millis(1),
        );

        let output = stats.render().unwrap();
        assert!(!output.contains("arista_exporter_module_scrapes_total{"));
    }
}
