//! Request-scoped metrics collection.
//!
//! Every scrape builds its own [`MetricsCollection`], registers the gauges of
//! the requested modules into it, sets their values and renders it. Nothing
//! in here outlives the request, so concurrent scrapes of different targets
//! cannot observe each other's series.

use std::fmt::Write;
use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge as PromGauge;
use prometheus_client::registry::Registry;
use thiserror::Error;

use crate::mapping::{is_valid_label_name, is_valid_metric_name, sanitize_prefix};

/// A floating point gauge.
pub type Gauge = PromGauge<f64, AtomicU64>;

/// Ordered `(label name, label value)` pairs identifying one child series.
type LabelSet = Vec<(String, LabelText)>;

/// A label value taken verbatim from device output.
///
/// The text encoder writes label values as-is, so backslash, double quote
/// and line feed are escaped here to keep the exposition parseable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LabelText(String);

impl EncodeLabelValue for LabelText {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        let mut rest = self.0.as_str();
        while let Some(at) = rest.find(['\\', '"', '\n']) {
            encoder.write_str(&rest[..at])?;
            match rest.as_bytes()[at] {
                b'\\' => encoder.write_str("\\\\")?,
                b'"' => encoder.write_str("\\\"")?,
                _ => encoder.write_str("\\n")?,
            }
            rest = &rest[at + 1..];
        }
        encoder.write_str(rest)
    }
}

/// Errors raised while declaring or rendering metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Metric {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("Invalid metric name {0:?}")]
    InvalidName(String),

    #[error("Invalid label name {label:?} on metric {metric:?}")]
    InvalidLabel { metric: String, label: String },

    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] std::fmt::Error),
}

/// A gauge with a fixed set of label names.
///
/// The label arity is part of the type, so a child can only be looked up
/// with exactly as many values as there are label names.
#[derive(Debug, Clone)]
pub struct GaugeVec<const N: usize> {
    label_names: [&'static str; N],
    family: Family<LabelSet, Gauge>,
}

impl<const N: usize> GaugeVec<N> {
    /// Child gauge for the given label values, created at 0 if absent.
    pub fn with_label_values(&self, values: [&str; N]) -> Gauge {
        let labels: LabelSet = self
            .label_names
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), LabelText(value.to_string())))
            .collect();

        self.family.get_or_create(&labels).clone()
    }
}

/// An isolated registry for one scrape.
pub struct MetricsCollection {
    registry: Registry,
    names: Vec<String>,
}

impl MetricsCollection {
    /// Create an empty collection whose metric names get `prefix_` in front.
    /// An invalid prefix is sanitized first; nothing is prepended if none of
    /// it survives.
    pub fn new(prefix: &str) -> Self {
        let prefix = if is_valid_metric_name(prefix) {
            prefix.to_string()
        } else {
            sanitize_prefix(prefix)
        };
        let registry = if prefix.is_empty() {
            Registry::default()
        } else {
            Registry::with_prefix(prefix)
        };

        Self {
            registry,
            names: Vec::new(),
        }
    }

    /// Register an unlabeled gauge.
    pub fn gauge(&mut self, name: &str, help: &str) -> Result<Gauge, MetricsError> {
        self.claim(name, &[])?;

        let gauge = Gauge::default();
        self.registry.register(name, help, gauge.clone());
        Ok(gauge)
    }

    /// Register a gauge vector with the given label names.
    pub fn gauge_vec<const N: usize>(
        &mut self,
        name: &str,
        help: &str,
        label_names: [&'static str; N],
    ) -> Result<GaugeVec<N>, MetricsError> {
        self.claim(name, &label_names)?;

        let family = Family::<LabelSet, Gauge>::default();
        self.registry.register(name, help, family.clone());
        Ok(GaugeVec {
            label_names,
            family,
        })
    }

    /// Names registered so far (without prefix), in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Render all metrics in the OpenMetrics text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut output = String::new();
        encode(&mut output, &self.registry)?;
        Ok(output)
    }

    fn claim(&mut self, name: &str, label_names: &[&str]) -> Result<(), MetricsError> {
        if !is_valid_metric_name(name) {
            return Err(MetricsError::InvalidName(name.to_string()));
        }

        if let Some(label) = label_names.iter().find(|l| !is_valid_label_name(l)) {
            return Err(MetricsError::InvalidLabel {
                metric: name.to_string(),
                label: label.to_string(),
            });
        }

        if self.names.iter().any(|n| n == name) {
            return Err(MetricsError::AlreadyRegistered(name.to_string()));
        }

        self.names.push(name.to_string());
        Ok(())
    }
}

/// Content type of [`MetricsCollection::render`] output.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Value of the sample `series` (metric name plus rendered labels) in
/// exposition text, if present.
#[cfg(test)]
pub(crate) fn sample_value(output: &str, series: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let rest = line.strip_prefix(series)?;
        let value = rest.strip_prefix(' ')?;
        value.split_whitespace().next()?.parse().ok()
    })
}
