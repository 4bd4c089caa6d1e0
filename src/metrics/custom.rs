// Custom metric registry
//
// Name-keyed counters, gauges and histograms declared by application code.
// Lookups are kind-checked: asking for a gauge named like an existing
// counter is a "gauge not found" failure, not a type confusion.

use std::collections::HashMap;

use parking_lot::RwLock;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

use super::{help_or_name, MetricKind, SeriesOptions};
use crate::error::{PromError, Result};

/// Handle to one registered custom series
#[derive(Clone)]
pub enum CustomMetric {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

impl CustomMetric {
    pub fn kind(&self) -> MetricKind {
        match self {
            CustomMetric::Counter(_) => MetricKind::Counter,
            CustomMetric::Gauge(_) => MetricKind::Gauge,
            CustomMetric::Histogram(_) => MetricKind::Histogram,
        }
    }

    fn collector(&self) -> Box<dyn prometheus::core::Collector> {
        match self {
            CustomMetric::Counter(c) => Box::new(c.clone()),
            CustomMetric::Gauge(g) => Box::new(g.clone()),
            CustomMetric::Histogram(h) => Box::new(h.clone()),
        }
    }
}

/// Custom series of one middleware instance
///
/// Counters, gauges and histograms live in separate name namespaces here;
/// the bound `prometheus::Registry` still enforces unique fully-qualified
/// family names across kinds.
pub struct CustomMetrics {
    registry: Registry,
    options: SeriesOptions,
    series: RwLock<HashMap<(MetricKind, String), CustomMetric>>,
}

impl CustomMetrics {
    pub fn new(registry: Registry, options: SeriesOptions) -> Self {
        Self {
            registry,
            options,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_counter(&self, name: &str, help: &str, labels: &[&str]) -> Result<()> {
        self.add(MetricKind::Counter, name, || {
            let opts = self.opts(name, help);
            Ok(CustomMetric::Counter(CounterVec::new(opts, labels)?))
        })
    }

    pub fn add_gauge(&self, name: &str, help: &str, labels: &[&str]) -> Result<()> {
        self.add(MetricKind::Gauge, name, || {
            let opts = self.opts(name, help);
            Ok(CustomMetric::Gauge(GaugeVec::new(opts, labels)?))
        })
    }

    /// Declare a histogram; `buckets` overrides the instance-wide layout
    pub fn add_histogram(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        buckets: Option<Vec<f64>>,
    ) -> Result<()> {
        self.add(MetricKind::Histogram, name, || {
            let opts = HistogramOpts::from(self.opts(name, help))
                .buckets(self.options.histogram_buckets(buckets)?);
            Ok(CustomMetric::Histogram(HistogramVec::new(opts, labels)?))
        })
    }

    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help_or_name(help, name))
            .namespace(self.options.namespace.as_str())
            .subsystem(self.options.subsystem.as_str())
    }

    fn add<F>(&self, kind: MetricKind, name: &str, build: F) -> Result<()>
    where
        F: FnOnce() -> Result<CustomMetric>,
    {
        let key = (kind, name.to_string());
        let mut series = self.series.write();
        if series.contains_key(&key) {
            return Err(PromError::AlreadyRegistered {
                kind,
                name: name.to_string(),
            });
        }

        let metric = build()?;
        self.registry.register(metric.collector())?;
        series.insert(key, metric);

        tracing::debug!(kind = %kind, name, "Custom metric registered");
        Ok(())
    }

    pub fn get(&self, kind: MetricKind, name: &str) -> Option<CustomMetric> {
        self.series.read().get(&(kind, name.to_string())).cloned()
    }

    fn counter(&self, name: &str) -> Result<CounterVec> {
        match self.get(MetricKind::Counter, name) {
            Some(CustomMetric::Counter(counter)) => Ok(counter),
            _ => {
                tracing::debug!(name, "Custom counter not found");
                Err(PromError::CounterNotFound)
            }
        }
    }

    fn gauge(&self, name: &str) -> Result<GaugeVec> {
        match self.get(MetricKind::Gauge, name) {
            Some(CustomMetric::Gauge(gauge)) => Ok(gauge),
            _ => {
                tracing::debug!(name, "Custom gauge not found");
                Err(PromError::GaugeNotFound)
            }
        }
    }

    fn histogram(&self, name: &str) -> Result<HistogramVec> {
        match self.get(MetricKind::Histogram, name) {
            Some(CustomMetric::Histogram(histogram)) => Ok(histogram),
            _ => {
                tracing::debug!(name, "Custom histogram not found");
                Err(PromError::HistogramNotFound)
            }
        }
    }

    pub fn increment_counter(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.counter(name)?.get_metric_with_label_values(labels)?.inc();
        Ok(())
    }

    pub fn add_counter_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        let counter = self.counter(name)?;
        if value < 0.0 {
            return Err(PromError::NegativeCounterIncrement(value));
        }
        counter.get_metric_with_label_values(labels)?.inc_by(value);
        Ok(())
    }

    pub fn increment_gauge(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.gauge(name)?.get_metric_with_label_values(labels)?.inc();
        Ok(())
    }

    pub fn decrement_gauge(&self, name: &str, labels: &[&str]) -> Result<()> {
        self.gauge(name)?.get_metric_with_label_values(labels)?.dec();
        Ok(())
    }

    pub fn set_gauge(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.gauge(name)?.get_metric_with_label_values(labels)?.set(value);
        Ok(())
    }

    pub fn add_gauge_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.gauge(name)?.get_metric_with_label_values(labels)?.add(value);
        Ok(())
    }

    pub fn sub_gauge_value(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.gauge(name)?.get_metric_with_label_values(labels)?.sub(value);
        Ok(())
    }

    pub fn observe_histogram(&self, name: &str, labels: &[&str], value: f64) -> Result<()> {
        self.histogram(name)?
            .get_metric_with_label_values(labels)?
            .observe(value);
        Ok(())
    }

    /// Remove every custom series from the registry and forget it
    pub fn unregister_all(&self) {
        let mut series = self.series.write();
        for metric in series.values() {
            let _ = self.registry.unregister(metric.collector());
        }
        series.clear();
    }
}
