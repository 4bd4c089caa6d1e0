// Custom metric operations through the public facade

use prometheus::proto::MetricFamily;
use prometheus::Registry;
use routeprom::{PromError, Prometheus};
use rstest::rstest;

fn prometheus() -> (Registry, Prometheus) {
    let registry = Registry::new();
    let prom = Prometheus::builder()
        .registry(registry.clone())
        .build()
        .expect("Failed to build middleware");
    (registry, prom)
}

fn family(registry: &Registry, name: &str) -> MetricFamily {
    registry
        .gather()
        .into_iter()
        .find(|mf| mf.get_name() == name)
        .unwrap_or_else(|| panic!("family {} not found", name))
}

#[test]
fn test_histogram_buckets_and_sum() {
    let (registry, prom) = prometheus();
    prom.add_custom_histogram("latency", "Latency", &["route"], None)
        .unwrap();

    prom.add_custom_histogram_value("latency", &["/a"], 0.45).unwrap();
    prom.add_custom_histogram_value("latency", &["/a"], 9.56).unwrap();

    let mf = family(&registry, "axum_engine_latency");
    let histogram = mf.get_metric()[0].get_histogram();
    assert_eq!(histogram.get_sample_count(), 2);
    assert!((histogram.get_sample_sum() - 10.01).abs() < 1e-9);

    for bucket in histogram.get_bucket() {
        let expected = match bucket.get_upper_bound() {
            b if b < 0.45 => 0,
            b if b < 9.56 => 1,
            _ => 2,
        };
        assert_eq!(
            bucket.get_cumulative_count(),
            expected,
            "bucket le={}",
            bucket.get_upper_bound()
        );
    }
}

#[test]
fn test_histogram_with_explicit_buckets() {
    let (registry, prom) = prometheus();
    prom.add_custom_histogram("payload", "", &[], Some(vec![1.0, 10.0]))
        .unwrap();
    prom.add_custom_histogram_value("payload", &[], 5.0).unwrap();

    let mf = family(&registry, "axum_engine_payload");
    let buckets = mf.get_metric()[0].get_histogram().get_bucket();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].get_cumulative_count(), 0);
    assert_eq!(buckets[1].get_cumulative_count(), 1);
    assert_eq!(mf.get_help(), "payload");
}

#[test]
fn test_counter_operations() {
    let (registry, prom) = prometheus();
    prom.add_custom_counter("jobs", "Jobs", &["status"]).unwrap();

    prom.increment_counter_value("jobs", &["ok"]).unwrap();
    prom.add_counter_value("jobs", &["ok"], 2.5).unwrap();

    let mf = family(&registry, "axum_engine_jobs");
    assert_eq!(mf.get_metric()[0].get_counter().get_value(), 3.5);
}

#[test]
fn test_gauge_add_then_sub_returns_to_zero() {
    let (registry, prom) = prometheus();
    prom.add_custom_gauge("inflight", "In flight", &["queue"]).unwrap();

    prom.add_gauge_value("inflight", &["q"], 10.0).unwrap();
    prom.sub_gauge_value("inflight", &["q"], 10.0).unwrap();
    prom.increment_gauge_value("inflight", &["q"]).unwrap();
    prom.decrement_gauge_value("inflight", &["q"]).unwrap();

    let mf = family(&registry, "axum_engine_inflight");
    assert_eq!(mf.get_metric()[0].get_gauge().get_value(), 0.0);

    prom.set_gauge_value("inflight", &["q"], 7.0).unwrap();
    let mf = family(&registry, "axum_engine_inflight");
    assert_eq!(mf.get_metric()[0].get_gauge().get_value(), 7.0);
}

#[rstest]
#[case::counter("counter")]
#[case::gauge("gauge")]
#[case::histogram("histogram")]
fn test_undeclared_name_leaves_series_unchanged(#[case] kind: &str) {
    let (registry, prom) = prometheus();
    prom.add_custom_counter("existing_counter", "c", &[]).unwrap();
    prom.add_custom_gauge("existing_gauge", "g", &[]).unwrap();
    prom.increment_counter_value("existing_counter", &[]).unwrap();
    prom.set_gauge_value("existing_gauge", &[], 3.0).unwrap();

    let err = match kind {
        "counter" => prom.increment_counter_value("missing", &[]).unwrap_err(),
        "gauge" => prom.set_gauge_value("missing", &[], 1.0).unwrap_err(),
        _ => prom.add_custom_histogram_value("missing", &[], 1.0).unwrap_err(),
    };
    match kind {
        "counter" => assert!(matches!(err, PromError::CounterNotFound)),
        "gauge" => assert!(matches!(err, PromError::GaugeNotFound)),
        _ => assert!(matches!(err, PromError::HistogramNotFound)),
    }

    let counter = family(&registry, "axum_engine_existing_counter");
    assert_eq!(counter.get_metric()[0].get_counter().get_value(), 1.0);
    let gauge = family(&registry, "axum_engine_existing_gauge");
    assert_eq!(gauge.get_metric()[0].get_gauge().get_value(), 3.0);
}

#[test]
fn test_same_name_across_kinds_is_rejected_by_registry() {
    let (_, prom) = prometheus();
    prom.add_custom_counter("shared", "c", &[]).unwrap();
    // Separate lookup namespaces, but one registry family name
    assert!(matches!(
        prom.add_custom_gauge("shared", "g", &[]),
        Err(PromError::Registration(_))
    ));
    assert!(matches!(
        prom.increment_gauge_value("shared", &[]),
        Err(PromError::GaugeNotFound)
    ));
}

#[test]
fn test_duplicate_within_kind_is_rejected() {
    let (_, prom) = prometheus();
    prom.add_custom_counter("jobs", "Jobs", &[]).unwrap();
    assert!(matches!(
        prom.add_custom_counter("jobs", "Jobs", &[]),
        Err(PromError::AlreadyRegistered { .. })
    ));
}
