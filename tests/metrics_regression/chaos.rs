//! Chaos metrics regression tests

use super::helpers::*;
use depot_chaos::{FaultConfig, FaultInjector};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn chaos_metrics_exist() {
    init_recorder();

    let faults = FaultInjector::new(
        FaultConfig::builder()
            .name("metrics_chaos")
            .latency_rate(1.0)
            .latency(Duration::from_millis(1), Duration::from_millis(1))
            .build(),
    );
    faults.inject("get").await.unwrap();
    faults.fail_next(1);
    assert!(faults.inject("set").await.is_err());

    assert_counter_exists("depot_chaos_errors_injected_total");
    assert_metric_has_label("depot_chaos_errors_injected_total", "chaos", "metrics_chaos");
    assert_metric_has_label("depot_chaos_errors_injected_total", "operation", "set");

    assert_histogram_exists("depot_chaos_injected_latency_seconds");
    assert_metric_has_label("depot_chaos_injected_latency_seconds", "chaos", "metrics_chaos");
}
