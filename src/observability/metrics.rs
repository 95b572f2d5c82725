/// Prometheusメトリクス定義。
use std::sync::Arc;

use prometheus::{
    Histogram, IntCounter, IntGauge, Registry, register_histogram_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry,
};

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub cycles_total: IntCounter,
    pub cycles_skipped_in_flight: IntCounter,
    pub publications_fetched: IntCounter,
    pub publications_relayed: IntCounter,
    pub relay_batch_failures: IntCounter,
    pub escalation_ticks: IntCounter,

    // ヒストグラム
    pub cycle_duration: Histogram,
    pub search_duration: Histogram,
    pub relay_duration: Histogram,

    // ゲージ
    pub escalation_active: IntGauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    ///
    /// # Errors
    /// メトリクスの登録に失敗した場合はエラーを返す。
    pub fn new(registry: &Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            cycles_total: register_int_counter_with_registry!(
                "dje_cycles_total",
                "Total number of fetch-and-relay cycles started",
                registry
            )?,
            cycles_skipped_in_flight: register_int_counter_with_registry!(
                "dje_cycles_skipped_in_flight_total",
                "Cycles rejected because another cycle was already running",
                registry
            )?,
            publications_fetched: register_int_counter_with_registry!(
                "dje_publications_fetched_total",
                "Total number of publications fetched from the search API",
                registry
            )?,
            publications_relayed: register_int_counter_with_registry!(
                "dje_publications_relayed_total",
                "Total number of publications delivered to the webhook",
                registry
            )?,
            relay_batch_failures: register_int_counter_with_registry!(
                "dje_relay_batch_failures_total",
                "Relay batches containing at least one failed delivery",
                registry
            )?,
            escalation_ticks: register_int_counter_with_registry!(
                "dje_escalation_ticks_total",
                "Ticks executed by the escalation retry loop",
                registry
            )?,
            cycle_duration: register_histogram_with_registry!(
                "dje_cycle_duration_seconds",
                "Duration of a full fetch-and-relay cycle",
                registry
            )?,
            search_duration: register_histogram_with_registry!(
                "dje_search_duration_seconds",
                "Duration of the paginated upstream search",
                registry
            )?,
            relay_duration: register_histogram_with_registry!(
                "dje_relay_duration_seconds",
                "Duration of the webhook relay for one batch",
                registry
            )?,
            escalation_active: register_int_gauge_with_registry!(
                "dje_escalation_active",
                "Whether the escalation loop is currently running (0 or 1)",
                registry
            )?,
        })
    }
}
