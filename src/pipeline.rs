/// 取得・配送サイクルの中核。ゲート判定、ページネーション取得、
/// バッチ配送、完了記録を1サイクルとして束ねる。
pub(crate) mod gate;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Instant;

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clients::{search::SearchClient, webhook::WebhookClient},
    config::Config,
    model::Publication,
    observability::metrics::Metrics,
    pipeline::gate::DailyGate,
};

/// 1サイクルの実行結果。手動トリガーのレスポンスにもそのまま使う。
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub count: usize,
    pub publications: Vec<Publication>,
    pub gate_completed: bool,
    pub skipped: bool,
}

impl CycleOutcome {
    fn no_op(gate_completed: bool) -> Self {
        Self {
            count: 0,
            publications: Vec::new(),
            gate_completed,
            skipped: true,
        }
    }

    /// この日についてこれ以上のチェックが不要かどうか。
    #[must_use]
    pub fn satisfied(&self) -> bool {
        self.count > 0 || self.gate_completed
    }
}

/// サイクル実行中の排他フラグを、すべての経路で確実に解除するガード。
struct InFlightReset<'a>(&'a AtomicBool);

impl Drop for InFlightReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct CycleRunner {
    config: Arc<Config>,
    search: SearchClient,
    webhook: WebhookClient,
    gate: DailyGate,
    in_flight: AtomicBool,
    metrics: Arc<Metrics>,
    tz: FixedOffset,
}

impl CycleRunner {
    pub(crate) fn new(
        config: Arc<Config>,
        search: SearchClient,
        webhook: WebhookClient,
        gate: DailyGate,
        metrics: Arc<Metrics>,
    ) -> Self {
        let tz = config.timezone();
        Self {
            config,
            search,
            webhook,
            gate,
            in_flight: AtomicBool::new(false),
            metrics,
            tz,
        }
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn local_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// 1回の取得・配送サイクルを実行する。
    ///
    /// 別のサイクルが実行中の場合は、ゲート状態に触れず空の結果を
    /// 即座に返す（no-op）。それ以外はゲート判定から配送、条件付きの
    /// 完了記録までを一貫して行う。サイクル内のエラーは結果に畳み込まれ、
    /// 呼び出し元のタイマーを停止させることはない。
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.metrics.cycles_skipped_in_flight.inc();
            warn!("cycle already in flight, returning no-op");
            return CycleOutcome::no_op(self.gate.completed());
        }
        let _reset = InFlightReset(&self.in_flight);

        let cycle_id = Uuid::new_v4();
        let today = self.local_today();
        let cycle_started = Instant::now();
        self.metrics.cycles_total.inc();

        if !self.gate.should_run(today) {
            info!(%cycle_id, date = %today, "gate already completed for today, skipping fetch");
            return CycleOutcome {
                count: 0,
                publications: Vec::new(),
                gate_completed: true,
                skipped: false,
            };
        }

        let search_started = Instant::now();
        let (publications, stop) = self
            .search
            .fetch_day(today, self.config.advocate_name())
            .await;
        self.metrics
            .search_duration
            .observe(search_started.elapsed().as_secs_f64());
        self.metrics
            .publications_fetched
            .inc_by(publications.len() as u64);

        if publications.is_empty() {
            info!(%cycle_id, date = %today, stop = ?stop, "no publications found, day stays eligible");
            self.metrics
                .cycle_duration
                .observe(cycle_started.elapsed().as_secs_f64());
            return CycleOutcome {
                count: 0,
                publications: Vec::new(),
                gate_completed: false,
                skipped: false,
            };
        }

        info!(
            %cycle_id,
            date = %today,
            count = publications.len(),
            stop = ?stop,
            "publications found, relaying batch"
        );
        let relay_started = Instant::now();
        let all_delivered = self.webhook.relay_batch(&publications).await;
        self.metrics
            .relay_duration
            .observe(relay_started.elapsed().as_secs_f64());

        if all_delivered {
            self.gate.mark_completed(today);
            self.metrics
                .publications_relayed
                .inc_by(publications.len() as u64);
            info!(%cycle_id, date = %today, "batch fully delivered, gate marked completed");
        } else {
            self.metrics.relay_batch_failures.inc();
            warn!(%cycle_id, date = %today, "batch had delivery failures, day stays eligible");
        }

        self.metrics
            .cycle_duration
            .observe(cycle_started.elapsed().as_secs_f64());
        CycleOutcome {
            count: publications.len(),
            publications,
            gate_completed: all_delivered,
            skipped: false,
        }
    }
}
