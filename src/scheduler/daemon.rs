use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use tokio::{task::JoinHandle, time::sleep};
use tracing::info;

use crate::{
    config::Config,
    pipeline::CycleRunner,
    scheduler::{
        cadence::DailyCadence,
        escalation::{EscalationPolicy, TickVerdict},
    },
};

/// 日次プライマリチェックとエスカレーションループを駆動するデーモンを起動する。
pub fn spawn_watch_daemon(runner: Arc<CycleRunner>, config: &Config) -> JoinHandle<()> {
    let tz = config.timezone();
    let cadence = DailyCadence::new(tz, config.primary_hour(), config.primary_minute());
    let policy = EscalationPolicy::new(config.escalation_interval(), config.cutoff_hour());
    WatchDaemon {
        runner,
        cadence,
        policy,
        tz,
    }
    .spawn()
}

struct WatchDaemon {
    runner: Arc<CycleRunner>,
    cadence: DailyCadence,
    policy: EscalationPolicy,
    tz: FixedOffset,
}

impl WatchDaemon {
    fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        loop {
            let now = Utc::now();
            let next = self.cadence.next_run_from(now);
            let wait = duration_until(next, now);
            info!(
                next_run_utc = %next.to_rfc3339(),
                next_run_local = %next.with_timezone(&self.tz).to_rfc3339(),
                wait_seconds = wait.as_secs(),
                "scheduled primary daily check"
            );
            sleep(wait).await;

            let outcome = self.runner.run_cycle().await;
            if outcome.satisfied() {
                info!(
                    count = outcome.count,
                    gate_completed = outcome.gate_completed,
                    "primary check satisfied"
                );
                continue;
            }

            info!(
                interval_seconds = self.policy.interval().as_secs(),
                "primary check found nothing, entering escalation loop"
            );
            self.escalate().await;
        }
    }

    /// 20分間隔の二次リトライループ。充足またはカットオフ時刻の到達で
    /// 自律的に終了し、外部からの停止経路は持たない。
    async fn escalate(&self) {
        let metrics = self.runner.metrics();
        metrics.escalation_active.set(1);

        loop {
            sleep(self.policy.interval()).await;

            let outcome = self.runner.run_cycle().await;
            metrics.escalation_ticks.inc();
            let local_now = Utc::now().with_timezone(&self.tz);

            match self.policy.evaluate_tick(outcome.satisfied(), local_now) {
                TickVerdict::Continue => {
                    info!(count = outcome.count, "escalation tick found nothing, continuing");
                }
                TickVerdict::Stop(reason) => {
                    info!(%reason, count = outcome.count, "escalation loop terminated");
                    break;
                }
            }
        }

        metrics.escalation_active.set(0);
    }
}

fn duration_until(next: chrono::DateTime<Utc>, now: chrono::DateTime<Utc>) -> Duration {
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
