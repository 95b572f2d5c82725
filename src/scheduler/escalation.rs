/// エスカレーションループの停止判定。
///
/// 壁時計の取得やタイマー待機から分離した純粋な判定ロジックとして
/// 定義し、実時間なしで遷移をテストできるようにする。
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// tickが結果を得たか、ゲートが完了済みになった。
    Satisfied,
    /// 現地時刻がカットオフ時に到達した。
    CutoffReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Satisfied => write!(f, "satisfied"),
            StopReason::CutoffReached => write!(f, "cutoff reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickVerdict {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EscalationPolicy {
    interval: Duration,
    cutoff_hour: u32,
}

impl EscalationPolicy {
    pub(crate) const fn new(interval: Duration, cutoff_hour: u32) -> Self {
        Self {
            interval,
            cutoff_hour,
        }
    }

    pub(crate) const fn interval(&self) -> Duration {
        self.interval
    }

    /// 1tick分の停止判定。条件は順序どおりに評価する:
    /// (1) このtickで充足したか → 停止。
    /// (2) 現地時刻がカットオフ時以降か → tickの結果に関わらず停止。
    /// どちらでもなければループ継続。外部からの停止経路は存在しない。
    pub(crate) fn evaluate_tick(
        &self,
        satisfied: bool,
        local_now: DateTime<FixedOffset>,
    ) -> TickVerdict {
        if satisfied {
            return TickVerdict::Stop(StopReason::Satisfied);
        }
        if local_now.hour() >= self.cutoff_hour {
            return TickVerdict::Stop(StopReason::CutoffReached);
        }
        TickVerdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).expect("valid datetime")
    }

    fn policy() -> EscalationPolicy {
        EscalationPolicy::new(Duration::from_secs(20 * 60), 17)
    }

    #[test]
    fn morning_tick_without_results_continues() {
        let verdict = policy().evaluate_tick(false, local("2025-03-10T08:20:00-03:00"));
        assert_eq!(verdict, TickVerdict::Continue);
    }

    #[test]
    fn satisfied_tick_stops_the_loop() {
        let verdict = policy().evaluate_tick(true, local("2025-03-10T08:20:00-03:00"));
        assert_eq!(verdict, TickVerdict::Stop(StopReason::Satisfied));
    }

    #[test]
    fn cutoff_stops_regardless_of_empty_result() {
        let verdict = policy().evaluate_tick(false, local("2025-03-10T17:05:00-03:00"));
        assert_eq!(verdict, TickVerdict::Stop(StopReason::CutoffReached));
    }

    #[test]
    fn satisfaction_wins_over_cutoff_in_evaluation_order() {
        let verdict = policy().evaluate_tick(true, local("2025-03-10T17:05:00-03:00"));
        assert_eq!(verdict, TickVerdict::Stop(StopReason::Satisfied));
    }

    #[test]
    fn exact_cutoff_hour_stops() {
        let verdict = policy().evaluate_tick(false, local("2025-03-10T17:00:00-03:00"));
        assert_eq!(verdict, TickVerdict::Stop(StopReason::CutoffReached));
    }

    #[test]
    fn one_minute_before_cutoff_continues() {
        let verdict = policy().evaluate_tick(false, local("2025-03-10T16:59:00-03:00"));
        assert_eq!(verdict, TickVerdict::Continue);
    }
}
