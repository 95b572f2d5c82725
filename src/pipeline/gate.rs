/// 暦日単位の重複実行ゲート。
use std::sync::Mutex;

use chrono::NaiveDate;

#[derive(Debug, Default)]
struct GateState {
    date: Option<NaiveDate>,
    completed: bool,
}

/// サイクルの冗長な再実行を防ぐ、日単位の完了状態。
///
/// 状態はプロセスメモリにのみ保持する。再起動でその日の履歴は失われ、
/// 下流への重複配送が起こり得るが、これは設計上許容された挙動。
#[derive(Debug, Default)]
pub struct DailyGate {
    state: Mutex<GateState>,
}

impl DailyGate {
    /// 今日のサイクルを実行すべきかどうかを判定する。
    ///
    /// 保持している日付が `today` と異なる場合は `{today, 未完了}` へ
    /// リセットして `true` を返す。同日の場合は未完了のときのみ `true`。
    pub(crate) fn should_run(&self, today: NaiveDate) -> bool {
        let mut state = self.state.lock().expect("gate mutex poisoned");
        if state.date != Some(today) {
            state.date = Some(today);
            state.completed = false;
            return true;
        }
        !state.completed
    }

    /// 指定日を完了済みとして記録する。
    ///
    /// 呼び出し元は、空でないバッチ全件の配送成功を確認した後にのみ
    /// 呼び出すこと。0件のサイクルは決してこれを呼ばない。
    pub(crate) fn mark_completed(&self, date: NaiveDate) {
        let mut state = self.state.lock().expect("gate mutex poisoned");
        state.date = Some(date);
        state.completed = true;
    }

    /// 現在の完了フラグのスナップショット。状態は変更しない。
    pub(crate) fn completed(&self) -> bool {
        self.state.lock().expect("gate mutex poisoned").completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    #[test]
    fn first_call_of_a_day_permits_run() {
        let gate = DailyGate::default();
        assert!(gate.should_run(day("2025-03-10")));
    }

    #[test]
    fn stays_open_until_marked_completed() {
        let gate = DailyGate::default();
        let today = day("2025-03-10");

        assert!(gate.should_run(today));
        // 0件や配送失敗のサイクルはmarkしないので、同日中は再試行可能なまま。
        assert!(gate.should_run(today));

        gate.mark_completed(today);
        assert!(!gate.should_run(today));
        assert!(gate.completed());
    }

    #[test]
    fn date_rollover_resets_completion() {
        let gate = DailyGate::default();
        let monday = day("2025-03-10");
        let tuesday = day("2025-03-11");

        assert!(gate.should_run(monday));
        gate.mark_completed(monday);
        assert!(!gate.should_run(monday));

        // 日付が進むと完了状態は破棄され、再び実行可能になる。
        assert!(gate.should_run(tuesday));
        assert!(!gate.completed());
    }
}
